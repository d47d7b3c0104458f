#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const LOANS_CSV: &str = "\
Loan ID,Term,Home Ownership,Purpose,Credit Score,Annual Income,Monthly Debt,Bankruptcies,Tax Liens,Months since last delinquent,Current Loan Amount
L1,Short Term,HaveMortgage,debt_consolidation,760,60000,500,,,12,10000
L2,Long Term,Rent,Home Improvements,701,50000,1000,1,0,,25000
L3,Short Term,Own Home,other,,40000,300,0,,5,5000
L4,long term,Home Mortgage,Business Loan,640,,800,0,1,,12000
L5,Short Term,Rent,Debt Consolidation,590,0,200,0,0,,8000
";

pub fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture csv");
    path
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
