mod common;

use loan_etl_core::loader::{conform_schema, load_loans};
use loan_etl_core::transform::apply_all;
use loan_etl_core::{EtlError, LoadOptions};
use polars::prelude::*;
use tempfile::tempdir;

use common::{assert_close, write_csv, LOANS_CSV};

#[test]
fn load_casts_declared_columns() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "loans.csv", LOANS_CSV);

    let df = load_loans(&path, &LoadOptions::default()).expect("load succeeded");

    assert_eq!(df.height(), 5);
    assert_eq!(df.column("Credit Score").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("Annual Income").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("Bankruptcies").unwrap().dtype(), &DataType::Int64);
    assert_eq!(
        df.column("Months since last delinquent").unwrap().dtype(),
        &DataType::Float64
    );
    assert_eq!(df.column("Term").unwrap().dtype(), &DataType::String);

    let credit = df.column("Credit Score").unwrap().f64().unwrap();
    assert_eq!(credit.get(0), Some(760.0));
    assert!(credit.get(2).is_none());

    let bankruptcies = df.column("Bankruptcies").unwrap().i64().unwrap();
    assert!(bankruptcies.get(0).is_none());
    assert_eq!(bankruptcies.get(1), Some(1));
}

#[test]
fn undeclared_columns_pass_through() {
    let dir = tempdir().unwrap();
    let path = write_csv(dir.path(), "loans.csv", LOANS_CSV);

    let df = load_loans(&path, &LoadOptions::default()).unwrap();
    let ids = df.column("Loan ID").unwrap().str().unwrap();
    assert_eq!(ids.get(4), Some("L5"));
    assert!(df.column("Current Loan Amount").is_ok());
}

#[test]
fn missing_declared_column_fails_at_load() {
    let dir = tempdir().unwrap();
    let csv = "\
Term,Home Ownership,Purpose,Credit Score,Annual Income,Monthly Debt,Bankruptcies,Months since last delinquent
Short Term,Rent,other,700,50000,100,0,
";
    let path = write_csv(dir.path(), "no_tax_liens.csv", csv);

    let err = load_loans(&path, &LoadOptions::default()).unwrap_err();
    match err {
        EtlError::MissingColumn {
            column,
            source_name,
        } => {
            assert_eq!(column, "Tax Liens");
            assert!(source_name.ends_with("no_tax_liens.csv"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_numeric_income_is_a_type_error() {
    let dir = tempdir().unwrap();
    let csv = "\
Term,Home Ownership,Purpose,Credit Score,Annual Income,Monthly Debt,Bankruptcies,Tax Liens,Months since last delinquent
Short Term,Rent,other,700,50000,100,0,0,
Long Term,Rent,other,710,unknown,100,0,0,
";
    let path = write_csv(dir.path(), "bad_income.csv", csv);

    let err = load_loans(&path, &LoadOptions::default()).unwrap_err();
    match err {
        EtlError::ColumnType {
            column,
            expected,
            found,
        } => {
            assert_eq!(column, "Annual Income");
            assert_eq!(expected, DataType::Float64);
            assert_eq!(found, DataType::String);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreadable_input_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("does_not_exist.csv");

    let err = load_loans(&path, &LoadOptions::default()).unwrap_err();
    match err {
        EtlError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn all_empty_numeric_column_conforms() -> PolarsResult<()> {
    let df = df!(
        "Term" => &["Short Term"],
        "Home Ownership" => &["Rent"],
        "Purpose" => &["other"],
        "Credit Score" => &[700i64],
        "Annual Income" => &[50000.0f64],
        "Monthly Debt" => &[100.0f64],
        "Bankruptcies" => &[0i64],
        "Tax Liens" => &[0i64],
        "Months since last delinquent" => &[None::<&str>],
    )?;

    let conformed = conform_schema(&df, "inline").expect("conform succeeded");
    let months = conformed.column("Months since last delinquent")?;
    assert_eq!(months.dtype(), &DataType::Float64);
    assert_eq!(months.null_count(), 1);
    assert_eq!(conformed.column("Credit Score")?.dtype(), &DataType::Float64);

    Ok(())
}

#[test]
fn nan_tokens_in_csv_are_imputed() {
    let dir = tempdir().unwrap();
    let csv = "\
Term,Home Ownership,Purpose,Credit Score,Annual Income,Monthly Debt,Bankruptcies,Tax Liens,Months since last delinquent
Short Term,Rent,other,700,NaN,100,0,0,
Short Term,Rent,other,NaN,50000,100,0,0,
Long Term,Own Home,other,740,60000,100,0,0,
";
    let path = write_csv(dir.path(), "nan_tokens.csv", csv);

    let loaded = load_loans(&path, &LoadOptions::default()).unwrap();
    let (result, report) = apply_all(&loaded).unwrap();

    assert_close(report.stats.credit_score_median, 720.0);
    assert_close(report.stats.annual_income_median, 55_000.0);
    assert_eq!(report.imputed.credit_score, 1);
    assert_eq!(report.imputed.annual_income, 1);

    let credit = result.column("Credit Score").unwrap().f64().unwrap();
    assert_eq!(credit.get(1), Some(720.0));
    let category = result.column("Credit Category").unwrap().str().unwrap();
    assert_eq!(category.get(1), Some("Good"));
    let ratio = result.column("Debt-to-Income Ratio").unwrap().f64().unwrap();
    assert_eq!(ratio.get(0), Some(0.02));
    assert_eq!(report.non_finite_debt_to_income, 0);
}

#[test]
fn fractional_count_is_a_type_error() {
    let dir = tempdir().unwrap();
    let csv = "\
Term,Home Ownership,Purpose,Credit Score,Annual Income,Monthly Debt,Bankruptcies,Tax Liens,Months since last delinquent
Short Term,Rent,other,700,50000,100,1.5,0,
Long Term,Rent,other,710,60000,100,0,0,
";
    let path = write_csv(dir.path(), "fractional_bankruptcies.csv", csv);

    let err = load_loans(&path, &LoadOptions::default()).unwrap_err();
    match err {
        EtlError::ColumnType {
            column,
            expected,
            found,
        } => {
            assert_eq!(column, "Bankruptcies");
            assert_eq!(expected, DataType::Int64);
            assert_eq!(found, DataType::Float64);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn whole_float_counts_conform_to_integers() -> PolarsResult<()> {
    let df = df!(
        "Term" => &["Short Term", "Long Term"],
        "Home Ownership" => &["Rent", "Rent"],
        "Purpose" => &["other", "other"],
        "Credit Score" => &[700.0f64, 710.0],
        "Annual Income" => &[50000.0f64, 60000.0],
        "Monthly Debt" => &[100.0f64, 100.0],
        "Bankruptcies" => &[Some(1.0f64), None],
        "Tax Liens" => &[0.0f64, 2.0],
        "Months since last delinquent" => &[None::<f64>, None],
    )?;

    let conformed = conform_schema(&df, "inline").expect("conform succeeded");
    let bankruptcies = conformed.column("Bankruptcies")?.i64()?;
    assert_eq!(bankruptcies.get(0), Some(1));
    assert!(bankruptcies.get(1).is_none());
    let tax_liens = conformed.column("Tax Liens")?.i64()?;
    assert_eq!(tax_liens.get(1), Some(2));

    Ok(())
}
