use polars::prelude::*;

use crate::credit::CreditCategory;
use crate::error::Result;

pub const DEBT_TO_INCOME_COLUMN: &str = "Debt-to-Income Ratio";
pub const CREDIT_CATEGORY_COLUMN: &str = "Credit Category";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Float,
    Count,
}

impl ColumnKind {
    pub fn dtype(&self) -> DataType {
        match self {
            ColumnKind::Text => DataType::String,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Count => DataType::Int64,
        }
    }
}

/// Columns the loader requires in every input file. Anything else passes through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoanColumn {
    Term,
    HomeOwnership,
    Purpose,
    CreditScore,
    AnnualIncome,
    MonthlyDebt,
    Bankruptcies,
    TaxLiens,
    MonthsSinceLastDelinquent,
}

impl LoanColumn {
    pub const ALL: [LoanColumn; 9] = [
        LoanColumn::Term,
        LoanColumn::HomeOwnership,
        LoanColumn::Purpose,
        LoanColumn::CreditScore,
        LoanColumn::AnnualIncome,
        LoanColumn::MonthlyDebt,
        LoanColumn::Bankruptcies,
        LoanColumn::TaxLiens,
        LoanColumn::MonthsSinceLastDelinquent,
    ];

    pub const LOWERCASED: [LoanColumn; 3] =
        [LoanColumn::Term, LoanColumn::HomeOwnership, LoanColumn::Purpose];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            LoanColumn::Term => "Term",
            LoanColumn::HomeOwnership => "Home Ownership",
            LoanColumn::Purpose => "Purpose",
            LoanColumn::CreditScore => "Credit Score",
            LoanColumn::AnnualIncome => "Annual Income",
            LoanColumn::MonthlyDebt => "Monthly Debt",
            LoanColumn::Bankruptcies => "Bankruptcies",
            LoanColumn::TaxLiens => "Tax Liens",
            LoanColumn::MonthsSinceLastDelinquent => "Months since last delinquent",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            LoanColumn::Term | LoanColumn::HomeOwnership | LoanColumn::Purpose => ColumnKind::Text,
            LoanColumn::CreditScore
            | LoanColumn::AnnualIncome
            | LoanColumn::MonthlyDebt
            | LoanColumn::MonthsSinceLastDelinquent => ColumnKind::Float,
            LoanColumn::Bankruptcies | LoanColumn::TaxLiens => ColumnKind::Count,
        }
    }
}

/// Typed view of one transformed row.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRecord {
    pub term: Option<String>,
    pub home_ownership: Option<String>,
    pub purpose: Option<String>,
    pub credit_score: Option<f64>,
    pub annual_income: Option<f64>,
    pub monthly_debt: Option<f64>,
    pub bankruptcies: Option<i64>,
    pub tax_liens: Option<i64>,
    pub debt_to_income: Option<f64>,
    pub credit_category: Option<CreditCategory>,
}

impl LoanRecord {
    /// Materialises typed rows from a frame that has been through the transform steps.
    pub fn collect(df: &DataFrame) -> Result<Vec<LoanRecord>> {
        let len = df.height();

        let term = df.column(LoanColumn::Term.canonical_name())?.str()?;
        let home = df.column(LoanColumn::HomeOwnership.canonical_name())?.str()?;
        let purpose = df.column(LoanColumn::Purpose.canonical_name())?.str()?;
        let credit_score = df.column(LoanColumn::CreditScore.canonical_name())?.f64()?;
        let annual_income = df.column(LoanColumn::AnnualIncome.canonical_name())?.f64()?;
        let monthly_debt = df.column(LoanColumn::MonthlyDebt.canonical_name())?.f64()?;
        let bankruptcies = df.column(LoanColumn::Bankruptcies.canonical_name())?.i64()?;
        let tax_liens = df.column(LoanColumn::TaxLiens.canonical_name())?.i64()?;
        let ratio = df.column(DEBT_TO_INCOME_COLUMN)?.f64()?;
        let category = df.column(CREDIT_CATEGORY_COLUMN)?.str()?;

        let mut records = Vec::with_capacity(len);
        for idx in 0..len {
            records.push(LoanRecord {
                term: term.get(idx).map(str::to_string),
                home_ownership: home.get(idx).map(str::to_string),
                purpose: purpose.get(idx).map(str::to_string),
                credit_score: credit_score.get(idx),
                annual_income: annual_income.get(idx),
                monthly_debt: monthly_debt.get(idx),
                bankruptcies: bankruptcies.get(idx),
                tax_liens: tax_liens.get(idx),
                debt_to_income: ratio.get(idx),
                credit_category: category.get(idx).and_then(CreditCategory::from_label),
            });
        }

        Ok(records)
    }
}
