use polars::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::credit::CreditCategory;
use crate::error::{EtlError, Result};
use crate::schema::{LoanColumn, CREDIT_CATEGORY_COLUMN, DEBT_TO_INCOME_COLUMN};

pub const HOME_OWNERSHIP_ANOMALY: &str = "havemortgage";
pub const HOME_OWNERSHIP_REPLACEMENT: &str = "home mortgage";

const MONTHS_PER_YEAR: f64 = 12.0;
const RATIO_DECIMALS: usize = 2;

/// Dataset-wide aggregates captured before any value is filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImputationStats {
    pub credit_score_median: f64,
    pub annual_income_median: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImputedCounts {
    pub credit_score: usize,
    pub annual_income: usize,
    pub bankruptcies: usize,
    pub tax_liens: usize,
}

pub fn normalize_text_case(df: &DataFrame) -> Result<DataFrame> {
    let mut output = df.clone();

    for column in LoanColumn::LOWERCASED {
        let name = column.canonical_name();
        let values = output.column(name)?.str()?;
        let lowered: Vec<Option<String>> = values
            .into_iter()
            .map(|value| value.map(str::to_lowercase))
            .collect();
        output.with_column(Series::new(name.into(), lowered))?;
    }

    Ok(output)
}

/// Rewrites the exact value `havemortgage` to `home mortgage`. Returns the frame and the
/// number of rewritten rows.
pub fn fix_home_ownership(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let name = LoanColumn::HomeOwnership.canonical_name();
    let values = df.column(name)?.str()?;

    let mut fixed = 0usize;
    let rewritten: Vec<Option<&str>> = values
        .into_iter()
        .map(|value| match value {
            Some(HOME_OWNERSHIP_ANOMALY) => {
                fixed += 1;
                Some(HOME_OWNERSHIP_REPLACEMENT)
            }
            other => other,
        })
        .collect();

    let mut output = df.clone();
    output.with_column(Series::new(name.into(), rewritten))?;

    Ok((output, fixed))
}

/// Medians of Credit Score and Annual Income over observed values only.
pub fn compute_imputation_stats(df: &DataFrame) -> Result<ImputationStats> {
    Ok(ImputationStats {
        credit_score_median: column_median(df, LoanColumn::CreditScore)?,
        annual_income_median: column_median(df, LoanColumn::AnnualIncome)?,
    })
}

/// NaN counts as missing: it is left out of the median and filled like a null.
fn column_median(df: &DataFrame, column: LoanColumn) -> Result<f64> {
    let name = column.canonical_name();
    let observed: Float64Chunked = df
        .column(name)?
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect();
    observed
        .median()
        .ok_or(EtlError::NoObservedValues { column: name })
}

/// Fills the four imputed columns. `stats` must come from the frame before any fill.
pub fn impute_missing(df: &DataFrame, stats: &ImputationStats) -> Result<(DataFrame, ImputedCounts)> {
    let credit_name = LoanColumn::CreditScore.canonical_name();
    let income_name = LoanColumn::AnnualIncome.canonical_name();
    let bankruptcies_name = LoanColumn::Bankruptcies.canonical_name();
    let tax_liens_name = LoanColumn::TaxLiens.canonical_name();

    let (credit_score, credit_filled) =
        fill_float(df.column(credit_name)?.f64()?, stats.credit_score_median);
    let (annual_income, income_filled) =
        fill_float(df.column(income_name)?.f64()?, stats.annual_income_median);
    let (bankruptcies, bankruptcies_filled) = fill_count(df.column(bankruptcies_name)?.i64()?, 0);
    let (tax_liens, tax_liens_filled) = fill_count(df.column(tax_liens_name)?.i64()?, 0);

    let mut output = df.clone();
    output.with_column(Series::new(credit_name.into(), credit_score))?;
    output.with_column(Series::new(income_name.into(), annual_income))?;
    output.with_column(Series::new(bankruptcies_name.into(), bankruptcies))?;
    output.with_column(Series::new(tax_liens_name.into(), tax_liens))?;

    Ok((
        output,
        ImputedCounts {
            credit_score: credit_filled,
            annual_income: income_filled,
            bankruptcies: bankruptcies_filled,
            tax_liens: tax_liens_filled,
        },
    ))
}

fn fill_float(values: &Float64Chunked, fill: f64) -> (Vec<f64>, usize) {
    let mut filled = 0usize;
    let out = values
        .into_iter()
        .map(|value| match value {
            Some(v) if !v.is_nan() => v,
            _ => {
                filled += 1;
                fill
            }
        })
        .collect();
    (out, filled)
}

fn fill_count(values: &Int64Chunked, fill: i64) -> (Vec<i64>, usize) {
    let filled = values.null_count();
    let out = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
    (out, filled)
}

pub fn drop_delinquency_column(df: &DataFrame) -> Result<DataFrame> {
    Ok(df.drop(LoanColumn::MonthsSinceLastDelinquent.canonical_name())?)
}

/// Appends `Debt-to-Income Ratio`. A zero Annual Income is not guarded: the ratio becomes
/// `inf` (or `NaN` for 0/0) and is returned as-is. Also returns the count of non-finite ratios.
pub fn derive_debt_to_income(df: &DataFrame) -> Result<(DataFrame, usize)> {
    let debt = df.column(LoanColumn::MonthlyDebt.canonical_name())?.f64()?;
    let income = df.column(LoanColumn::AnnualIncome.canonical_name())?.f64()?;

    let mut non_finite = 0usize;
    let ratios: Vec<Option<f64>> = debt
        .into_iter()
        .zip(income)
        .map(|(debt, income)| {
            let ratio = debt_to_income(debt?, income?);
            if !ratio.is_finite() {
                non_finite += 1;
            }
            Some(ratio)
        })
        .collect();

    let mut output = df.clone();
    output.with_column(Series::new(DEBT_TO_INCOME_COLUMN.into(), ratios))?;

    Ok((output, non_finite))
}

pub fn debt_to_income(monthly_debt: f64, annual_income: f64) -> f64 {
    round_to(monthly_debt * MONTHS_PER_YEAR / annual_income, RATIO_DECIMALS)
}

/// Half away from zero on the shortest decimal form of `value`, so 1.005 becomes 1.01 even
/// though its binary value sits just below the midpoint. Non-finite values pass through.
fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let digits = value.abs().to_string();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
    if fraction.len() <= decimals {
        return value;
    }

    let Ok(mut scaled) = format!("{whole}{}", &fraction[..decimals]).parse::<f64>() else {
        return value;
    };
    if fraction.as_bytes()[decimals] >= b'5' {
        scaled += 1.0;
    }

    (scaled / 10f64.powi(decimals as i32)).copysign(value)
}

pub fn derive_credit_category(df: &DataFrame) -> Result<DataFrame> {
    let scores = df.column(LoanColumn::CreditScore.canonical_name())?.f64()?;

    let categories: Vec<&str> = scores
        .into_iter()
        .map(|score| CreditCategory::from_score(score).label())
        .collect();

    let mut output = df.clone();
    output.with_column(Series::new(CREDIT_CATEGORY_COLUMN.into(), categories))?;

    Ok(output)
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformReport {
    pub stats: ImputationStats,
    pub imputed: ImputedCounts,
    pub anomalies_fixed: usize,
    pub non_finite_debt_to_income: usize,
}

/// Steps 2 through 7 of the run, in order. The input frame must already be conformed.
pub fn apply_all(df: &DataFrame) -> Result<(DataFrame, TransformReport)> {
    let normalized = normalize_text_case(df)?;

    let (fixed, anomalies_fixed) = fix_home_ownership(&normalized)?;
    if anomalies_fixed > 0 {
        info!(rows = anomalies_fixed, "Rewrote home ownership anomaly");
    }

    let stats = compute_imputation_stats(&fixed)?;
    let (imputed, imputed_counts) = impute_missing(&fixed, &stats)?;
    info!(
        credit_score_median = stats.credit_score_median,
        annual_income_median = stats.annual_income_median,
        credit_score_filled = imputed_counts.credit_score,
        annual_income_filled = imputed_counts.annual_income,
        bankruptcies_filled = imputed_counts.bankruptcies,
        tax_liens_filled = imputed_counts.tax_liens,
        "Imputed missing values"
    );

    let trimmed = drop_delinquency_column(&imputed)?;

    let (with_ratio, non_finite) = derive_debt_to_income(&trimmed)?;
    if non_finite > 0 {
        warn!(
            rows = non_finite,
            "Debt-to-income ratio is not finite (zero annual income)"
        );
    }

    let categorized = derive_credit_category(&with_ratio)?;

    Ok((
        categorized,
        TransformReport {
            stats,
            imputed: imputed_counts,
            anomalies_fixed,
            non_finite_debt_to_income: non_finite,
        },
    ))
}
