use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;

use crate::credit::CreditCategory;
use crate::error::Result;
use crate::schema::{LoanColumn, CREDIT_CATEGORY_COLUMN, DEBT_TO_INCOME_COLUMN};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionRow {
    pub key: Option<String>,
    pub loans: usize,
    pub share: f64,
    pub mean_debt_to_income: Option<f64>,
}

#[derive(Default)]
struct Bucket {
    loans: usize,
    ratio_sum: f64,
    ratio_count: usize,
}

/// Loan counts grouped by a text column of a transformed frame, largest group first.
pub fn loan_distribution(df: &DataFrame, column: LoanColumn) -> Result<Vec<DistributionRow>> {
    let keys = df.column(column.canonical_name())?.str()?;
    let ratios = df.column(DEBT_TO_INCOME_COLUMN)?.f64()?;
    let total = df.height();

    let mut buckets: HashMap<Option<&str>, Bucket> = HashMap::new();
    for (key, ratio) in keys.into_iter().zip(ratios) {
        let bucket = buckets.entry(key).or_default();
        bucket.loans += 1;
        if let Some(ratio) = ratio.filter(|value| value.is_finite()) {
            bucket.ratio_sum += ratio;
            bucket.ratio_count += 1;
        }
    }

    let mut rows: Vec<DistributionRow> = buckets
        .into_iter()
        .map(|(key, bucket)| DistributionRow {
            key: key.map(str::to_string),
            loans: bucket.loans,
            share: bucket.loans as f64 / total.max(1) as f64,
            mean_debt_to_income: (bucket.ratio_count > 0)
                .then(|| bucket.ratio_sum / bucket.ratio_count as f64),
        })
        .collect();

    rows.sort_by(|a, b| b.loans.cmp(&a.loans).then_with(|| a.key.cmp(&b.key)));
    Ok(rows)
}

pub fn distribution_by_purpose(df: &DataFrame) -> Result<Vec<DistributionRow>> {
    loan_distribution(df, LoanColumn::Purpose)
}

pub fn distribution_by_home_ownership(df: &DataFrame) -> Result<Vec<DistributionRow>> {
    loan_distribution(df, LoanColumn::HomeOwnership)
}

/// Count per category in canonical order, including categories with no loans.
pub fn credit_category_counts(df: &DataFrame) -> Result<Vec<(CreditCategory, usize)>> {
    let labels = df.column(CREDIT_CATEGORY_COLUMN)?.str()?;

    let mut counts: HashMap<CreditCategory, usize> = HashMap::new();
    for category in labels.into_iter().flatten().filter_map(CreditCategory::from_label) {
        *counts.entry(category).or_insert(0) += 1;
    }

    Ok(CreditCategory::ALL
        .into_iter()
        .map(|category| (category, counts.get(&category).copied().unwrap_or(0)))
        .collect())
}
