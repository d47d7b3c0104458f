use std::fs::{self, File};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::info;

use crate::config::EtlConfig;
use crate::credit::CreditCategory;
use crate::error::{EtlError, Result};
use crate::insights::credit_category_counts;
use crate::loader::load_loans;
use crate::transform::{self, ImputationStats, ImputedCounts, TransformReport};
use crate::writer::{write_output, OutputArtifacts};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: CreditCategory,
    pub loans: usize,
}

/// What a completed run did, logged at the end and optionally written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input_path: PathBuf,
    pub input_blake3: String,
    pub input_rows: usize,
    pub output: OutputArtifacts,
    pub output_rows: usize,
    pub output_columns: Vec<String>,
    pub imputation: ImputationStats,
    pub imputed: ImputedCounts,
    pub anomalies_fixed: usize,
    pub non_finite_debt_to_income: usize,
    pub credit_categories: Vec<CategoryCount>,
    pub generated_at: DateTime<Utc>,
}

/// Load, clean, derive and persist one loan file. Holds no state beyond its configuration.
#[derive(Debug, Clone)]
pub struct LoanDataTransformer {
    config: EtlConfig,
}

impl LoanDataTransformer {
    pub fn new(config: EtlConfig) -> Self {
        Self { config }
    }

    pub fn load(&self) -> Result<DataFrame> {
        load_loans(&self.config.input_path, &self.config.load)
    }

    /// Normalize, fix, impute, drop and derive. Does not touch the filesystem.
    pub fn transform(&self, df: &DataFrame) -> Result<(DataFrame, TransformReport)> {
        transform::apply_all(df)
    }

    pub fn run(&self) -> Result<RunSummary> {
        let input_path = &self.config.input_path;
        info!(input = %input_path.display(), output = %self.config.output.output_dir.display(), "Starting loan ETL run");

        let input_blake3 = hash_file(input_path)?;
        let loaded = self.load()?;
        let (transformed, report) = self.transform(&loaded)?;
        let output = write_output(&transformed, &self.config.output)?;

        let credit_categories = credit_category_counts(&transformed)?
            .into_iter()
            .map(|(category, loans)| CategoryCount { category, loans })
            .collect();

        let summary = RunSummary {
            input_path: input_path.clone(),
            input_blake3,
            input_rows: loaded.height(),
            output,
            output_rows: transformed.height(),
            output_columns: transformed
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            imputation: report.stats,
            imputed: report.imputed,
            anomalies_fixed: report.anomalies_fixed,
            non_finite_debt_to_income: report.non_finite_debt_to_income,
            credit_categories,
            generated_at: Utc::now(),
        };

        if let Some(path) = &self.config.summary_path {
            write_summary(&summary, path)?;
        }

        info!(
            rows = summary.output_rows,
            anomalies_fixed = summary.anomalies_fixed,
            non_finite_debt_to_income = summary.non_finite_debt_to_income,
            "Loan ETL run finished"
        );

        Ok(summary)
    }
}

fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|source| EtlError::io(path, source))?;
    let mut hasher = Hasher::new();
    hasher
        .update_reader(file)
        .map_err(|source| EtlError::io(path, source))?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(summary)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EtlError::io(parent, source))?;
    }
    fs::write(path, json).map_err(|source| EtlError::io(path, source))?;
    info!(path = %path.display(), "Wrote run summary");
    Ok(())
}
