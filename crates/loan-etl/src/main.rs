use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use loan_etl_core::insights::{self, DistributionRow};
use loan_etl_core::loader::load_loans;
use loan_etl_core::{
    transform, ConfigFile, ConfigOverrides, EtlConfig, LoanDataTransformer, LoanRecord,
    OutputCompression,
};
use polars::prelude::DataFrame;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Loan data cleaning and enrichment ETL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the input CSV and write the enriched parquet output
    Run(RunArgs),
    /// Print loan distribution by purpose, home ownership and credit category
    Insights(InputArgs),
    /// Print the first transformed rows without writing anything
    Preview(PreviewArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Optional TOML configuration file
    #[arg(long, env = "LOAN_ETL_CONFIG")]
    config: Option<PathBuf>,
    /// Input CSV with a header row
    #[arg(long, env = "LOAN_ETL_INPUT")]
    input: Option<PathBuf>,
    /// Rows sampled for type inference (default: whole file)
    #[arg(long)]
    infer_schema_length: Option<usize>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Output directory, replaced in full on every run
    #[arg(long, env = "LOAN_ETL_OUTPUT")]
    output: Option<PathBuf>,
    /// Write the run summary as JSON to this path
    #[arg(long, env = "LOAN_ETL_SUMMARY")]
    summary: Option<PathBuf>,
    /// Parquet compression: zstd, snappy or uncompressed
    #[arg(long)]
    compression: Option<OutputCompression>,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Number of rows to print
    #[arg(long, default_value_t = 10)]
    rows: usize,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Insights(args) => handle_insights(args),
        Command::Preview(args) => handle_preview(args),
    }
}

fn handle_run(args: RunArgs) -> Result<()> {
    let file = read_config_file(&args.input)?;
    let overrides = ConfigOverrides {
        input_path: args.input.input,
        output_dir: args.output,
        summary_path: args.summary,
        infer_schema_length: args.input.infer_schema_length,
        compression: args.compression,
    };
    let config = EtlConfig::resolve(file, overrides).context("invalid configuration")?;

    let transformer = LoanDataTransformer::new(config);
    let summary = transformer.run().context("loan ETL run failed")?;

    info!(
        output = %summary.output.parquet_path.display(),
        rows = summary.output_rows,
        "Output written"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn handle_insights(args: InputArgs) -> Result<()> {
    let transformed = load_and_transform(args)?;

    let by_purpose = insights::distribution_by_purpose(&transformed)?;
    println!("Loans by purpose");
    println!("{}", distribution_table("Purpose", &by_purpose));

    let by_home = insights::distribution_by_home_ownership(&transformed)?;
    println!("Loans by home ownership");
    println!("{}", distribution_table("Home Ownership", &by_home));

    let categories = insights::credit_category_counts(&transformed)?;
    let mut table = Table::new();
    table.set_header(vec!["Credit Category", "Loans"]);
    for (category, loans) in categories {
        table.add_row(vec![category.label().to_string(), loans.to_string()]);
    }
    println!("Loans by credit category");
    println!("{table}");

    Ok(())
}

fn handle_preview(args: PreviewArgs) -> Result<()> {
    let transformed = load_and_transform(args.input)?;
    let records = LoanRecord::collect(&transformed.head(Some(args.rows)))?;

    let mut table = Table::new();
    table.set_header(vec![
        "Term",
        "Home Ownership",
        "Purpose",
        "Credit Score",
        "Annual Income",
        "Monthly Debt",
        "Bankruptcies",
        "Tax Liens",
        "Debt-to-Income Ratio",
        "Credit Category",
    ]);
    for record in records {
        table.add_row(vec![
            display(record.term),
            display(record.home_ownership),
            display(record.purpose),
            display(record.credit_score),
            display(record.annual_income),
            display(record.monthly_debt),
            display(record.bankruptcies),
            display(record.tax_liens),
            display(record.debt_to_income),
            display(record.credit_category.map(|category| category.label())),
        ]);
    }
    println!("{table}");

    Ok(())
}

fn load_and_transform(args: InputArgs) -> Result<DataFrame> {
    let file = read_config_file(&args)?;
    let overrides = ConfigOverrides {
        input_path: args.input,
        infer_schema_length: args.infer_schema_length,
        ..Default::default()
    };
    let (input_path, load) =
        EtlConfig::resolve_input(file, overrides).context("invalid configuration")?;

    let loaded = load_loans(&input_path, &load)
        .with_context(|| format!("failed to load {}", input_path.display()))?;
    let (transformed, _) = transform::apply_all(&loaded).context("transform failed")?;
    Ok(transformed)
}

fn read_config_file(args: &InputArgs) -> Result<ConfigFile> {
    match &args.config {
        Some(path) => ConfigFile::from_toml_file(path)
            .with_context(|| format!("failed to read config {}", path.display())),
        None => Ok(ConfigFile::default()),
    }
}

fn distribution_table(label: &str, rows: &[DistributionRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![label, "Loans", "Share", "Mean Debt-to-Income"]);
    for row in rows {
        table.add_row(vec![
            row.key.clone().unwrap_or_else(|| "(missing)".to_string()),
            row.loans.to_string(),
            format!("{:.1}%", row.share * 100.0),
            row.mean_debt_to_income
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table
}

fn display<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
