use std::fs;
use std::path::{Path, PathBuf};

use polars::io::parquet::write::ParquetCompression;
use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCompression {
    #[default]
    Zstd,
    Snappy,
    Uncompressed,
}

impl OutputCompression {
    pub fn parquet(&self) -> ParquetCompression {
        match self {
            OutputCompression::Zstd => ParquetCompression::Zstd(None),
            OutputCompression::Snappy => ParquetCompression::Snappy,
            OutputCompression::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl std::str::FromStr for OutputCompression {
    type Err = EtlError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "zstd" => Ok(OutputCompression::Zstd),
            "snappy" => Ok(OutputCompression::Snappy),
            "uncompressed" | "none" => Ok(OutputCompression::Uncompressed),
            other => Err(EtlError::Config(format!(
                "unknown compression '{other}' (expected zstd, snappy or uncompressed)"
            ))),
        }
    }
}

/// Settings as they appear in an optional TOML file. Every key may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub input_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub infer_schema_length: Option<usize>,
    pub compression: Option<OutputCompression>,
}

impl ConfigFile {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| EtlError::io(path, source))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Values supplied on the command line or through the environment. These win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub infer_schema_length: Option<usize>,
    pub compression: Option<OutputCompression>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Rows sampled for type inference; `None` scans the whole file.
    pub infer_schema_length: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub output_dir: PathBuf,
    pub compression: OutputCompression,
}

#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub input_path: PathBuf,
    pub load: LoadOptions,
    pub output: OutputOptions,
    pub summary_path: Option<PathBuf>,
}

impl EtlConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            load: LoadOptions::default(),
            output: OutputOptions {
                output_dir: output_dir.into(),
                compression: OutputCompression::default(),
            },
            summary_path: None,
        }
    }

    /// Layers overrides on top of the file, then falls back to built-in defaults.
    pub fn resolve(file: ConfigFile, overrides: ConfigOverrides) -> Result<Self> {
        let input_path = overrides
            .input_path
            .or(file.input_path)
            .ok_or_else(|| EtlError::Config("input path not set (use --input)".to_string()))?;
        let output_dir = overrides
            .output_dir
            .or(file.output_dir)
            .ok_or_else(|| EtlError::Config("output directory not set (use --output)".to_string()))?;

        Ok(Self {
            input_path,
            load: LoadOptions {
                infer_schema_length: overrides.infer_schema_length.or(file.infer_schema_length),
            },
            output: OutputOptions {
                output_dir,
                compression: overrides
                    .compression
                    .or(file.compression)
                    .unwrap_or_default(),
            },
            summary_path: overrides.summary_path.or(file.summary_path),
        })
    }

    /// Resolution for commands that only read the input.
    pub fn resolve_input(file: ConfigFile, overrides: ConfigOverrides) -> Result<(PathBuf, LoadOptions)> {
        let input_path = overrides
            .input_path
            .or(file.input_path)
            .ok_or_else(|| EtlError::Config("input path not set (use --input)".to_string()))?;
        let load = LoadOptions {
            infer_schema_length: overrides.infer_schema_length.or(file.infer_schema_length),
        };
        Ok((input_path, load))
    }
}
