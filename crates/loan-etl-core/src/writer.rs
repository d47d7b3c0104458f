use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::io::parquet::write::{ParquetWriter, StatisticsOptions};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::OutputOptions;
use crate::error::{EtlError, Result};

pub const PART_FILE_NAME: &str = "part-00000.parquet";
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Locations written by [`write_output`].
#[derive(Debug, Clone, Serialize)]
pub struct OutputArtifacts {
    pub output_dir: PathBuf,
    pub parquet_path: PathBuf,
    pub success_marker: PathBuf,
    pub bytes_written: u64,
}

/// Replaces whatever is at `options.output_dir` with a fresh Parquet part file and a
/// `_SUCCESS` marker. Not atomic: a failure after the old directory is removed leaves a
/// directory without the marker.
pub fn write_output(df: &DataFrame, options: &OutputOptions) -> Result<OutputArtifacts> {
    let output_dir = options.output_dir.as_path();
    clear_output_location(output_dir)?;
    fs::create_dir_all(output_dir).map_err(|source| EtlError::io(output_dir, source))?;

    let parquet_path = output_dir.join(PART_FILE_NAME);
    let mut file =
        File::create(&parquet_path).map_err(|source| EtlError::io(&parquet_path, source))?;

    let mut clone = df.clone();
    let bytes_written = ParquetWriter::new(&mut file)
        .with_compression(options.compression.parquet())
        .with_statistics(StatisticsOptions::default())
        .finish(&mut clone)?;
    file.sync_all()
        .map_err(|source| EtlError::io(&parquet_path, source))?;

    let success_marker = output_dir.join(SUCCESS_MARKER);
    File::create(&success_marker).map_err(|source| EtlError::io(&success_marker, source))?;

    info!(
        path = %parquet_path.display(),
        rows = df.height(),
        bytes = bytes_written,
        "Wrote parquet output"
    );

    Ok(OutputArtifacts {
        output_dir: output_dir.to_path_buf(),
        parquet_path,
        success_marker,
        bytes_written,
    })
}

fn clear_output_location(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(EtlError::io(path, source)),
    };

    debug!(path = %path.display(), "Removing previous output");
    if metadata.is_dir() {
        fs::remove_dir_all(path).map_err(|source| EtlError::io(path, source))
    } else {
        fs::remove_file(path).map_err(|source| EtlError::io(path, source))
    }
}
