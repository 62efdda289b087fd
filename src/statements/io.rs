use crate::error::{BodsError, Result, ResultExt as _};
use polars::prelude::*;
use std::path::Path;

/// File extensions tried, in order, when looking a table up by stem.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "parquet", "json"];

/// Loads a statement table, choosing the reader from the file extension.
///
/// # Errors
///
/// Returns an error for unknown extensions or unreadable files.
pub fn load_df(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let df = match ext.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_has_header(true)
            .finish()?
            .collect()
            .with_context(|| format!("Failed to read CSV {}", path.display()))?,
        "parquet" => ParquetReader::new(std::fs::File::open(path)?)
            .finish()
            .with_context(|| format!("Failed to read Parquet {}", path.display()))?,
        "json" => JsonReader::new(std::fs::File::open(path)?)
            .finish()
            .with_context(|| format!("Failed to read JSON {}", path.display()))?,
        _ => {
            return Err(BodsError::InvalidPath(format!(
                "Unsupported file extension '{ext}' for {}",
                path.display()
            )));
        }
    };

    tracing::debug!(
        "Loaded {} ({} rows, {} columns)",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Writes a table as CSV with a header row.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV {}", path.display()))?;
    Ok(())
}
