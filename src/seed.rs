use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::db::operations::insert_seed_word;
use crate::db::DatabaseProxy;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read word list {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Reads `text,translation` pairs from a headerless CSV file. Records with
/// fewer than two fields are counted as skipped.
pub fn read_word_list(path: &Path) -> Result<(Vec<(String, String)>, usize), SeedError> {
    let to_err = |source| SeedError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(to_err)?;

    let mut pairs = Vec::new();
    let mut skipped = 0;
    for record in reader.records() {
        let record = record.map_err(to_err)?;
        match (record.get(0), record.get(1)) {
            (Some(text), Some(translation))
                if !text.trim().is_empty() && !translation.trim().is_empty() =>
            {
                pairs.push((text.trim().to_string(), translation.trim().to_string()));
            }
            _ => skipped += 1,
        }
    }

    Ok((pairs, skipped))
}

pub async fn seed_word_lists(
    proxy: &DatabaseProxy,
    paths: &[PathBuf],
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for path in paths {
        let (pairs, skipped) = read_word_list(path)?;
        report.skipped += skipped;

        for (text, translation) in pairs {
            match insert_seed_word(proxy, &text, &translation).await {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.skipped += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(error = %err, text = %text, "failed to insert seed word");
                }
            }
        }

        tracing::info!(path = %path.display(), "word list loaded");
    }

    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped,
        failed = report.failed,
        "catalog seeding finished"
    );

    Ok(report)
}
