//! Output directory tree: one bucket per category plus `FinalReports/`.

use std::fs;
use std::path::{Path, PathBuf};

use coinmail_core::Category;
use log::debug;

pub const FINAL_REPORTS_DIR: &str = "FinalReports";
pub const TRADES_REPORT: &str = "trades.csv";
pub const FUNDING_REPORT: &str = "funding.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Describe the layout under `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bucket(&self, category: Category) -> PathBuf {
        self.root.join(category.bucket_dir())
    }

    pub fn final_reports(&self) -> PathBuf {
        self.root.join(FINAL_REPORTS_DIR)
    }

    pub fn trades_report(&self) -> PathBuf {
        self.final_reports().join(TRADES_REPORT)
    }

    pub fn funding_report(&self) -> PathBuf {
        self.final_reports().join(FUNDING_REPORT)
    }

    /// Converted `.txt` files in a bucket, sorted by path.
    pub fn bucket_files(&self, category: Category) -> std::io::Result<Vec<PathBuf>> {
        let dir = self.bucket(category);
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_txt = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case("txt"));
            if is_txt && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Create the root, every category bucket, and `FinalReports/`.
///
/// Existing directories are left alone, so this can run on every invocation.
pub fn ensure_output_layout(root: impl Into<PathBuf>) -> std::io::Result<OutputLayout> {
    let layout = OutputLayout::new(root);
    fs::create_dir_all(layout.root())?;
    for category in Category::ALL_BUCKETS {
        fs::create_dir_all(layout.bucket(category))?;
    }
    fs::create_dir_all(layout.final_reports())?;
    debug!("output layout ready at {}", layout.root().display());
    Ok(layout)
}
