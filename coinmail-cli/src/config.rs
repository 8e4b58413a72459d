use anyhow::{Context, Result};
use coinmail_core::ExtractionRows;
use coinmail_report::RunConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "coinmail.toml";
pub const DEFAULT_DATA_DIR: &str = "Data";

/// Optional `coinmail.toml`. Every key may be omitted.
///
/// ```toml
/// source_dir = "Data"
/// output_dir = "Data"
/// extension = "eml"
///
/// [rows]
/// trade = 5
/// funding = 4
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub rows: RowsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RowsSection {
    pub trade: Option<usize>,
    pub funding: Option<usize>,
}

/// Values given on the command line; these win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub trade_row: Option<usize>,
    pub funding_row: Option<usize>,
}

pub fn parse_config(s: &str) -> Result<FileConfig> {
    toml::from_str(s).context("parse coinmail.toml")
}

/// Load `explicit` if given (it must exist), else `./coinmail.toml` if present.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !p.exists() {
                return Ok(FileConfig::default());
            }
            p
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    parse_config(&s).with_context(|| format!("in {}", path.display()))
}

impl FileConfig {
    pub fn resolve(&self, cli: Overrides) -> RunConfig {
        let defaults = ExtractionRows::default();
        let source = cli
            .source_dir
            .or_else(|| self.source_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let output = cli
            .output_dir
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let mut config = RunConfig::new(source, output);
        if let Some(ext) = cli.extension.or_else(|| self.extension.clone()) {
            config.extension = ext;
        }
        config.rows = ExtractionRows {
            trade: cli.trade_row.or(self.rows.trade).unwrap_or(defaults.trade),
            funding: cli.funding_row.or(self.rows.funding).unwrap_or(defaults.funding),
        };
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file_or_flags() {
        let cfg = FileConfig::default().resolve(Overrides::default());
        assert_eq!(cfg.source_dir, PathBuf::from("Data"));
        assert_eq!(cfg.output_dir, PathBuf::from("Data"));
        assert_eq!(cfg.extension, "eml");
        assert_eq!(cfg.rows, ExtractionRows::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = parse_config(
            r#"
source_dir = "exports"
extension = "EML"

[rows]
trade = 7
"#,
        )
        .unwrap();

        let cfg = file.resolve(Overrides {
            source_dir: Some(PathBuf::from("elsewhere")),
            funding_row: Some(3),
            ..Overrides::default()
        });
        assert_eq!(cfg.source_dir, PathBuf::from("elsewhere"));
        assert_eq!(cfg.extension, "EML");
        assert_eq!(cfg.rows.trade, 7);
        assert_eq!(cfg.rows.funding, 3);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(parse_config("sorce_dir = \"x\"").is_err());
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());

        let p = dir.path().join("c.toml");
        fs::write(&p, "output_dir = \"out\"\n").unwrap();
        let cfg = load_config(Some(&p)).unwrap();
        assert_eq!(cfg.output_dir, Some(PathBuf::from("out")));
    }
}
