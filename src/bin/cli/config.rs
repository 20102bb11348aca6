use leakpath::FinderOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let required = explicit.is_some();
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            Some(config_path) if required => {
                return Err(ConfigError::Missing {
                    path: config_path.clone(),
                })
            }
            _ => RawConfig::default(),
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Library options seeded from the file; unset keys keep library defaults.
    pub fn finder_options(&self) -> FinderOptions {
        let mut opts = FinderOptions::default();
        if let Some(subtest) = &self.data.report.subtest {
            opts = opts.subtest(subtest.clone());
        }
        if let Some(clean) = self.data.report.clean_names {
            opts = opts.clean_names(clean);
        }
        if let Some(strict) = self.data.trace.strict {
            opts = opts.strict_trace(strict);
        }
        if let Some(lines) = self.data.trace.batch_lines {
            opts = opts.batch_lines(lines);
        }
        opts
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    report: ReportSection,
    #[serde(default)]
    trace: TraceSection,
}

#[derive(Debug, Default, Deserialize)]
struct ReportSection {
    subtest: Option<String>,
    clean_names: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct TraceSection {
    strict: Option<bool>,
    batch_lines: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("CLI config {path} does not exist")]
    Missing { path: PathBuf },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("leakpath").join("cli.toml"))
}
