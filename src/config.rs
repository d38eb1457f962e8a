use crate::TeslalogError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_NUMLINES: usize = 10;

#[derive(Debug, Deserialize, Default)]
pub struct TeslalogConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub follow: FollowConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SplitConfig {
    pub outdir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FollowConfig {
    pub numlines: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Load config from an explicit path, TESLALOG_CONFIG, ~/.teslalog/config.toml, or defaults.
/// An explicit path must exist; the implicit locations are optional.
pub fn load_config(explicit: Option<&Path>) -> Result<TeslalogConfig, TeslalogError> {
    if let Some(p) = explicit {
        if !p.exists() {
            return Err(TeslalogError::Config(format!("{}: not found", p.display())));
        }
        return read_config(p);
    }
    match config_path() {
        Some(p) if p.exists() => read_config(&p),
        _ => Ok(TeslalogConfig::default()),
    }
}

fn read_config(path: &Path) -> Result<TeslalogConfig, TeslalogError> {
    let content = std::fs::read_to_string(path)?;
    let config: TeslalogConfig = toml::from_str(&content)
        .map_err(|e| TeslalogError::Config(format!("{}: {e}", path.display())))?;
    validate_config(&config)?;
    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("TESLALOG_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let home = std::env::var("HOME").ok()?;
    Some(Path::new(&home).join(".teslalog").join("config.toml"))
}

fn validate_config(config: &TeslalogConfig) -> Result<(), TeslalogError> {
    if config.follow.numlines == Some(0) {
        return Err(TeslalogError::Config("follow.numlines must be at least 1".into()));
    }
    if let Some(dir) = &config.split.outdir
        && dir.exists()
        && !dir.is_dir()
    {
        return Err(TeslalogError::Config(format!(
            "split.outdir is not a directory: {}",
            dir.display()
        )));
    }
    Ok(())
}

pub fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".teslalog").join("teslalog.db")
}

/// CLI flag > config > built-in default.
pub fn resolve_db_path(cli: Option<PathBuf>, config: &TeslalogConfig) -> PathBuf {
    cli.or_else(|| config.store.path.clone())
        .unwrap_or_else(default_db_path)
}
