use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::diff::{types::DEFAULT_LOOKAHEAD, DiffAlgorithm, DiffOptions};

const DEFAULT_OWNER: &str = "xalhexi-sch";
const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubConfig {
    /// Account that owns every tutorial repository.
    pub owner: String,
    pub token: Option<String>,
    pub api_base: String,
    pub request_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub github: GitHubConfig,
    pub port: u16,
    pub lookahead: usize,
    pub algorithm: DiffAlgorithm,
    pub cache_ttl: Duration,
    /// Directory holding local clones for `LocalHistory`.
    pub repo_root: PathBuf,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            port: DEFAULT_PORT,
            lookahead: DEFAULT_LOOKAHEAD,
            algorithm: DiffAlgorithm::default(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            repo_root: PathBuf::from("."),
        }
    }
}

impl PortalConfig {
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions::new(self.lookahead, self.algorithm)
    }

    /// Repository directory for local history: the `--repo-dir` flag when
    /// given, `repo_root` otherwise.
    pub fn local_root(&self, repo_dir: Option<PathBuf>) -> PathBuf {
        repo_dir.unwrap_or_else(|| self.repo_root.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    lookahead: Option<usize>,
    #[serde(default)]
    algorithm: Option<String>,
    #[serde(default)]
    cache_ttl_secs: Option<u64>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    repo_root: Option<PathBuf>,
}

fn config_path() -> PathBuf {
    let mut path = dirs_home().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("portal-diff");
    path.push("config.toml");
    path
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn apply_file(config: &mut PortalConfig, file: ConfigFile) {
    if let Some(owner) = file.owner {
        config.github.owner = owner;
    }
    if file.token.is_some() {
        config.github.token = file.token;
    }
    if let Some(api_base) = file.api_base {
        config.github.api_base = api_base;
    }
    if let Some(secs) = file.request_timeout_secs {
        config.github.request_timeout_secs = secs;
    }
    if let Some(port) = file.port {
        config.port = port;
    }
    if let Some(lookahead) = file.lookahead {
        config.lookahead = lookahead.max(1);
    }
    if let Some(name) = file.algorithm {
        match DiffAlgorithm::from_name(&name) {
            Some(algorithm) => config.algorithm = algorithm,
            None => warn!(algorithm = %name, "unknown diff algorithm in config, keeping default"),
        }
    }
    if let Some(secs) = file.cache_ttl_secs {
        config.cache_ttl = Duration::from_secs(secs);
    }
    if let Some(root) = file.repo_root {
        config.repo_root = root;
    }
}

/// Environment wins over the config file. `lookup` is `std::env::var` outside
/// of tests.
fn apply_env<F>(config: &mut PortalConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.is_empty()) {
        config.github.token = Some(token);
    }
    if let Some(owner) = lookup("GITHUB_OWNER").filter(|o| !o.is_empty()) {
        config.github.owner = owner;
    }
    if let Some(port) = lookup("PORTAL_DIFF_PORT") {
        match port.parse() {
            Ok(port) => config.port = port,
            Err(e) => warn!(value = %port, "ignoring invalid PORTAL_DIFF_PORT: {e}"),
        }
    }
}

fn parse_config(contents: &str) -> Option<ConfigFile> {
    match toml::from_str(contents) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!("invalid config file, using defaults: {e}");
            None
        }
    }
}

/// Load config from `~/.config/portal-diff/config.toml`, falling back to
/// defaults, then apply environment overrides.
pub fn load_config() -> PortalConfig {
    let mut config = PortalConfig::default();

    if let Ok(contents) = std::fs::read_to_string(config_path()) {
        if let Some(file) = parse_config(&contents) {
            apply_file(&mut config, file);
        }
    }

    apply_env(&mut config, |key| std::env::var(key).ok());
    config
}
