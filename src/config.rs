use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use podtail_types::{DEFAULT_NAMESPACE, DEFAULT_TAIL_LINES, StreamSettings};

use crate::Args;

const DEFAULT_KUBECTL: &str = "kubectl";
const DEFAULT_TICK_RATE_MS: u64 = 100;

/// Environment variable naming a config file
const CONFIG_ENV: &str = "PODTAIL_CONFIG";

/// `tail` in the config file: a line count or `"all"`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
enum TailValue {
    Lines(u64),
    Keyword(String),
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    kubectl: Option<String>,
    namespace: Option<String>,
    tail: Option<TailValue>,
    follow: Option<bool>,
    tick_rate_ms: Option<u64>,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
    }

    fn tail(&self) -> Result<Option<Option<u64>>> {
        match &self.tail {
            None => Ok(None),
            Some(TailValue::Lines(n)) => Ok(Some(Some(*n))),
            Some(TailValue::Keyword(k)) if k.eq_ignore_ascii_case("all") => Ok(Some(None)),
            Some(TailValue::Keyword(k)) => bail!("invalid tail value {:?}, expected a number or \"all\"", k),
        }
    }
}

/// Effective settings after merging CLI flags, the config file and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub kubectl: String,
    pub namespace: String,
    pub stream: StreamSettings,
    pub tick_rate: Duration,
    /// Config file that was read, if any
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Discover and read the config file, then apply CLI overrides
    pub fn load(args: &Args) -> Result<Self> {
        let path = discover_config_path(
            args.config.as_deref(),
            std::env::var(CONFIG_ENV).ok(),
            std::env::var("HOME").ok(),
        );
        let file = match &path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        let mut settings = Self::resolve(args, &file)?;
        settings.source = path;
        Ok(settings)
    }

    fn resolve(args: &Args, file: &ConfigFile) -> Result<Self> {
        let tail = if args.no_tail {
            None
        } else if let Some(n) = args.tail {
            Some(n)
        } else {
            file.tail()?.unwrap_or(Some(DEFAULT_TAIL_LINES))
        };
        let follow = !args.no_follow && file.follow.unwrap_or(true);

        let tick_rate_ms = args
            .tick_rate
            .or(file.tick_rate_ms)
            .unwrap_or(DEFAULT_TICK_RATE_MS);
        if tick_rate_ms == 0 {
            bail!("tick rate must be at least 1 ms");
        }

        Ok(Self {
            kubectl: args
                .kubectl
                .clone()
                .or_else(|| file.kubectl.clone())
                .unwrap_or_else(|| DEFAULT_KUBECTL.to_string()),
            namespace: args
                .namespace
                .clone()
                .or_else(|| file.namespace.clone())
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            stream: StreamSettings { follow, tail },
            tick_rate: Duration::from_millis(tick_rate_ms),
            source: None,
        })
    }
}

/// Pick the config file: explicit path, then the environment, then the
/// user config directory. Only the last one is skipped when missing.
fn discover_config_path(
    explicit: Option<&Path>,
    env: Option<String>,
    home: Option<String>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env.filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }

    let candidate = PathBuf::from(home?).join(".config/podtail/config.toml");
    candidate.exists().then_some(candidate)
}
