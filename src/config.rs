use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, CatalogFile};

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3/";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Runtime configuration, usually read from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base url the catalog's relative templates are joined onto.
    pub api_base: String,
    /// Appended as `api_key=` to every request when set.
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    /// Inline catalog tables; builtin tables otherwise.
    pub catalog: Option<CatalogFile>,
}

impl Default for Config {
    fn default() -> Self {
        Self { api_base: DEFAULT_API_BASE.to_string(), api_key: None, timeout_ms: DEFAULT_TIMEOUT_MS, catalog: None }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> { toml::from_str(s).context("parsing config toml") }

    pub fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).with_context(|| format!("reading config: {}", path.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("loading config: {}", path.display()))
    }

    /// `<platform config dir>/config.toml`, if a home directory can be found.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "genreview", "genreview").map(|p| p.config_dir().join("config.toml"))
    }

    /// Resolve config from an explicit path, then `GENREVIEW_CONFIG`, then the
    /// default path (only if it exists), then defaults. Env overrides apply last.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os("GENREVIEW_CONFIG").map(PathBuf::from);
        let mut cfg = Self::load_first(explicit, from_env, Self::default_path())?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// File lookup half of [`Config::resolve`]. An empty `env_path` counts as
    /// unset; `default_path` is only read when it exists.
    pub fn load_first(explicit: Option<&Path>, env_path: Option<PathBuf>, default_path: Option<PathBuf>) -> Result<Self> {
        let env_path = env_path.filter(|p| !p.as_os_str().is_empty());
        match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load(&path),
            None => match default_path.filter(|p| p.exists()) {
                Some(path) => Self::load(&path),
                None => {
                    debug!("no config file found; using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn apply_env(&mut self) { self.apply_overrides(|key| std::env::var(key).ok()) }

    /// Apply `GENREVIEW_API_BASE`, `GENREVIEW_API_KEY` and `GENREVIEW_TIMEOUT_MS`
    /// as looked up by `lookup`. Unparseable timeouts are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup("GENREVIEW_API_BASE").filter(|s| !s.trim().is_empty()) {
            self.api_base = base;
        }
        if let Some(key) = lookup("GENREVIEW_API_KEY").filter(|s| !s.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(ms) = lookup("GENREVIEW_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.timeout_ms = ms;
        }
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_ms.max(1)) }

    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog {
            Some(file) => Catalog::from_file(file).context("building catalog from config"),
            None => Ok(Catalog::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Section;
    use std::collections::HashMap;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(cfg.catalog().unwrap(), Catalog::builtin());
    }

    #[test]
    fn load_reads_file_with_inline_catalog() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, r#"
            api_base = "http://localhost:8080/"
            api_key = "secret"
            timeout_ms = 500

            [[catalog.series]]
            name = "Drama"
            url = "/api/series/drama?"
        "#).unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.api_base, "http://localhost:8080/");
        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.timeout(), Duration::from_millis(500));

        let catalog = cfg.catalog().unwrap();
        assert_eq!(catalog.set(Section::Series).len(), 1);
        assert_eq!(catalog.set(Section::Series).find("Drama").unwrap().url, "/api/series/drama?");
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");
        assert!(Config::resolve(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_path_beats_env_path() {
        let tmp = tempfile::tempdir().unwrap();
        let explicit = tmp.path().join("explicit.toml");
        let env = tmp.path().join("env.toml");
        fs::write(&explicit, "timeout_ms = 100").unwrap();
        fs::write(&env, "timeout_ms = 200").unwrap();

        let cfg = Config::load_first(Some(&explicit), Some(env.clone()), None).unwrap();
        assert_eq!(cfg.timeout_ms, 100);
        let cfg = Config::load_first(None, Some(env), None).unwrap();
        assert_eq!(cfg.timeout_ms, 200);
    }

    #[test]
    fn empty_env_path_falls_through_to_default_path() {
        let tmp = tempfile::tempdir().unwrap();
        let default = tmp.path().join("config.toml");
        fs::write(&default, "api_key = \"from-default\"").unwrap();

        let cfg = Config::load_first(None, Some(PathBuf::new()), Some(default)).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("from-default"));
    }

    #[test]
    fn missing_default_path_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::load_first(None, None, Some(tmp.path().join("absent.toml"))).unwrap();
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn overrides_replace_fields() {
        let env: HashMap<&str, &str> = [
            ("GENREVIEW_API_BASE", "http://example.test/"),
            ("GENREVIEW_API_KEY", "k"),
            ("GENREVIEW_TIMEOUT_MS", "not-a-number"),
        ].into_iter().collect();

        let mut cfg = Config::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api_base, "http://example.test/");
        assert_eq!(cfg.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
