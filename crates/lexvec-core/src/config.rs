//! Lightweight configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_SEARCH__DEFAULT_TOP_K=3`).
//! Every settings section has defaults, so an absent file or key is not an
//! error.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from_dir(Path::new("."), &env_name)
    }

    /// Loads `config.toml` and the overlay for `env_name` from `dir`.
    pub fn load_from_dir(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    /// Extracts one settings section, falling back to `T::default()` when the
    /// key is absent.
    pub fn section<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if !self.figment.contains(key) {
            return Ok(T::default());
        }
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("'{key}': {e}")))
    }

    pub fn search(&self) -> Result<SearchSettings> {
        let s: SearchSettings = self.section("search")?;
        s.validate()?;
        Ok(s)
    }

    pub fn lexical(&self) -> Result<LexicalSettings> {
        let s: LexicalSettings = self.section("lexical")?;
        s.validate()?;
        Ok(s)
    }

    pub fn data(&self) -> Result<DataSettings> {
        self.section("data")
    }

    pub fn embedding(&self) -> Result<EmbeddingSettings> {
        let s: EmbeddingSettings = self.section("embedding")?;
        if s.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be positive".into()));
        }
        Ok(s)
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.search()?;
        self.lexical()?;
        self.embedding()?;
        Ok(())
    }
}

/// How fused results from the two retrieval methods are matched up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FusionKey {
    /// First `key_prefix_chars` characters of the chunk content.
    #[default]
    ContentPrefix,
    /// Ingestion-assigned chunk id, falling back to the content prefix.
    ChunkId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_top_k: usize,
    pub max_top_k: usize,
    /// Each method is asked for `candidate_multiplier * k` candidates.
    pub candidate_multiplier: usize,
    /// Multiplier applied to items found by both methods.
    pub consensus_boost: f32,
    pub default_alpha: f32,
    /// Alpha used when the query cites a section number.
    pub citation_alpha: f32,
    pub fusion_key: FusionKey,
    pub key_prefix_chars: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 20,
            candidate_multiplier: 3,
            consensus_boost: 1.2,
            default_alpha: 0.5,
            citation_alpha: 0.3,
            fusion_key: FusionKey::ContentPrefix,
            key_prefix_chars: 100,
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_top_k == 0 {
            return Err(Error::InvalidConfig("search.max_top_k must be positive".into()));
        }
        if self.default_top_k == 0 || self.default_top_k > self.max_top_k {
            return Err(Error::InvalidConfig(format!(
                "search.default_top_k must be in [1, {}], got {}",
                self.max_top_k, self.default_top_k
            )));
        }
        if self.candidate_multiplier == 0 {
            return Err(Error::InvalidConfig("search.candidate_multiplier must be positive".into()));
        }
        if !(self.consensus_boost >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "search.consensus_boost must be >= 1.0, got {}",
                self.consensus_boost
            )));
        }
        for (name, alpha) in [("default_alpha", self.default_alpha), ("citation_alpha", self.citation_alpha)] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(Error::InvalidConfig(format!("search.{name} must be in [0, 1], got {alpha}")));
            }
        }
        if self.key_prefix_chars == 0 {
            return Err(Error::InvalidConfig("search.key_prefix_chars must be positive".into()));
        }
        Ok(())
    }
}

/// Probe queries used to snapshot the corpus when the dense store cannot
/// enumerate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalSettings {
    pub probe_query: String,
    pub probe_k: usize,
    pub fallback_probe_query: String,
    pub fallback_probe_k: usize,
}

impl Default for LexicalSettings {
    fn default() -> Self {
        Self {
            probe_query: String::new(),
            probe_k: 100_000,
            fallback_probe_query: "tax code".to_string(),
            fallback_probe_k: 10_000,
        }
    }
}

impl LexicalSettings {
    pub fn validate(&self) -> Result<()> {
        if self.probe_k == 0 || self.fallback_probe_k == 0 {
            return Err(Error::InvalidConfig("lexical probe sizes must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub lancedb_dir: String,
    pub table: String,
    pub corpus_jsonl: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { lancedb_dir: "./data/lancedb".to_string(), table: "chunks".to_string(), corpus_jsonl: None }
    }
}

impl DataSettings {
    pub fn lancedb_path(&self) -> PathBuf {
        expand_path(&self.lancedb_dir)
    }

    pub fn corpus_path(&self) -> Option<PathBuf> {
        self.corpus_jsonl.as_deref().map(expand_path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(toml: &str) -> Config {
        Config::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = config_from("");
        assert_eq!(config.search().unwrap(), SearchSettings::default());
        assert_eq!(config.lexical().unwrap(), LexicalSettings::default());
        assert_eq!(config.embedding().unwrap().dim, 384);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = config_from("[search]\ndefault_top_k = 3\nfusion_key = \"chunk_id\"\n");
        let search = config.search().unwrap();
        assert_eq!(search.default_top_k, 3);
        assert_eq!(search.max_top_k, 20);
        assert_eq!(search.fusion_key, FusionKey::ChunkId);
    }

    #[test]
    fn out_of_range_alpha_is_rejected() {
        let config = config_from("[search]\ncitation_alpha = 1.5\n");
        assert!(matches!(config.search(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_probe_size_is_rejected() {
        let config = config_from("[lexical]\nfallback_probe_k = 0\n");
        assert!(matches!(config.lexical(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn corpus_path_is_optional() {
        assert_eq!(DataSettings::default().corpus_path(), None);
        let data = DataSettings { corpus_jsonl: Some("/srv/title26.jsonl".into()), ..DataSettings::default() };
        assert_eq!(data.corpus_path(), Some(PathBuf::from("/srv/title26.jsonl")));
        assert_eq!(data.lancedb_path(), PathBuf::from("./data/lancedb"));
    }
}
