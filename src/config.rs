use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub preaviso: PreavisoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexingConfig {
    /// Chunking algorithm tag; part of the index signature.
    #[serde(default = "default_chunking_version")]
    pub chunking_version: String,
    /// Embedding model identifier; part of the index signature.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// TTL for cached extracted text, seconds.
    #[serde(default = "default_extract_cache_ttl")]
    pub extract_cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PreavisoConfig {
    /// Prompt template version; part of the knowledge hash.
    #[serde(default = "default_prompt_version")]
    pub prompt_version: String,
}

fn default_chunking_version() -> String {
    "v1".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_extract_cache_ttl() -> u64 {
    3600
}
fn default_prompt_version() -> String {
    "v3".to_string()
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunking_version: default_chunking_version(),
            embedding_model: default_embedding_model(),
            extract_cache_ttl_secs: default_extract_cache_ttl(),
        }
    }
}

impl Default for PreavisoConfig {
    fn default() -> Self {
        Self {
            prompt_version: default_prompt_version(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_sections_missing() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.indexing.chunking_version, "v1");
        assert_eq!(config.indexing.embedding_model, "text-embedding-3-small");
        assert_eq!(config.preaviso.prompt_version, "v3");
    }

    #[test]
    fn partial_override() {
        let config: Config = toml::from_str(
            r#"
[indexing]
chunking_version = "v2"
"#,
        )
        .unwrap();
        assert_eq!(config.indexing.chunking_version, "v2");
        assert_eq!(config.indexing.extract_cache_ttl_secs, 3600);
    }
}
