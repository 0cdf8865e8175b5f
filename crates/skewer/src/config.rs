//! Pipeline configuration.
//!
//! Everything here is read once when a pipeline is built. Defaults match a
//! serving setup where concurrency comes from many callers, so the engine is
//! pinned to one intra-op and one inter-op thread.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Settings for building a [`Pipeline`](crate::pipeline::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name used in log lines
    pub name: String,
    /// Model file name inside the model directory
    pub model_file: String,
    /// Tokenizer file name inside the model directory
    pub tokenizer_file: String,
    /// Threads used inside a single operator
    pub intra_op_threads: usize,
    /// Threads used across independent operators
    pub inter_op_threads: usize,
    /// Use the engine's CPU memory arena
    pub cpu_mem_arena: bool,
    /// Ask the tokenizer to add model specific special tokens
    pub add_special_tokens: bool,
    /// Truncate encodings to this many tokens
    pub max_length: Option<usize>,
    /// Output width per token; read from the model when absent
    pub output_dim: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "pipeline".to_string(),
            model_file: "model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            intra_op_threads: 1,
            inter_op_threads: 1,
            cpu_mem_arena: true,
            add_special_tokens: true,
            max_length: None,
            output_dim: None,
        }
    }
}

impl PipelineConfig {
    /// Default settings under a given pipeline name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PipelineError::Load(format!("invalid pipeline config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            PipelineError::Load(format!("failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    /// Reject settings no engine or tokenizer can honor.
    pub fn validate(&self) -> Result<()> {
        if self.intra_op_threads == 0 || self.inter_op_threads == 0 {
            return Err(PipelineError::Load(format!(
                "thread counts must be positive (intra {}, inter {})",
                self.intra_op_threads, self.inter_op_threads
            )));
        }
        if self.max_length == Some(0) {
            return Err(PipelineError::Load("max_length must be positive".to_string()));
        }
        if self.output_dim == Some(0) {
            return Err(PipelineError::Load("output_dim must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_single_threaded_engine() {
        let config = PipelineConfig::default();
        assert_eq!(config.intra_op_threads, 1);
        assert_eq!(config.inter_op_threads, 1);
        assert!(config.cpu_mem_arena);
        assert!(config.add_special_tokens);
        assert_eq!(config.model_file, "model.onnx");
        assert_eq!(config.tokenizer_file, "tokenizer.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{"name": "ner", "max_length": 128}"#;
        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.name, "ner");
        assert_eq!(config.max_length, Some(128));
        assert_eq!(config.intra_op_threads, 1);
        assert_eq!(config.output_dim, None);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = PipelineConfig::from_json_str(r#"{"inter_op_threads": 0}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn test_zero_output_dim_rejected() {
        let config = PipelineConfig {
            output_dim: Some(0),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_load_error() {
        let err = PipelineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "embeddings", "output_dim": 384}}"#).unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.name, "embeddings");
        assert_eq!(config.output_dim, Some(384));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }
}
