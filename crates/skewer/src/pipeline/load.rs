use std::path::Path;

use log::info;
use tokenizers::Tokenizer;

use super::Pipeline;
use crate::backend::onnx::OnnxEngine;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::tokenizer::hf::load_tokenizer;

impl Pipeline<OnnxEngine, Tokenizer> {
    /// Load the model and tokenizer named by `config` from `model_dir`.
    ///
    /// Fails with a load error when either file is missing or unreadable, or
    /// when the model declares an input the pipeline cannot feed.
    pub fn load(model_dir: impl AsRef<Path>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let model_dir = model_dir.as_ref();
        let model_path = model_dir.join(&config.model_file);
        let tokenizer_path = model_dir.join(&config.tokenizer_file);
        info!(
            "Loading pipeline {} (model {}, tokenizer {})",
            config.name,
            model_path.display(),
            tokenizer_path.display()
        );

        let tokenizer = load_tokenizer(&tokenizer_path, config.max_length)?;
        let engine = OnnxEngine::from_file(&model_path, &config)?;
        Pipeline::new(engine, tokenizer, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, Stage};

    #[test]
    fn test_missing_model_dir_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Pipeline::load(dir.path().join("absent"), PipelineConfig::default());
        match result {
            Err(err) => assert_eq!(err.stage(), Stage::Load),
            Ok(_) => panic!("loaded a pipeline from an empty directory"),
        }
    }

    #[test]
    fn test_invalid_config_fails_before_touching_disk() {
        let config = PipelineConfig {
            intra_op_threads: 0,
            ..PipelineConfig::default()
        };
        let result = Pipeline::load("/nonexistent", config);
        assert!(matches!(result, Err(PipelineError::Load(msg)) if msg.contains("thread counts")));
    }
}
