//! [`TextTokenizer`] over a Hugging Face `tokenizer.json`.

use std::path::Path;

use log::debug;
use tokenizers::{Tokenizer, TruncationParams};

use super::{Encoding, TextTokenizer, TokenizerError};
use crate::error::{PipelineError, Result};

impl TextTokenizer for Tokenizer {
    fn encode(
        &self,
        text: &str,
        add_special_tokens: bool,
    ) -> std::result::Result<Encoding, TokenizerError> {
        let encoding = Tokenizer::encode(self, text, add_special_tokens)
            .map_err(|e| TokenizerError::Backend(e.to_string()))?;

        Ok(Encoding {
            tokens: encoding.get_tokens().to_vec(),
            ids: encoding.get_ids().to_vec(),
            type_ids: encoding.get_type_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
            special_tokens_mask: encoding.get_special_tokens_mask().to_vec(),
            offsets: encoding.get_offsets().to_vec(),
        })
    }
}

/// Load a tokenizer file, optionally truncating encodings to `max_length`.
pub fn load_tokenizer(path: &Path, max_length: Option<usize>) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path).map_err(|e| {
        PipelineError::Load(format!("failed to load tokenizer {}: {}", path.display(), e))
    })?;

    if let Some(max_length) = max_length {
        debug!("Truncating encodings to {} tokens", max_length);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..TruncationParams::default()
            }))
            .map_err(|e| PipelineError::Load(format!("invalid truncation settings: {}", e)))?;
    }

    Ok(tokenizer)
}
