use thiserror::Error;

/// Errors a tokenizer can report.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// The underlying tokenizer failed
    #[error("{0}")]
    Backend(String),

    /// The encoding arrays do not line up
    #[error("encoding field `{field}` has length {actual}, expected {expected}")]
    Misaligned {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// The result of encoding one piece of text.
///
/// All vectors have one entry per token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoding {
    pub tokens: Vec<String>,
    pub ids: Vec<u32>,
    pub type_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub special_tokens_mask: Vec<u32>,
    pub offsets: Vec<(usize, usize)>,
}

impl Encoding {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check that every per-token array matches the id count.
    pub fn check_aligned(&self) -> Result<(), TokenizerError> {
        let expected = self.ids.len();
        let lengths = [
            ("tokens", self.tokens.len()),
            ("type_ids", self.type_ids.len()),
            ("attention_mask", self.attention_mask.len()),
            ("special_tokens_mask", self.special_tokens_mask.len()),
            ("offsets", self.offsets.len()),
        ];
        match lengths.into_iter().find(|(_, len)| *len != expected) {
            Some((field, actual)) => Err(TokenizerError::Misaligned { field, expected, actual }),
            None => Ok(()),
        }
    }
}

/// Anything that can turn text into an [`Encoding`].
///
/// Implementations are shared across threads and must tolerate concurrent
/// `encode` calls.
pub trait TextTokenizer: Send + Sync {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Encoding, TokenizerError>;
}

impl<T: TextTokenizer + ?Sized> TextTokenizer for Box<T> {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Encoding, TokenizerError> {
        (**self).encode(text, add_special_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoding(len: usize) -> Encoding {
        Encoding {
            tokens: vec!["a".to_string(); len],
            ids: vec![7; len],
            type_ids: vec![0; len],
            attention_mask: vec![1; len],
            special_tokens_mask: vec![0; len],
            offsets: vec![(0, 1); len],
        }
    }

    #[test]
    fn test_aligned_encoding_passes() {
        assert!(encoding(4).check_aligned().is_ok());
        assert!(Encoding::default().check_aligned().is_ok());
    }

    #[test]
    fn test_short_mask_is_reported() {
        let mut enc = encoding(4);
        enc.attention_mask.pop();
        match enc.check_aligned() {
            Err(TokenizerError::Misaligned { field, expected, actual }) => {
                assert_eq!(field, "attention_mask");
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("expected misaligned error, got {:?}", other),
        }
    }
}
