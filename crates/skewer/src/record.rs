use serde::Serialize;

use crate::tokenizer::Encoding;

/// One tokenized input, in the order it was submitted.
///
/// `special_tokens_mask`, `offsets` and `tokens` are not used by batch
/// construction; they are carried for consumers that map outputs back onto
/// the raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenizedInput {
    pub raw: String,
    pub tokens: Vec<String>,
    pub token_ids: Vec<u32>,
    pub type_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub special_tokens_mask: Vec<u32>,
    pub offsets: Vec<(usize, usize)>,
    /// Highest index with a non-zero attention mask entry, 0 if none
    pub max_attention_index: usize,
}

impl TokenizedInput {
    pub fn new(raw: impl Into<String>, encoding: Encoding) -> Self {
        let max_attention_index = max_attention_index(&encoding.attention_mask);
        Self {
            raw: raw.into(),
            tokens: encoding.tokens,
            token_ids: encoding.ids,
            type_ids: encoding.type_ids,
            attention_mask: encoding.attention_mask,
            special_tokens_mask: encoding.special_tokens_mask,
            offsets: encoding.offsets,
            max_attention_index,
        }
    }

    /// Number of columns this input needs in a padded batch.
    pub fn effective_length(&self) -> usize {
        self.max_attention_index + 1
    }

    pub fn len(&self) -> usize {
        self.token_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_ids.is_empty()
    }
}

/// Highest index `j` with `mask[j] != 0`, or 0 when every entry is zero.
pub fn max_attention_index(mask: &[u32]) -> usize {
    mask.iter().rposition(|&m| m != 0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TextTokenizer;
    use crate::tokenizer::mock::WhitespaceTokenizer;

    #[test]
    fn test_max_attention_index() {
        assert_eq!(max_attention_index(&[1, 1, 1]), 2);
        assert_eq!(max_attention_index(&[1, 1, 0, 0]), 1);
        assert_eq!(max_attention_index(&[0, 1, 0, 1, 0]), 3);
        assert_eq!(max_attention_index(&[0, 0]), 0);
        assert_eq!(max_attention_index(&[]), 0);
    }

    #[test]
    fn test_new_derives_effective_length() {
        let tokenizer = WhitespaceTokenizer { pad_to: Some(8), ..WhitespaceTokenizer::new() };
        let encoding = tokenizer.encode("hello world", true).unwrap();
        let input = TokenizedInput::new("hello world", encoding);

        assert_eq!(input.len(), 8);
        assert_eq!(input.max_attention_index, 3);
        assert_eq!(input.effective_length(), 4);
        assert_eq!(input.tokens[..4], ["[CLS]", "hello", "world", "[SEP]"]);
        assert_eq!(input.offsets[1], (0, 5));
        assert_eq!(input.offsets[2], (6, 11));
    }

    #[test]
    fn test_empty_encoding_occupies_one_column() {
        let input = TokenizedInput::new("", Encoding::default());
        assert!(input.is_empty());
        assert_eq!(input.effective_length(), 1);
    }
}
