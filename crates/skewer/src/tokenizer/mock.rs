use super::{Encoding, TextTokenizer, TokenizerError};

pub(crate) const CLS_ID: u32 = 101;
pub(crate) const SEP_ID: u32 = 102;

/// Splits on whitespace and derives ids from the word bytes.
///
/// With special tokens enabled every encoding is wrapped in `[CLS] ... [SEP]`.
/// `pad_to` appends non-attended padding tokens, the way a tokenizer with
/// fixed-length padding would.
#[derive(Debug, Clone, Default)]
pub(crate) struct WhitespaceTokenizer {
    pub(crate) type_id: u32,
    pub(crate) pad_to: Option<usize>,
    pub(crate) fail_on: Option<String>,
}

impl WhitespaceTokenizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn word_id(word: &str) -> u32 {
        1000 + word.bytes().map(u32::from).sum::<u32>()
    }

    fn push(
        encoding: &mut Encoding,
        token: &str,
        id: u32,
        type_id: u32,
        attended: u32,
        special: u32,
        offset: (usize, usize),
    ) {
        encoding.tokens.push(token.to_string());
        encoding.ids.push(id);
        encoding.type_ids.push(type_id);
        encoding.attention_mask.push(attended);
        encoding.special_tokens_mask.push(special);
        encoding.offsets.push(offset);
    }
}

impl TextTokenizer for WhitespaceTokenizer {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Encoding, TokenizerError> {
        if self.fail_on.as_deref() == Some(text) {
            return Err(TokenizerError::Backend(format!("cannot encode `{}`", text)));
        }

        let mut encoding = Encoding::default();
        if add_special_tokens {
            Self::push(&mut encoding, "[CLS]", CLS_ID, self.type_id, 1, 1, (0, 0));
        }

        let mut cursor = 0;
        for word in text.split_whitespace() {
            let start = text[cursor..].find(word).map_or(cursor, |idx| cursor + idx);
            let end = start + word.len();
            cursor = end;
            Self::push(&mut encoding, word, Self::word_id(word), self.type_id, 1, 0, (start, end));
        }

        if add_special_tokens {
            Self::push(&mut encoding, "[SEP]", SEP_ID, self.type_id, 1, 1, (0, 0));
        }

        if let Some(pad_to) = self.pad_to {
            while encoding.len() < pad_to {
                Self::push(&mut encoding, "[PAD]", 0, 0, 0, 1, (0, 0));
            }
        }

        Ok(encoding)
    }
}
