//! # Tokenizer Seam
//!
//! Tokenization is an external collaborator. The pipeline only needs a
//! [`TextTokenizer`] that returns aligned ids, type ids, attention mask,
//! special tokens mask and offsets for a piece of text.
//!
//! ## Feature Flags
//!
//! - `tokenizers`: implements [`TextTokenizer`] for `tokenizers::Tokenizer`

mod core_trait;

#[cfg_attr(docsrs, doc(cfg(feature = "tokenizers")))]
#[cfg(feature = "tokenizers")]
/// Hugging Face `tokenizers` implementation.
///
/// Only available when the `tokenizers` feature flag is enabled.
pub mod hf;

pub use core_trait::*;

#[cfg(test)]
/// Whitespace tokenizer used by unit tests.
pub(crate) mod mock;
