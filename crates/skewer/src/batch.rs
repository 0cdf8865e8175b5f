//! # Pipeline Batch
//!
//! The unit of work flowing from [`preprocess`](crate::pipeline::Pipeline::preprocess)
//! to [`forward`](crate::pipeline::Pipeline::forward).
//!
//! All tensors are flat, row-major buffers. Row `r` occupies
//! `[r * max_sequence, (r + 1) * max_sequence)` of each input tensor and
//! `[r * max_sequence * output_dim, (r + 1) * max_sequence * output_dim)` of
//! the output tensor. Row `r` always belongs to `input[r]`.

use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::record::TokenizedInput;

/// Tokenized inputs plus the padded tensors built from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineBatch {
    pub(crate) input: Vec<TokenizedInput>,
    pub(crate) ids_tensor: Vec<i64>,
    pub(crate) type_ids_tensor: Vec<i64>,
    pub(crate) attention_mask_tensor: Vec<i64>,
    pub(crate) max_sequence: usize,
    pub(crate) output_tensor: Vec<f32>,
    pub(crate) output_dim: usize,
}

/// The output slice belonging to one input of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowOutput {
    pub input: TokenizedInput,
    pub max_sequence: usize,
    pub output_dim: usize,
    /// `max_sequence * output_dim` values, token major
    pub values: Vec<f32>,
}

impl RowOutput {
    /// Output vector for token `token` of this row.
    pub fn token(&self, token: usize) -> Option<&[f32]> {
        token_slice(&self.values, self.max_sequence, self.output_dim, token)
    }
}

fn token_slice(
    values: &[f32],
    max_sequence: usize,
    output_dim: usize,
    token: usize,
) -> Option<&[f32]> {
    if token >= max_sequence {
        return None;
    }
    values.get(token * output_dim..(token + 1) * output_dim)
}

impl PipelineBatch {
    pub(crate) fn from_parts(
        input: Vec<TokenizedInput>,
        max_sequence: usize,
        ids_tensor: Vec<i64>,
        type_ids_tensor: Vec<i64>,
        attention_mask_tensor: Vec<i64>,
    ) -> Self {
        Self {
            input,
            ids_tensor,
            type_ids_tensor,
            attention_mask_tensor,
            max_sequence,
            output_tensor: Vec::new(),
            output_dim: 0,
        }
    }

    pub fn input(&self) -> &[TokenizedInput] {
        &self.input
    }

    /// Batch size `N`.
    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Padded sequence length shared by every row.
    pub fn max_sequence(&self) -> usize {
        self.max_sequence
    }

    pub fn ids_tensor(&self) -> &[i64] {
        &self.ids_tensor
    }

    pub fn type_ids_tensor(&self) -> &[i64] {
        &self.type_ids_tensor
    }

    pub fn attention_mask_tensor(&self) -> &[i64] {
        &self.attention_mask_tensor
    }

    /// Raw engine output; empty until the batch has been forwarded.
    pub fn output_tensor(&self) -> &[f32] {
        &self.output_tensor
    }

    /// Output width per token; 0 until the batch has been forwarded.
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn has_output(&self) -> bool {
        self.output_dim > 0
    }

    /// Check every input tensor against `N * max_sequence`.
    pub fn validate(&self) -> Result<()> {
        let expected = self.len() * self.max_sequence;
        let tensors = [
            ("input_ids", self.ids_tensor.len()),
            ("token_type_ids", self.type_ids_tensor.len()),
            ("attention_mask", self.attention_mask_tensor.len()),
        ];
        for (tensor, actual) in tensors {
            if actual != expected {
                return Err(PipelineError::Shape { tensor, expected, actual });
            }
        }
        Ok(())
    }

    pub(crate) fn set_output(&mut self, output_tensor: Vec<f32>, output_dim: usize) {
        self.output_tensor = output_tensor;
        self.output_dim = output_dim;
    }

    fn row_width(&self) -> usize {
        self.max_sequence * self.output_dim
    }

    /// Output values of row `row`.
    pub fn output_row(&self, row: usize) -> Option<&[f32]> {
        if !self.has_output() || row >= self.len() {
            return None;
        }
        let width = self.row_width();
        self.output_tensor.get(row * width..(row + 1) * width)
    }

    /// Output rows in input order.
    pub fn output_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        let width = self.row_width().max(1);
        let rows = if self.has_output() { self.len() } else { 0 };
        self.output_tensor.chunks(width).take(rows)
    }

    /// Output vector for token `token` of row `row`.
    pub fn token_output(&self, row: usize, token: usize) -> Option<&[f32]> {
        self.output_row(row)
            .and_then(|values| token_slice(values, self.max_sequence, self.output_dim, token))
    }

    /// Split a forwarded batch into one [`RowOutput`] per input.
    pub fn into_rows(self) -> Vec<RowOutput> {
        let width = self.row_width();
        let max_sequence = self.max_sequence;
        let output_dim = self.output_dim;
        let mut values = self.output_tensor.into_iter();

        self.input
            .into_iter()
            .map(|input| RowOutput {
                input,
                max_sequence,
                output_dim,
                values: values.by_ref().take(width).collect(),
            })
            .collect()
    }
}
