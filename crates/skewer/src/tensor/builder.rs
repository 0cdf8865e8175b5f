use super::constant::PAD_VALUE;
use crate::batch::PipelineBatch;
use crate::binding::ModelBinding;
use crate::record::TokenizedInput;

/// Padding target for a set of inputs: one past the largest
/// `max_attention_index`, and 1 for an empty set.
pub fn max_sequence(inputs: &[TokenizedInput]) -> usize {
    inputs
        .iter()
        .map(|input| input.max_attention_index)
        .max()
        .map_or(1, |index| index + 1)
}

/// Builds padded batch tensors from tokenized inputs.
///
/// Every row is padded with [`PAD_VALUE`] up to [`max_sequence`]. Type ids
/// and the attention mask are only copied when the model declares those
/// inputs; otherwise their tensors stay all padding. Rows keep input order.
///
/// # Implementation Notes
///
/// The three buffers are allocated once at their final size and each row is
/// written through a slice of width `max_sequence`, so tokens past the
/// padding target (non-attended trailing tokens) are dropped.
pub fn build_batch(inputs: Vec<TokenizedInput>, binding: &ModelBinding) -> PipelineBatch {
    let max_sequence = max_sequence(&inputs);
    let tensor_size = inputs.len() * max_sequence;

    let mut ids_tensor = vec![PAD_VALUE; tensor_size];
    let mut type_ids_tensor = vec![PAD_VALUE; tensor_size];
    let mut attention_mask_tensor = vec![PAD_VALUE; tensor_size];

    let rows = ids_tensor
        .chunks_mut(max_sequence)
        .zip(type_ids_tensor.chunks_mut(max_sequence))
        .zip(attention_mask_tensor.chunks_mut(max_sequence));

    for (input, ((ids_row, type_ids_row), mask_row)) in inputs.iter().zip(rows) {
        copy_row(ids_row, &input.token_ids);
        if binding.has_token_type_ids() {
            copy_row(type_ids_row, &input.type_ids);
        }
        if binding.has_attention_mask() {
            copy_row(mask_row, &input.attention_mask);
        }
    }

    PipelineBatch::from_parts(
        inputs,
        max_sequence,
        ids_tensor,
        type_ids_tensor,
        attention_mask_tensor,
    )
}

#[inline]
fn copy_row(row: &mut [i64], values: &[u32]) {
    for (slot, &value) in row.iter_mut().zip(values) {
        *slot = i64::from(value);
    }
}
