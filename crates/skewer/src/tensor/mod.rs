//! # Batch Tensors
//!
//! Turns an ordered set of [`TokenizedInput`](crate::record::TokenizedInput)s
//! into the padded, row-major `i64` tensors an inference engine expects.

pub mod constant;
mod builder;

pub use builder::{build_batch, max_sequence};

/// Shape of a rank 2 input tensor for a batch.
pub fn input_shape(batch_size: usize, max_sequence: usize) -> [usize; 2] {
    let mut shape = [0; 2];
    shape[constant::BATCH_DIM] = batch_size;
    shape[constant::SEQ_DIM] = max_sequence;
    shape
}

/// Shape of the rank 3 output tensor for a batch.
pub fn output_shape(batch_size: usize, max_sequence: usize, output_dim: usize) -> [usize; 3] {
    let mut shape = [0; 3];
    shape[constant::BATCH_DIM] = batch_size;
    shape[constant::SEQ_DIM] = max_sequence;
    shape[constant::OUTPUT_DIM] = output_dim;
    shape
}
