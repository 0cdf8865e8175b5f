/// # Constants with reserved meanings in batch tensors

/// In a batch tensor shape, the `0th` dimension is the batch
pub const BATCH_DIM: usize = 0;

/// In a batch tensor shape, the `1st` dimension is the sequence
pub const SEQ_DIM: usize = 1;

/// In an output tensor shape, the `2nd` dimension is the per-token output
pub const OUTPUT_DIM: usize = 2;

/// Filler written past the end of a row, for ids, type ids and mask alike
pub const PAD_VALUE: i64 = 0;
