use std::iter;
use std::time::Instant;

use log::{debug, error, warn};

use crate::backend::{InferenceEngine, ScopedTensor};
use crate::batch::PipelineBatch;
use crate::binding::{InputRole, ModelBinding};
use crate::error::{PipelineError, Result};
use crate::tensor::{input_shape, output_shape};
use crate::timing::Timings;

/// Runs one forward pass over a prepared batch.
///
/// # Steps
///
/// 1. Resolve every declared input to an [`InputRole`]; an unknown name
///    fails before any tensor exists
/// 2. Wrap the batch tensors as `(N, max_sequence)` inputs and allocate one
///    `(N, max_sequence, output_dim)` output
/// 3. Run the engine once
/// 4. Copy the flat output onto the batch
///
/// Every tensor from step 2 is owned by a [`ScopedTensor`]. Once the engine
/// has run, successfully or not, all of them are released explicitly and the
/// first failure is kept; an engine error is reported ahead of a release
/// error. Only a failed allocation leaves the guards to release on drop.
/// `timings` records steps 2 to 4 for successful calls only. The batch is
/// only handed back once complete.
pub(crate) fn forward_batch<E>(
    engine: &E,
    binding: &ModelBinding,
    timings: &Timings,
    mut batch: PipelineBatch,
) -> Result<PipelineBatch>
where
    E: InferenceEngine + ?Sized,
{
    batch.validate()?;

    let roles = binding
        .input_names()
        .iter()
        .map(|name| {
            InputRole::from_name(name).ok_or_else(|| PipelineError::UnsupportedInput(name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let start = Instant::now();
    let batch_size = batch.len();
    let max_sequence = batch.max_sequence();
    let output_dim = binding.output_dim();

    let inputs = roles
        .iter()
        .map(|role| {
            engine
                .input_tensor(input_shape(batch_size, max_sequence), role.tensor(&batch))
                .map(|tensor| ScopedTensor::new(engine, tensor))
                .map_err(PipelineError::Allocation)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut output = engine
        .output_tensor(output_shape(batch_size, max_sequence, output_dim))
        .map(|tensor| ScopedTensor::new(engine, tensor))
        .map_err(PipelineError::Allocation)?;

    let named: Vec<(&str, &E::Tensor)> = binding
        .input_names()
        .iter()
        .map(String::as_str)
        .zip(inputs.iter().map(ScopedTensor::tensor))
        .collect();

    let outcome = engine
        .run(&named, (binding.output_name(), output.tensor_mut()))
        .and_then(|_| engine.output_data(output.tensor_mut()))
        .map_err(|e| {
            warn!("Forward pass over {}x{} batch failed: {}", batch_size, max_sequence, e);
            PipelineError::Execution(e)
        });
    let elapsed = start.elapsed();

    // an engine failure outranks a release failure
    let released = release_all(inputs, output);
    let output_tensor = outcome?;
    released?;

    let expected = batch_size * max_sequence * output_dim;
    if output_tensor.len() != expected {
        return Err(PipelineError::OutputMismatch {
            expected,
            actual: output_tensor.len(),
        });
    }

    timings.record_call(elapsed);
    debug!(
        "Forwarded {}x{} batch ({} outputs) in {:?}",
        batch_size, max_sequence, output_dim, elapsed
    );

    batch.set_output(output_tensor, output_dim);
    Ok(batch)
}

/// Release every guard, keeping the first failure.
fn release_all<E>(inputs: Vec<ScopedTensor<'_, E>>, output: ScopedTensor<'_, E>) -> Result<()>
where
    E: InferenceEngine + ?Sized,
{
    let mut first_error = None;
    for guard in inputs.into_iter().chain(iter::once(output)) {
        if let Err(e) = guard.release() {
            error!("{}", e);
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
