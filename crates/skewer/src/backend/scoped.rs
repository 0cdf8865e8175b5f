use std::thread;

use log::error;

use super::InferenceEngine;
use crate::error::{PipelineError, Result};

/// Owns one transient engine tensor for the duration of a call.
///
/// Call [`release`](ScopedTensor::release) on the success path to surface
/// release failures as errors. A guard that is dropped instead (early
/// return, `?`, panic) releases its tensor on the way out. A failed release
/// during drop panics, unless the thread is already unwinding, in which case
/// it is logged so the original panic is not turned into an abort.
pub struct ScopedTensor<'e, E: InferenceEngine + ?Sized> {
    engine: &'e E,
    tensor: Option<E::Tensor>,
}

impl<'e, E: InferenceEngine + ?Sized> ScopedTensor<'e, E> {
    pub fn new(engine: &'e E, tensor: E::Tensor) -> Self {
        Self {
            engine,
            tensor: Some(tensor),
        }
    }

    pub fn tensor(&self) -> &E::Tensor {
        match &self.tensor {
            Some(tensor) => tensor,
            // only `release` takes the tensor and it consumes the guard
            None => unreachable!("scoped tensor used after release"),
        }
    }

    pub fn tensor_mut(&mut self) -> &mut E::Tensor {
        match &mut self.tensor {
            Some(tensor) => tensor,
            None => unreachable!("scoped tensor used after release"),
        }
    }

    /// Release the tensor now and report failure.
    pub fn release(mut self) -> Result<()> {
        match self.tensor.take() {
            Some(tensor) => self.engine.release(tensor).map_err(PipelineError::Release),
            None => Ok(()),
        }
    }
}

impl<E: InferenceEngine + ?Sized> Drop for ScopedTensor<'_, E> {
    fn drop(&mut self) {
        if let Some(tensor) = self.tensor.take() {
            if let Err(e) = self.engine.release(tensor) {
                if thread::panicking() {
                    error!("Failed to release tensor while unwinding: {}", e);
                } else {
                    panic!("failed to release transient tensor: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic;

    use super::*;
    use crate::backend::mock::MockEngine;

    #[test]
    fn test_drop_releases() {
        let engine = MockEngine::bert();
        {
            let tensor = engine.input_tensor([1, 2], &[5, 6]).unwrap();
            let _guard = ScopedTensor::new(&engine, tensor);
            assert_eq!(engine.live_tensors(), 1);
        }
        assert_eq!(engine.live_tensors(), 0);
    }

    #[test]
    fn test_explicit_release() {
        let engine = MockEngine::bert();
        let guard = ScopedTensor::new(&engine, engine.output_tensor([1, 2, 3]).unwrap());
        assert!(guard.release().is_ok());
        assert_eq!(engine.live_tensors(), 0);
        assert_eq!(engine.released(), 1);
    }

    #[test]
    fn test_explicit_release_failure_is_error() {
        let engine = MockEngine::bert().failing_release();
        let guard = ScopedTensor::new(&engine, engine.input_tensor([1, 1], &[1]).unwrap());
        assert!(matches!(guard.release(), Err(PipelineError::Release(_))));
    }

    #[test]
    fn test_drop_release_failure_panics() {
        let engine = MockEngine::bert().failing_release();
        let tensor = engine.input_tensor([1, 1], &[1]).unwrap();
        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let _guard = ScopedTensor::new(&engine, tensor);
        }));
        assert!(result.is_err(), "release failure must not be silent");
    }
}
