use std::sync::atomic::{AtomicUsize, Ordering};

use super::{EngineError, InferenceEngine, TensorInfo};

/// A deterministic engine for tests.
///
/// Each output value depends only on the token at the same row and column:
/// `out[r][j][k] = (id + k / 4) * mask`, with the mask treated as 1 when the
/// model declares no attention mask. Live handles are counted so tests can
/// check that every tensor a call creates is released.
#[derive(Debug)]
pub(crate) struct MockEngine {
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
    fail_run: bool,
    fail_release: bool,
    live: AtomicUsize,
    released: AtomicUsize,
    runs: AtomicUsize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MockTensor {
    Input { shape: [usize; 2], data: Vec<i64> },
    Output { shape: [usize; 3], data: Vec<f32> },
}

impl MockEngine {
    pub(crate) fn new(input_names: &[&str], output_dim: i64) -> Self {
        Self {
            inputs: input_names
                .iter()
                .map(|name| TensorInfo::new(*name, vec![-1, -1]))
                .collect(),
            outputs: vec![TensorInfo::new("last_hidden_state", vec![-1, -1, output_dim])],
            fail_run: false,
            fail_release: false,
            live: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            runs: AtomicUsize::new(0),
        }
    }

    /// BERT style model declaring all three inputs and a width 4 output.
    pub(crate) fn bert() -> Self {
        Self::new(&["input_ids", "token_type_ids", "attention_mask"], 4)
    }

    pub(crate) fn with_outputs(mut self, outputs: Vec<TensorInfo>) -> Self {
        self.outputs = outputs;
        self
    }

    pub(crate) fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    pub(crate) fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    pub(crate) fn live_tensors(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    fn find_input<'a>(inputs: &'a [(&str, &MockTensor)], name: &str) -> Option<&'a [i64]> {
        inputs.iter().find(|(n, _)| *n == name).and_then(|(_, tensor)| match tensor {
            MockTensor::Input { data, .. } => Some(data.as_slice()),
            MockTensor::Output { .. } => None,
        })
    }
}

impl InferenceEngine for MockEngine {
    type Tensor = MockTensor;

    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    fn input_tensor(&self, shape: [usize; 2], data: &[i64]) -> Result<MockTensor, EngineError> {
        if shape[0] * shape[1] != data.len() {
            return Err(EngineError::Shape { shape: shape.to_vec(), len: data.len() });
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(MockTensor::Input { shape, data: data.to_vec() })
    }

    fn output_tensor(&self, shape: [usize; 3]) -> Result<MockTensor, EngineError> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(MockTensor::Output { shape, data: Vec::new() })
    }

    fn run(
        &self,
        inputs: &[(&str, &MockTensor)],
        output: (&str, &mut MockTensor),
    ) -> Result<(), EngineError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail_run {
            return Err(EngineError::Backend("mock engine refused to run".to_string()));
        }

        let ids = Self::find_input(inputs, "input_ids").ok_or(EngineError::UnknownTensor)?;
        let mask = Self::find_input(inputs, "attention_mask");
        let (shape, data) = match output.1 {
            MockTensor::Output { shape, data } => (*shape, data),
            MockTensor::Input { .. } => return Err(EngineError::UnknownTensor),
        };

        let dim = shape[2];
        *data = ids
            .iter()
            .enumerate()
            .flat_map(|(idx, &id)| {
                let attended = mask.map_or(1, |m| m[idx]) as f32;
                (0..dim).map(move |k| (id as f32 + k as f32 / 4.0) * attended)
            })
            .collect();
        Ok(())
    }

    fn output_data(&self, tensor: &mut MockTensor) -> Result<Vec<f32>, EngineError> {
        match tensor {
            MockTensor::Output { data, .. } => Ok(std::mem::take(data)),
            MockTensor::Input { .. } => Err(EngineError::UnknownTensor),
        }
    }

    fn release(&self, _tensor: MockTensor) -> Result<(), EngineError> {
        if self.fail_release {
            return Err(EngineError::Backend("mock engine cannot release".to_string()));
        }
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
