use thiserror::Error;

/// Errors an inference engine can report.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Data length does not match the requested shape
    #[error("cannot shape {len} elements as {shape:?}")]
    Shape { shape: Vec<usize>, len: usize },

    /// A tensor was used in a role it was not created for
    #[error("tensor handle is not valid for this operation")]
    UnknownTensor,

    /// The runtime itself failed; carries its diagnostic verbatim
    #[error("{0}")]
    Backend(String),
}

/// Name and dimensions of a declared model input or output.
///
/// Dynamic dimensions are reported as `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: String,
    pub dimensions: Vec<i64>,
}

impl TensorInfo {
    pub fn new(name: impl Into<String>, dimensions: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            dimensions,
        }
    }

    /// A fixed, positive dimension at `index`, if the model declares one.
    pub fn fixed_dim(&self, index: usize) -> Option<usize> {
        self.dimensions
            .get(index)
            .and_then(|&dim| usize::try_from(dim).ok())
            .filter(|&dim| dim > 0)
    }
}

/// The engine trait the pipeline executes models through.
///
/// Tensors are engine-owned handles. The pipeline creates them per call and
/// hands each one back through [`release`](InferenceEngine::release) exactly
/// once; none outlives the call that created it.
pub trait InferenceEngine: Send + Sync {
    /// Engine specific tensor handle
    type Tensor: Send;

    /// Inputs the loaded model declares, in declaration order
    fn inputs(&self) -> &[TensorInfo];

    /// Outputs the loaded model declares, in declaration order
    fn outputs(&self) -> &[TensorInfo];

    /// Wrap row-major `i64` data as a rank 2 tensor of `shape`
    fn input_tensor(&self, shape: [usize; 2], data: &[i64]) -> Result<Self::Tensor, EngineError>;

    /// Allocate a rank 3 `f32` output tensor of `shape`
    fn output_tensor(&self, shape: [usize; 3]) -> Result<Self::Tensor, EngineError>;

    /// Run one forward pass, filling `output`
    fn run(
        &self,
        inputs: &[(&str, &Self::Tensor)],
        output: (&str, &mut Self::Tensor),
    ) -> Result<(), EngineError>;

    /// Move the flat row-major contents out of a filled output tensor
    fn output_data(&self, tensor: &mut Self::Tensor) -> Result<Vec<f32>, EngineError>;

    /// Release a tensor handle
    fn release(&self, tensor: Self::Tensor) -> Result<(), EngineError>;
}
