use std::borrow::Cow;
use std::path::Path;

use log::{debug, info};
use ort::execution_providers::CPUExecutionProvider;
use ort::memory::Allocator;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::{OutputSelector, RunOptions, Session, SessionInputValue, SessionInputs};
use ort::value::{Tensor, ValueType};

use super::{EngineError, InferenceEngine, TensorInfo};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// An ONNX Runtime session plus the metadata the pipeline binds against.
pub struct OnnxEngine {
    session: Session,
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
}

/// Tensor handle created by [`OnnxEngine`].
pub enum OnnxTensor {
    /// An `i64` input bound by name
    Input(Tensor<i64>),
    /// Output slot. `buffer` is handed to the session as the preallocated
    /// output of one run; `data` holds what the run wrote into it.
    Output {
        shape: [usize; 3],
        buffer: Option<Tensor<f32>>,
        data: Vec<f32>,
    },
}

fn load_error(context: &str) -> impl FnOnce(ort::Error) -> PipelineError + '_ {
    move |e| PipelineError::Load(format!("{}: {}", context, e))
}

impl OnnxEngine {
    /// Create a session from a model file.
    pub fn from_file(model_path: &Path, config: &PipelineConfig) -> Result<Self> {
        if !model_path.is_file() {
            return Err(PipelineError::Load(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }
        let session = Self::builder(config)?
            .commit_from_file(model_path)
            .map_err(load_error("failed to load ONNX model"))?;
        info!("Loaded model at {}", model_path.display());
        Ok(Self::from_session(session))
    }

    /// Create a session from model bytes already in memory.
    pub fn from_memory(model_bytes: &[u8], config: &PipelineConfig) -> Result<Self> {
        let session = Self::builder(config)?
            .commit_from_memory(model_bytes)
            .map_err(load_error("failed to load ONNX model"))?;
        Ok(Self::from_session(session))
    }

    fn builder(config: &PipelineConfig) -> Result<SessionBuilder> {
        let mut cpu = CPUExecutionProvider::default();
        if config.cpu_mem_arena {
            cpu = cpu.with_arena_allocator();
        }

        debug!(
            "Building ONNX session with {} intra-op and {} inter-op threads (cpu arena: {})",
            config.intra_op_threads, config.inter_op_threads, config.cpu_mem_arena
        );

        Session::builder()
            .map_err(load_error("failed to create session builder"))?
            .with_execution_providers([cpu.build()])
            .map_err(load_error("failed to configure CPU execution provider"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_error("failed to set optimization level"))?
            .with_intra_threads(config.intra_op_threads)
            .map_err(load_error("failed to set intra-op threads"))?
            .with_inter_threads(config.inter_op_threads)
            .map_err(load_error("failed to set inter-op threads"))
    }

    fn from_session(session: Session) -> Self {
        let inputs = session
            .inputs
            .iter()
            .map(|input| TensorInfo::new(input.name.clone(), dimensions_of(&input.input_type)))
            .collect();
        let outputs = session
            .outputs
            .iter()
            .map(|output| {
                TensorInfo::new(output.name.clone(), dimensions_of(&output.output_type))
            })
            .collect();
        Self {
            session,
            inputs,
            outputs,
        }
    }
}

fn dimensions_of(value_type: &ValueType) -> Vec<i64> {
    match value_type {
        ValueType::Tensor { dimensions, .. } => dimensions.clone(),
        _ => Vec::new(),
    }
}

fn backend_error(e: ort::Error) -> EngineError {
    EngineError::Backend(e.to_string())
}

impl InferenceEngine for OnnxEngine {
    type Tensor = OnnxTensor;

    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    fn input_tensor(
        &self,
        shape: [usize; 2],
        data: &[i64],
    ) -> std::result::Result<OnnxTensor, EngineError> {
        if shape[0] * shape[1] != data.len() {
            return Err(EngineError::Shape {
                shape: shape.to_vec(),
                len: data.len(),
            });
        }
        let tensor = Tensor::from_array((shape.to_vec(), data.to_vec())).map_err(backend_error)?;
        Ok(OnnxTensor::Input(tensor))
    }

    fn output_tensor(&self, shape: [usize; 3]) -> std::result::Result<OnnxTensor, EngineError> {
        let buffer = Tensor::<f32>::new(&Allocator::default(), shape).map_err(backend_error)?;
        Ok(OnnxTensor::Output {
            shape,
            buffer: Some(buffer),
            data: Vec::new(),
        })
    }

    /// Runs the session computing only `output`, written into its
    /// preallocated buffer.
    fn run(
        &self,
        inputs: &[(&str, &OnnxTensor)],
        output: (&str, &mut OnnxTensor),
    ) -> std::result::Result<(), EngineError> {
        let bound = inputs
            .iter()
            .map(|(name, tensor)| match tensor {
                OnnxTensor::Input(value) => {
                    Ok((Cow::Borrowed(*name), SessionInputValue::from(value.view())))
                }
                OnnxTensor::Output { .. } => Err(EngineError::UnknownTensor),
            })
            .collect::<std::result::Result<Vec<_>, EngineError>>()?;

        let (output_name, output_tensor) = output;
        let (shape, buffer, data) = match output_tensor {
            OnnxTensor::Output {
                shape,
                buffer,
                data,
            } => (*shape, buffer, data),
            OnnxTensor::Input(_) => return Err(EngineError::UnknownTensor),
        };
        let buffer = buffer.take().ok_or(EngineError::UnknownTensor)?;

        let selector = OutputSelector::no_default()
            .with(output_name)
            .preallocate(output_name, buffer);
        let options = RunOptions::new().map_err(backend_error)?.with_outputs(selector);

        let outputs = self
            .session
            .run_with_options(SessionInputs::from(bound), &options)
            .map_err(backend_error)?;
        let value = outputs.get(output_name).ok_or_else(|| {
            EngineError::Backend(format!("model produced no output `{}`", output_name))
        })?;
        let (actual_shape, values) = value.try_extract_raw_tensor::<f32>().map_err(backend_error)?;

        let expected: Vec<i64> = shape.iter().map(|&d| d as i64).collect();
        if actual_shape != expected {
            return Err(EngineError::Backend(format!(
                "output `{}` has shape {:?}, expected {:?}",
                output_name, actual_shape, expected
            )));
        }
        data.clear();
        data.extend_from_slice(values);
        Ok(())
    }

    fn output_data(&self, tensor: &mut OnnxTensor) -> std::result::Result<Vec<f32>, EngineError> {
        match tensor {
            OnnxTensor::Output { data, .. } => Ok(std::mem::take(data)),
            OnnxTensor::Input(_) => Err(EngineError::UnknownTensor),
        }
    }

    fn release(&self, tensor: OnnxTensor) -> std::result::Result<(), EngineError> {
        // ort frees the native value on drop
        drop(tensor);
        Ok(())
    }
}
