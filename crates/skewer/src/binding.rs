//! # Model Binding
//!
//! Maps the inputs a model declares onto the tensors a [`PipelineBatch`]
//! carries. The set of recognized inputs is closed: every entry of
//! [`ROLE_TABLE`] names one declared input and the batch tensor bound to it.
//! Supporting another input is one more table entry.

use log::warn;

use crate::backend::{InferenceEngine, TensorInfo};
use crate::batch::PipelineBatch;
use crate::error::{PipelineError, Result};

/// A recognized model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputRole {
    InputIds,
    TokenTypeIds,
    AttentionMask,
}

/// One row of the role table.
pub struct RoleEntry {
    pub name: &'static str,
    pub role: InputRole,
    pub tensor: fn(&PipelineBatch) -> &[i64],
}

pub static ROLE_TABLE: [RoleEntry; 3] = [
    RoleEntry {
        name: "input_ids",
        role: InputRole::InputIds,
        tensor: PipelineBatch::ids_tensor,
    },
    RoleEntry {
        name: "token_type_ids",
        role: InputRole::TokenTypeIds,
        tensor: PipelineBatch::type_ids_tensor,
    },
    RoleEntry {
        name: "attention_mask",
        role: InputRole::AttentionMask,
        tensor: PipelineBatch::attention_mask_tensor,
    },
];

impl InputRole {
    fn entry(self) -> &'static RoleEntry {
        match self {
            InputRole::InputIds => &ROLE_TABLE[0],
            InputRole::TokenTypeIds => &ROLE_TABLE[1],
            InputRole::AttentionMask => &ROLE_TABLE[2],
        }
    }

    /// The role for a declared input name, if it is recognized.
    pub fn from_name(name: &str) -> Option<Self> {
        ROLE_TABLE.iter().find(|entry| entry.name == name).map(|entry| entry.role)
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// The batch tensor bound to this role.
    pub fn tensor(self, batch: &PipelineBatch) -> &[i64] {
        (self.entry().tensor)(batch)
    }
}

/// Declared inputs/outputs of a loaded model and the output width.
///
/// Immutable once built. `has_token_type_ids` and `has_attention_mask`
/// decide whether batch construction fills those tensors or leaves them as
/// zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBinding {
    input_names: Vec<String>,
    output_names: Vec<String>,
    output_dim: usize,
    has_token_type_ids: bool,
    has_attention_mask: bool,
}

impl ModelBinding {
    /// Build a binding, rejecting any input outside the role table.
    pub fn new(
        input_names: Vec<String>,
        output_names: Vec<String>,
        output_dim: usize,
    ) -> Result<Self> {
        if let Some(name) = input_names.iter().find(|name| InputRole::from_name(name).is_none()) {
            return Err(PipelineError::Load(format!("unsupported model input `{}`", name)));
        }
        if output_names.is_empty() {
            return Err(PipelineError::Load("model declares no outputs".to_string()));
        }
        if output_dim == 0 {
            return Err(PipelineError::Load("output dimension must be positive".to_string()));
        }
        Ok(Self::unchecked(input_names, output_names, output_dim))
    }

    /// Build a binding from what an engine declares.
    ///
    /// The output width is `output_dim` when given, else the third dimension
    /// of the first declared output.
    pub fn from_engine<E: InferenceEngine + ?Sized>(
        engine: &E,
        output_dim: Option<usize>,
    ) -> Result<Self> {
        let first_output = engine
            .outputs()
            .first()
            .ok_or_else(|| PipelineError::Load("model declares no outputs".to_string()))?;
        if engine.outputs().len() > 1 {
            warn!(
                "Model declares {} outputs, binding only `{}`",
                engine.outputs().len(),
                first_output.name
            );
        }

        let output_dim = output_dim.or_else(|| first_output.fixed_dim(2)).ok_or_else(|| {
            PipelineError::Load(format!(
                "cannot resolve output dimension of `{}` from {:?}; set output_dim",
                first_output.name, first_output.dimensions
            ))
        })?;

        let names = |infos: &[TensorInfo]| -> Vec<String> {
            infos.iter().map(|info| info.name.clone()).collect()
        };
        Self::new(names(engine.inputs()), names(engine.outputs()), output_dim)
    }

    pub(crate) fn unchecked(
        input_names: Vec<String>,
        output_names: Vec<String>,
        output_dim: usize,
    ) -> Self {
        let declares = |role: InputRole| input_names.iter().any(|name| name == role.name());
        Self {
            has_token_type_ids: declares(InputRole::TokenTypeIds),
            has_attention_mask: declares(InputRole::AttentionMask),
            input_names,
            output_names,
            output_dim,
        }
    }

    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    /// The output the pipeline binds its output tensor to.
    pub fn output_name(&self) -> &str {
        self.output_names.first().map_or("", String::as_str)
    }

    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn has_token_type_ids(&self) -> bool {
        self.has_token_type_ids
    }

    pub fn has_attention_mask(&self) -> bool {
        self.has_attention_mask
    }
}
