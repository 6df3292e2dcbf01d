//! Safetensors weight loading and the lazy model handle.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use once_cell::sync::OnceCell;
use safetensors::SafeTensors;
use tracing::debug;

/// A model handle that defers weight loading until first use.
///
/// Constructed once at startup and shared; the inner model is built at most
/// once and never mutated, so concurrent grading requests can run inference
/// against the same handle.
pub struct LazyModel<T> {
    path: std::path::PathBuf,
    device: Device,
    builder: fn(VarBuilder) -> Result<T>,
    model: OnceCell<T>,
}

impl<T: Send + Sync> LazyModel<T> {
    /// Creates a lazy handle; nothing is read until [`Self::get`].
    #[must_use]
    pub fn new(
        path: impl AsRef<Path>,
        device: Device,
        builder: fn(VarBuilder) -> Result<T>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            device,
            builder,
            model: OnceCell::new(),
        }
    }

    /// Returns the model, loading weights on the first call.
    ///
    /// # Errors
    ///
    /// Returns an error if the weight file cannot be read or parsed, or the
    /// model builder rejects the tensors.
    pub fn get(&self) -> Result<&T> {
        self.model.get_or_try_init(|| {
            debug!("loading glyph model from {}", self.path.display());
            let vb = load_safetensors(&self.path, &self.device)?;
            (self.builder)(vb)
        })
    }

    /// True once the weights have been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}

/// Reads a safetensors file into a `VarBuilder` on `device`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the tensor data is invalid.
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read model file: {}", path.display()))?;

    let tensors = SafeTensors::deserialize(&data)
        .with_context(|| format!("failed to parse safetensors: {}", path.display()))?;

    let mut tensor_map: HashMap<String, Tensor> = HashMap::new();
    for name in tensors.names() {
        let view = tensors
            .tensor(name)
            .with_context(|| format!("failed to get tensor '{name}'"))?;
        let dtype = to_candle_dtype(view.dtype())?;
        let shape: Vec<usize> = view.shape().to_vec();
        let tensor = Tensor::from_raw_buffer(view.data(), dtype, &shape, device)
            .with_context(|| format!("failed to create tensor '{name}'"))?;
        tensor_map.insert(name.clone(), tensor);
    }

    Ok(VarBuilder::from_tensors(tensor_map, DType::F32, device))
}

fn to_candle_dtype(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;
    match dtype {
        S::F32 => Ok(DType::F32),
        S::F64 => Ok(DType::F64),
        S::F16 => Ok(DType::F16),
        S::BF16 => Ok(DType::BF16),
        S::I64 => Ok(DType::I64),
        S::U8 => Ok(DType::U8),
        S::U32 => Ok(DType::U32),
        other => anyhow::bail!("unsupported safetensors dtype: {other:?}"),
    }
}
