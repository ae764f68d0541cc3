//! Network execution behind a narrow interface.
//!
//! The endpoint only ever calls [`Network::forward`], so the ONNX Runtime
//! session can be swapped for a worker pool or a test double without touching
//! the HTTP layer.

use crate::config::InferenceDevice;
use crate::error::{Error, Result};
use crate::inference::preprocess::ImageTensor;
use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
use ort::session::Session;
use ort::session::builder::SessionBuilder;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Compute device a loaded network actually runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveDevice {
    /// General-purpose processor.
    Cpu,
    /// NVIDIA accelerator via CUDA.
    Cuda,
}

impl std::fmt::Display for ActiveDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "CPU"),
            Self::Cuda => write!(f, "CUDA"),
        }
    }
}

/// A ready-to-run classification network.
///
/// Implementations must not mutate model state during `forward`; a loaded
/// network is shared by all concurrent requests.
pub trait Network: Send + Sync {
    /// Run one forward pass and return the raw class logits.
    fn forward(&self, input: &ImageTensor) -> Result<Vec<f32>>;

    /// Device the network runs on.
    fn device(&self) -> ActiveDevice;
}

/// Builds networks from persisted weights.
pub trait NetworkLoader: Send + Sync {
    /// Load the weights file onto the requested device in inference mode.
    fn load(&self, weights: &Path, device: InferenceDevice) -> Result<Box<dyn Network>>;
}

/// Loader for ONNX models executed by ONNX Runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxLoader;

impl NetworkLoader for OnnxLoader {
    fn load(&self, weights: &Path, device: InferenceDevice) -> Result<Box<dyn Network>> {
        let mut builder = Session::builder().map_err(|e| Error::SessionBuild {
            reason: format!("failed to create session builder: {e}"),
        })?;

        let active = register_device(&mut builder, device);

        let session = builder
            .commit_from_file(weights)
            .map_err(|e| Error::SessionBuild {
                reason: format!("failed to load ONNX model '{}': {e}", weights.display()),
            })?;

        debug!("ONNX session created for {}", weights.display());

        Ok(Box::new(OnnxNetwork {
            session: Mutex::new(session),
            device: active,
        }))
    }
}

/// Register an accelerator according to the device setting.
///
/// Falls back to CPU whenever CUDA is missing or refuses to register.
fn register_device(builder: &mut SessionBuilder, device: InferenceDevice) -> ActiveDevice {
    if device == InferenceDevice::Cpu {
        info!("Requested device: CPU");
        return ActiveDevice::Cpu;
    }

    let cuda = CUDAExecutionProvider::default();
    if !cuda.is_available().unwrap_or(false) {
        if device == InferenceDevice::Gpu {
            warn!("GPU requested but CUDA is not available, using CPU");
        } else {
            info!("Auto mode: no GPU provider available, using CPU");
        }
        return ActiveDevice::Cpu;
    }

    match cuda.register(builder) {
        Ok(()) => {
            info!("Using CUDA execution provider");
            ActiveDevice::Cuda
        }
        Err(e) => {
            warn!("Failed to register CUDA execution provider, using CPU: {e}");
            ActiveDevice::Cpu
        }
    }
}

/// ONNX Runtime session wrapper.
pub struct OnnxNetwork {
    // Session::run needs exclusive access; the lock serializes passes but the
    // weights themselves are never modified.
    session: Mutex<Session>,
    device: ActiveDevice,
}

impl Network for OnnxNetwork {
    fn forward(&self, input: &ImageTensor) -> Result<Vec<f32>> {
        let tensor =
            Tensor::from_array((input.shape(), input.data().to_vec())).map_err(|e| {
                Error::Inference {
                    reason: format!("failed to create input tensor: {e}"),
                }
            })?;

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: "session lock poisoned".to_string(),
        })?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference {
                reason: format!("failed to extract logits: {e}"),
            })?;

        let logits = logits.to_vec();
        Ok(logits)
    }

    fn device(&self) -> ActiveDevice {
        self.device
    }
}
