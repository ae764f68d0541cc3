//! Process-wide model handle with lazy, retrying, single-flight loading.

use crate::config::{InferenceDevice, ModelConfig};
use crate::constants::confidence;
use crate::error::{Error, Result};
use crate::inference::labels::LabelMapping;
use crate::inference::network::{ActiveDevice, Network, NetworkLoader, OnnxLoader};
use crate::inference::preprocess::{ImageTensor, Preprocessor};
use crate::inference::scores::{softmax, top_class};
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Everything needed to build a model handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    /// Path to the weights file.
    pub model_path: PathBuf,
    /// Path to the label mapping file.
    pub mapping_path: PathBuf,
    /// Square input edge length.
    pub image_size: u32,
    /// Requested compute device.
    pub device: InferenceDevice,
}

impl From<&ModelConfig> for LoadSettings {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model_path: config.path.clone(),
            mapping_path: config.mapping.clone(),
            image_size: config.image_size,
            device: config.device,
        }
    }
}

/// Top-1 result of a single forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Winning class name.
    pub label: String,
    /// Winning class index.
    pub index: usize,
    /// Softmax probability of the winning class, in `[0, 1]`.
    pub probability: f32,
}

impl Classification {
    /// Probability expressed as a percentage in `[0, 100]`.
    pub fn confidence_percent(&self) -> f32 {
        (self.probability * 100.0).clamp(confidence::MIN, confidence::MAX)
    }
}

/// A fully initialized network plus its label mapping.
pub struct ModelHandle {
    network: Box<dyn Network>,
    labels: LabelMapping,
    preprocessor: Preprocessor,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("classes", &self.labels.len())
            .field("device", &self.network.device())
            .field("image_size", &self.preprocessor.size())
            .finish_non_exhaustive()
    }
}

impl ModelHandle {
    /// Label mapping the network was trained with.
    pub fn labels(&self) -> &LabelMapping {
        &self.labels
    }

    /// Device the network runs on.
    pub fn device(&self) -> ActiveDevice {
        self.network.device()
    }

    /// Run one forward pass and pick the most probable class.
    pub fn classify(&self, input: &ImageTensor) -> Result<Classification> {
        let logits = self.network.forward(input)?;
        check_logits(&logits, self.labels.len())?;

        let probabilities = softmax(&logits);
        let (index, probability) = top_class(&probabilities).ok_or_else(|| Error::Inference {
            reason: "network produced no logits".to_string(),
        })?;

        let label = self
            .labels
            .name(index)
            .ok_or_else(|| Error::Inference {
                reason: format!("class index {index} has no label"),
            })?
            .to_string();

        Ok(Classification {
            label,
            index,
            probability,
        })
    }

    /// Preprocess and classify an already decoded image.
    pub fn classify_image(&self, image: &DynamicImage) -> Result<Classification> {
        let input = self.preprocessor.process(image);
        self.classify(&input)
    }
}

fn check_logits(logits: &[f32], expected: usize) -> Result<()> {
    if logits.len() != expected {
        return Err(Error::OutputWidthMismatch {
            expected,
            actual: logits.len(),
        });
    }
    if logits.iter().any(|l| !l.is_finite()) {
        return Err(Error::Inference {
            reason: "network produced non-finite logits".to_string(),
        });
    }
    Ok(())
}

/// Build a model handle from disk.
///
/// Checks both artifact files before touching the runtime, then runs a
/// warm-up pass so a handle is only ever returned fully usable.
pub fn load_handle(settings: &LoadSettings, loader: &dyn NetworkLoader) -> Result<ModelHandle> {
    if !settings.mapping_path.exists() {
        return Err(Error::MappingFileNotFound {
            path: settings.mapping_path.clone(),
        });
    }
    if !settings.model_path.exists() {
        return Err(Error::ModelFileNotFound {
            path: settings.model_path.clone(),
        });
    }

    let labels = LabelMapping::load(&settings.mapping_path)?;
    debug!("Label mapping loaded: {} classes", labels.len());

    let network = loader.load(&settings.model_path, settings.device)?;

    // The output layer must be exactly as wide as the label mapping, and the
    // network must accept the configured input size.
    let logits = network.forward(&ImageTensor::zeros(settings.image_size))?;
    check_logits(&logits, labels.len())?;

    info!(
        "Model loaded: {} classes, device: {}, input: {}x{}",
        labels.len(),
        network.device(),
        settings.image_size,
        settings.image_size
    );

    Ok(ModelHandle {
        network,
        labels,
        preprocessor: Preprocessor::new(settings.image_size),
    })
}

/// Single-assignment cache for the process-wide model handle.
///
/// The handle moves from absent to loaded exactly once. Concurrent first
/// callers share one load; a failed load leaves the slot empty so the next
/// caller retries.
pub struct ModelStore {
    settings: LoadSettings,
    loader: Arc<dyn NetworkLoader>,
    slot: OnceCell<Arc<ModelHandle>>,
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelStore")
            .field("settings", &self.settings)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl ModelStore {
    /// Create an empty store that loads through `loader`.
    pub fn new(settings: LoadSettings, loader: Arc<dyn NetworkLoader>) -> Self {
        Self {
            settings,
            loader,
            slot: OnceCell::new(),
        }
    }

    /// Create an empty store backed by ONNX Runtime.
    pub fn onnx(settings: LoadSettings) -> Self {
        Self::new(settings, Arc::new(OnnxLoader))
    }

    /// Whether a handle is present. Never triggers a load.
    pub fn is_loaded(&self) -> bool {
        self.slot.initialized()
    }

    /// Load the model unless already loaded, returning the load error.
    pub async fn try_load(&self) -> Result<Arc<ModelHandle>> {
        let handle = self
            .slot
            .get_or_try_init(|| {
                let settings = self.settings.clone();
                let loader = Arc::clone(&self.loader);
                async move {
                    tokio::task::spawn_blocking(move || load_handle(&settings, loader.as_ref()))
                        .await
                        .map_err(|e| Error::Internal {
                            message: format!("model load task failed: {e}"),
                        })?
                        .map(Arc::new)
                }
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    /// Load the model unless already loaded.
    ///
    /// Failures are logged and contained: the result is `None` and the
    /// next call tries again.
    pub async fn ensure_loaded(&self) -> Option<Arc<ModelHandle>> {
        match self.try_load().await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Could not load model: {e}");
                None
            }
        }
    }
}
