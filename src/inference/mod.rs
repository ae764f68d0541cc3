//! Inference core: label mapping, preprocessing, network execution and the
//! process-wide model handle.

pub mod labels;
pub mod network;
pub mod preprocess;
pub mod scores;
mod store;

pub use labels::LabelMapping;
pub use network::{ActiveDevice, Network, NetworkLoader, OnnxLoader};
pub use preprocess::{ImageTensor, Preprocessor};
pub use store::{Classification, LoadSettings, ModelHandle, ModelStore, load_handle};

#[cfg(test)]
pub(crate) use store::tests as test_support;
