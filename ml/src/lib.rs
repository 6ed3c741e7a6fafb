#![recursion_limit = "256"]

pub mod artifacts;
pub mod dataset;
pub mod export;
pub mod model;
pub mod training;

pub use artifacts::{ImageSet, LabelSet};
pub use dataset::{CLASS_NAMES, FashionBatch, FashionBatcher, FashionDataset, FashionSample};
pub use export::{ModelMeta, load_export, load_export_for_training, save_export};
pub use model::FashionNet;
pub use training::{InferenceBackend, TrainBackend, TrainConfig, TrainStats, to_inference};
