pub mod pipeline;
pub mod types;

pub use pipeline::ClassifyPipeline;
pub use types::{ClassifyOptions, ClassifyResult, ConfidenceBand, ModelInfo, Prediction};
