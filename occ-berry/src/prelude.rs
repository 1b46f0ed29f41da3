//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::data::{GridIter, Image, MaskedImage, Window};

pub use crate::config::{Device, SweepSpec, TrailingBatch};
pub use crate::error::{OcclusionError, OcclusionResult};

pub use crate::heatmap::{FinalizedHeatMaps, HeatMap, SampleResult};
pub use crate::infer::{FeatureMap, InferenceAdapter, Probabilities, TinyNet};
pub use crate::labels::{true_label_from_path, LabelTable, Legend};
pub use crate::sampler::{sample_inner, Batch, WindowSampler};
pub use crate::sweep::{run_sweep, SweepOutcome};

pub use crate::dataset::home_dataset_dir_with;
