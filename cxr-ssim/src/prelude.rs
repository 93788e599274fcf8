//! 🫁欢迎光临🩻
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::{ImageId, ImgWriteRaw, RawImage, SegmentationMask, SegmentedImage};

pub use crate::consts::{BATCH_SIZE, MASK_THRESHOLD, SEG_SIZE, SSIM_SIZE};

pub use crate::dataset::{self, load_dir};

pub use crate::segment::{SegmentationModel, Segmenter};

#[cfg(feature = "onnx")]
pub use crate::segment::OnnxModel;

pub use crate::similarity::{Scorer, SimilarityScore};

pub use crate::classify::{decide, Class, ClassificationResult, Classifier, Label, ReferencePool};

pub use crate::report::{ReportWriter, Summary};

pub use crate::pipeline::{Pipeline, PipelineConfig, RunOutcome};

pub use crate::error::{LoadModelError, PredictError, RunError};
