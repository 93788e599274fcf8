//! 程序运行函数.

use crate::result::ClassifyResult;
use cxr_ssim::error::{LoadModelError, RunError};
use cxr_ssim::pipeline::Pipeline;
use cxr_ssim::segment::{OnnxModel, Segmenter};
use thiserror::Error;
use utils::loader;

/// 运行失败的原因. 两者都是致命的.
#[derive(Debug, Error)]
pub enum Fatal {
    #[error("Cannot load segmentation model: {0}")]
    Model(#[from] LoadModelError),

    #[error("Classification aborted: {0}")]
    Run(#[from] RunError),
}

/// 实际运行.
pub fn run() -> Result<ClassifyResult, Fatal> {
    let config = loader::config_from_env();
    let model_path = loader::model_path();
    println!("Healthy references : {}", config.healthy_dir.display());
    println!("Diseased references: {}", config.diseased_dir.display());
    println!("Unknown images     : {}", config.unknown_dir.display());
    println!("Output directory   : {}", config.output_dir.display());
    println!("Model              : {}", model_path.display());

    let model = OnnxModel::open(&model_path)?;
    let segmenter = Segmenter::new(model)
        .with_batch_size(loader::batch_size())
        .with_progress(config.progress);
    log::info!(
        "Segmentation: {} (sub-batch size {})",
        if config.batched { "batched" } else { "one image per call" },
        segmenter.batch_size()
    );

    let outcome = Pipeline::new(config, segmenter).run()?;
    Ok(ClassifyResult::new(outcome))
}
