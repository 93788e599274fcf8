//! 从环境变量读取运行配置.
//!
//! 每个路径都可以由一个环境变量覆盖; 变量未设置或为空时,
//! 使用 `$HOME/dataset/cxr` 下的默认位置.

use cxr_ssim::consts::BATCH_SIZE;
use cxr_ssim::dataset::{self, DISEASED_DIR_NAME, HEALTHY_DIR_NAME, UNKNOWN_DIR_NAME};
use cxr_ssim::pipeline::PipelineConfig;
use log::LevelFilter;
use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// 数据集根目录相对于 `$HOME/dataset` 的位置.
const DATASET_ROOT: &str = "cxr";

/// 默认模型文件名.
const MODEL_FILE_NAME: &str = "model.onnx";

/// 读取非空的环境变量.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// 获取数据集根目录.
///
/// 1. 若环境变量 `$CXR_DATASET_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/cxr`;
/// 3. 无法确定用户主目录时, 返回当前目录下的 `dataset/cxr`.
pub fn dataset_root() -> PathBuf {
    if let Some(d) = non_empty_var("CXR_DATASET_DIR") {
        return PathBuf::from(d);
    }
    dataset::home_dataset_dir_with([DATASET_ROOT])
        .unwrap_or_else(|| PathBuf::from("dataset").join(DATASET_ROOT))
}

/// 若环境变量 `key` 非空, 则返回其值; 否则返回数据集根目录下的 `leaf`.
fn path_from_env_or_root(key: &str, leaf: &str) -> PathBuf {
    match non_empty_var(key) {
        Some(d) => PathBuf::from(d),
        None => dataset_root().join(leaf),
    }
}

/// 健康参考图像目录 (`$CXR_HEALTHY_DIR`).
pub fn healthy_dir() -> PathBuf {
    path_from_env_or_root("CXR_HEALTHY_DIR", HEALTHY_DIR_NAME)
}

/// 患病参考图像目录 (`$CXR_DISEASED_DIR`).
pub fn diseased_dir() -> PathBuf {
    path_from_env_or_root("CXR_DISEASED_DIR", DISEASED_DIR_NAME)
}

/// 未知图像目录 (`$CXR_UNKNOWN_DIR`).
pub fn unknown_dir() -> PathBuf {
    path_from_env_or_root("CXR_UNKNOWN_DIR", UNKNOWN_DIR_NAME)
}

/// 输出目录 (`$CXR_OUTPUT_DIR`).
pub fn output_dir() -> PathBuf {
    path_from_env_or_root("CXR_OUTPUT_DIR", "output")
}

/// 分割模型文件 (`$CXR_MODEL_PATH`).
pub fn model_path() -> PathBuf {
    path_from_env_or_root("CXR_MODEL_PATH", MODEL_FILE_NAME)
}

/// 解析布尔开关. 无法识别的值返回 `None`.
fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// 读取布尔开关 `key`, 未设置或无法识别时返回 `default`.
pub fn flag_from_env(key: &str, default: bool) -> bool {
    match non_empty_var(key) {
        None => default,
        Some(v) => parse_flag(&v).unwrap_or_else(|| {
            log::warn!("Ignoring unrecognized value `{v}` of `{key}`");
            default
        }),
    }
}

/// 模型子批次大小 (`$CXR_BATCH_SIZE`), 默认为 [`BATCH_SIZE`].
pub fn batch_size() -> NonZeroUsize {
    let default = NonZeroUsize::new(BATCH_SIZE).unwrap_or(NonZeroUsize::MIN);
    match non_empty_var("CXR_BATCH_SIZE") {
        None => default,
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid batch size `{v}`");
            default
        }),
    }
}

/// 日志级别 (`$CXR_LOG`), 默认为 `info`.
pub fn log_level() -> LevelFilter {
    non_empty_var("CXR_LOG")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// 从环境变量构建完整的编排器配置.
pub fn config_from_env() -> PipelineConfig {
    PipelineConfig {
        healthy_dir: healthy_dir(),
        diseased_dir: diseased_dir(),
        unknown_dir: unknown_dir(),
        output_dir: output_dir(),
        save_segmented: flag_from_env("CXR_SAVE_SEGMENTED", true),
        batched: !flag_from_env("CXR_NO_BATCH", false),
        progress: true,
        ..PipelineConfig::default()
    }
}
