//! 运行时错误.
//!
//! 只有 [`LoadModelError`] 和 [`RunError`] 属于致命错误. [`PredictError`]
//! 永远不会越过分割引擎, 它只会触发子批次的全零退化.

use std::path::PathBuf;
use thiserror::Error;

/// 加载分割模型时的错误.
#[derive(Debug, Error)]
pub enum LoadModelError {
    /// 模型文件不存在.
    #[error("segmentation model not found: {}", .0.display())]
    NotFound(PathBuf),

    /// 推理后端无法从模型文件构建会话.
    #[error("failed to load segmentation model {}: {reason}", path.display())]
    Backend {
        /// 模型文件路径.
        path: PathBuf,
        /// 后端给出的原因.
        reason: String,
    },
}

/// 一次模型调用 (一个子批次) 失败.
#[derive(Debug, Error)]
pub enum PredictError {
    /// 推理后端报告错误 (如资源耗尽).
    #[error("inference backend failed: {0}")]
    Backend(String),

    /// 模型输出的张量形状与输入不符.
    ///
    /// 第一个参数是期望的形状 `N x H x W x 1`, 第二个参数是实际的形状.
    #[error("unexpected output shape: expected {0:?}, got {1:?}")]
    Shape([usize; 4], Vec<usize>),
}

/// 批处理编排的致命错误.
#[derive(Debug, Error)]
pub enum RunError {
    /// 健康与患病参考池均为空, 没有任何可比较的对象.
    #[error("no reference images were loaded for either class")]
    NoReferences,

    /// 没有可以分类的未知图像.
    #[error("no unknown images to classify in {}", .0.display())]
    NoUnknowns(PathBuf),

    /// 创建输出目录等底层 I/O 错误.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// 出错的路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },

    /// 写入 CSV 报告错误.
    #[error("failed to write report: {0}")]
    Report(#[from] csv::Error),
}
