#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 对胸部 X 光片进行肺部分割, 并通过与两组参考图像 (健康/患病)
//! 的平均结构相似度 (SSIM) 对未知图像进行分类.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 面向 **离线批处理**: 参考池在分类开始之前完整构建, 此后只读.
//! 2. 单张图像的失败 (无法解码, SSIM 非有限值, 分类中途 panic) 不会中断整批任务,
//!   而是被记录为日志并降级为哨兵值 (跳过 / `None` / [`Label::Error`]).
//! 3. 只有编排器 ([`pipeline`]) 会返回致命错误. 是否终止进程由调用方决定.
//!
//! # 开发计划
//!
//! ### 图像加载 ✅
//!
//! 按扩展名白名单读取目录下的图像并转为单通道 8-bit 灰度. 解码失败的文件只记录日志.
//!
//! 实现位于 `cxr-ssim/src/dataset`.
//!
//! ### 肺部分割 ✅
//!
//! 以 `N x 256 x 256 x 1` 的批次调用预训练二值分割模型, 阈值 0.5 得到掩码.
//! 模型调用失败时整个子批次退化为全零图像.
//!
//! 实现位于 `cxr-ssim/src/segment`. ONNX Runtime 后端需要 `onnx` feature.
//!
//! ### 结构相似度 ✅
//!
//! 两图统一缩放到 224 x 224, 归一化到 `[0, 1]`, 使用 7 x 7 均值窗口计算 SSIM.
//!
//! 实现位于 `cxr-ssim/src/similarity`.
//!
//! ### 分类与置信度 ✅
//!
//! 平均相似度较高者胜出, **平局判为患病**. 置信度为两个平均值之差.
//!
//! 实现位于 `cxr-ssim/src/classify`.
//!
//! ### 报告与统计 ✅
//!
//! 逐行写入并刷新 CSV 报告, 统计各类别数量、置信度均值/中位数、各参考池平均相似度.
//!
//! 实现位于 `cxr-ssim/src/report`.
//!
//! ### 批处理编排 ✅
//!
//! 实现位于 `cxr-ssim/src/pipeline`.

/// 二维索引 (高, 宽), 同时也用作图像分辨率.
pub type Idx2d = (usize, usize);

/// 图像, 掩码等基础数据结构.
mod data;

pub use data::{
    resize_area, resize_area_u8, ImageId, ImgWriteRaw, RawImage, SegmentationMask, SegmentedImage,
};

pub mod consts;

pub mod error;

pub mod dataset;

pub mod segment;

pub mod similarity;

pub mod classify;

pub mod report;

pub mod pipeline;

pub mod prelude;

mod progress;

pub use classify::Label;
