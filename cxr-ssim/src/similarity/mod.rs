//! 稳健的成对相似度评分.
//!
//! 任意尺寸, 任意取值范围的两张图像先统一缩放到比较分辨率 ([`SSIM_SIZE`]),
//! 再转换到 `[0, 1]`: 只有当图像最大值超过 1 时才除以 255, 以兼容已经归一化的输入.
//! 随后以取值范围 1.0 计算 SSIM.
//!
//! 结果为非有限值, 或任一输入无法处理时, 评分为 `None` 而不是错误.
//! 在全对比较中, 单个退化的图像对不能影响其余成千上万次比较.

mod ssim;

pub use ssim::{ssim, structural_similarity, WindowStats};

use crate::consts::gray::MAX_F32;
use crate::consts::{SSIM_DATA_RANGE, SSIM_SIZE};
use crate::{resize_area, Idx2d, SegmentedImage};
use ndarray::{Array2, ArrayView2};

/// 一次比较的相似度. `None` 代表 "未定义", 永远不会以 `NaN` 的形式参与均值计算.
pub type SimilarityScore = Option<f64>;

/// 已归一化到比较分辨率的图像, 可以与任意多个其它图像反复比较.
#[derive(Clone, Debug)]
pub struct Normalized(WindowStats);

/// 将 `img` 缩放到 `size` 并归一化到 `[0, 1]`.
///
/// 图像为空时返回 `None`. `NaN` 像素会原样保留, 最终使评分为 `None`.
pub fn normalize(img: ArrayView2<f32>, size: Idx2d) -> Option<Array2<f32>> {
    let mut resized = resize_area(img, size)?;
    let max = resized.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max > 1.0 {
        resized /= MAX_F32;
    }
    resized.mapv_inplace(|v| v.clamp(0.0, 1.0));
    Some(resized)
}

/// SSIM 评分器.
#[derive(Copy, Clone, Debug)]
pub struct Scorer {
    size: Idx2d,
    data_range: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(SSIM_SIZE)
    }
}

impl Scorer {
    /// 以比较分辨率 `size` 初始化. 取值范围固定为 [`SSIM_DATA_RANGE`].
    #[inline]
    pub fn new(size: Idx2d) -> Self {
        Self {
            size,
            data_range: SSIM_DATA_RANGE,
        }
    }

    /// 比较分辨率 (高, 宽).
    #[inline]
    pub fn size(&self) -> Idx2d {
        self.size
    }

    /// 归一化一张图像. 失败时记录调试日志并返回 `None`.
    pub fn prepare(&self, img: ArrayView2<f32>) -> Option<Normalized> {
        match normalize(img, self.size) {
            Some(n) => Some(Normalized(WindowStats::new(n.mapv(f64::from)))),
            None => {
                log::debug!("Cannot normalize image of shape {:?}", img.dim());
                None
            }
        }
    }

    /// 归一化一张分割后图像.
    #[inline]
    pub fn prepare_segmented(&self, img: &SegmentedImage) -> Option<Normalized> {
        self.prepare(img.to_f32().view())
    }

    /// 比较两张已归一化图像.
    pub fn score_prepared(&self, a: &Normalized, b: &Normalized) -> SimilarityScore {
        let value = ssim(&a.0, &b.0, self.data_range);
        if value.is_finite() {
            Some(value)
        } else {
            log::warn!("Non-finite SSIM detected");
            None
        }
    }

    /// 比较两张任意尺寸, 任意取值范围的图像.
    pub fn score(&self, a: ArrayView2<f32>, b: ArrayView2<f32>) -> SimilarityScore {
        let a = self.prepare(a)?;
        let b = self.prepare(b)?;
        self.score_prepared(&a, &b)
    }

    /// 比较两张分割后图像.
    #[inline]
    pub fn score_segmented(&self, a: &SegmentedImage, b: &SegmentedImage) -> SimilarityScore {
        self.score(a.to_f32().view(), b.to_f32().view())
    }
}
