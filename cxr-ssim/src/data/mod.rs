//! 灰度图像, 分割掩码与分割后图像.
//!
//! 所有二维数据均以 `(高, 宽)` 行优先方式存储, 与 `image` crate 的 `(x, y)`
//! 约定相反. 转换只发生在 I/O 边界 (加载与保存).

mod resize;
mod save;

pub use resize::{resize_area, resize_area_u8};
pub use save::ImgWriteRaw;

use crate::consts::gray::{BLACK, MAX_F32};
use crate::Idx2d;
use ndarray::{Array2, ArrayView2, Zip};
use std::fmt;

/// 图像标识: 文件名与其所在的源目录名.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageId {
    name: String,
    folder: String,
}

impl ImageId {
    /// 直接初始化.
    pub fn new(name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
        }
    }

    /// 文件名 (含扩展名). 报告中的 `imagem` 列即为此值.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 源目录名 (不含上级路径).
    #[inline]
    pub fn folder(&self) -> &str {
        &self.folder
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder, self.name)
    }
}

/// 从磁盘读取的原始单通道 8-bit 图像. 读取后不可变.
#[derive(Clone, Debug)]
pub struct RawImage {
    id: ImageId,
    data: Array2<u8>,
}

impl RawImage {
    /// 直接初始化.
    #[inline]
    pub fn new(id: ImageId, data: Array2<u8>) -> Self {
        Self { id, data }
    }

    /// 图像标识.
    #[inline]
    pub fn id(&self) -> &ImageId {
        &self.id
    }

    /// 像素数据的只读视图.
    #[inline]
    pub fn data(&self) -> ArrayView2<u8> {
        self.data.view()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }
}

/// 二值肺部掩码, 分辨率与分割模型一致.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentationMask {
    data: Array2<bool>,
}

impl SegmentationMask {
    /// 将模型输出的概率图以 `threshold` 二值化. 概率 **严格大于** 阈值的像素属于掩码.
    ///
    /// `NaN` 概率永远不属于掩码.
    pub fn from_probabilities(probs: ArrayView2<f32>, threshold: f32) -> Self {
        Self {
            data: probs.mapv(|p| p > threshold),
        }
    }

    /// 全空掩码.
    pub fn empty(shape: Idx2d) -> Self {
        Self {
            data: Array2::from_elem(shape, false),
        }
    }

    /// 掩码数据的只读视图.
    #[inline]
    pub fn data(&self) -> ArrayView2<bool> {
        self.data.view()
    }

    /// 掩码的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 掩码内的像素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }
}

/// 仅保留肺部区域的 8-bit 图像. 所有 SSIM 比较都以此为单位, 创建后不可变.
#[derive(Clone, Debug)]
pub struct SegmentedImage {
    id: ImageId,
    data: Array2<u8>,
}

impl SegmentedImage {
    /// 用已有的 8-bit 数据直接初始化.
    ///
    /// 该构造函数不检查分辨率. 分割引擎产出的图像总是 [`crate::consts::SEG_SIZE`].
    #[inline]
    pub fn from_gray(id: ImageId, data: Array2<u8>) -> Self {
        Self { id, data }
    }

    /// 将 `[0, 1]` 范围的 `normalized` 图像与 `mask` 逐元素相乘, 再放大回 8-bit.
    ///
    /// 两者形状必须一致, 否则程序 panic.
    pub fn apply_mask(id: ImageId, normalized: ArrayView2<f32>, mask: &SegmentationMask) -> Self {
        assert_eq!(normalized.dim(), mask.shape(), "图像与掩码形状不一致");
        let mut data = Array2::from_elem(mask.shape(), BLACK);
        Zip::from(&mut data)
            .and(&normalized)
            .and(&mask.data)
            .for_each(|out, &v, &keep| {
                if keep {
                    // `as` 在此处饱和转换, NaN 会落到 0.
                    *out = (v * MAX_F32).round() as u8;
                }
            });
        Self { id, data }
    }

    /// 全零 (全黑) 图像. 模型调用失败时的退化结果.
    #[inline]
    pub fn zeroed(id: ImageId, shape: Idx2d) -> Self {
        Self {
            id,
            data: Array2::from_elem(shape, BLACK),
        }
    }

    /// 图像标识.
    #[inline]
    pub fn id(&self) -> &ImageId {
        &self.id
    }

    /// 像素数据的只读视图.
    #[inline]
    pub fn data(&self) -> ArrayView2<u8> {
        self.data.view()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 转换为 `f32` 数组 (取值仍为 `[0, 255]`).
    #[inline]
    pub fn to_f32(&self) -> Array2<f32> {
        self.data.mapv(f32::from)
    }
}
