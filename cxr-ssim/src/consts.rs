//! 通用常量.

use crate::Idx2d;

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色. 掩码之外的像素都会被置为该值.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 8-bit 灰度的最大值, 以浮点数表示. 用于 `[0, 255] <-> [0, 1]` 的换算.
    pub const MAX_F32: f32 = WHITE as f32;
}

/// 分割模型的输入/输出分辨率 (高, 宽).
pub const SEG_SIZE: Idx2d = (256, 256);

/// 计算 SSIM 之前, 两张图像统一缩放到的分辨率 (高, 宽).
pub const SSIM_SIZE: Idx2d = (224, 224);

/// 每次调用分割模型时最多提交的图像张数.
pub const BATCH_SIZE: usize = 16;

/// 模型输出概率 **严格大于** 该值时, 像素属于肺部.
pub const MASK_THRESHOLD: f32 = 0.5;

/// SSIM 的取值范围 (data range). 图像在比较前已经归一化到 `[0, 1]`.
pub const SSIM_DATA_RANGE: f64 = 1.0;

/// SSIM 均值窗口边长.
pub const SSIM_WINDOW: usize = 7;

/// 允许加载的图像扩展名 (小写, 不含 `.`).
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// 默认的报告文件名.
pub const REPORT_FILE_NAME: &str = "relatorio_classificacao.csv";

/// 分割结果副本所在目录的前缀. 完整目录名为 `segmented_{源目录名}`.
pub const SEGMENTED_DIR_PREFIX: &str = "segmented_";

/// 判断 `ext` (不区分大小写) 是否在扩展名白名单 [`IMAGE_EXTENSIONS`] 内.
#[inline]
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(ext))
}
