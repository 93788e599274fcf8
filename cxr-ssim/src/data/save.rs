//! 图像的持久化存储.

use super::SegmentedImage;
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **按原样** 模式持久化存储的单通道图像对象.
///
/// 图像格式由 `path` 的扩展名决定, 像素值原样写入, 不做任何窗口化或拉伸.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

macro_rules! impl_gray_raw {
    ($($img: ty),+) => {
        $(
            /// 按原样存储为 8-bit 灰度图.
            impl ImgWriteRaw for $img {
                fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.data().indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

impl_gray_raw!(SegmentedImage);
