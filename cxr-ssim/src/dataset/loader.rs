//! 目录图像加载器.
//!
//! 提供迭代器风格的加载模式: 先列出目录下扩展名合法的文件, 迭代时才真正解码.

use crate::consts::is_image_extension;
use crate::{ImageId, RawImage};
use image::{ImageReader, ImageResult};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// 从目录 `path` 创建图像加载器.
///
/// # 注意
///
/// 1. 扩展名不在 [`crate::consts::IMAGE_EXTENSIONS`] 内的文件会被静默跳过.
/// 2. 目录不存在或无法读取时不会报错, 而是记录警告并返回空加载器.
/// 3. 文件顺序即目录迭代顺序. 该顺序跨平台不稳定, 只影响日志, 不影响结果.
pub fn image_loader<P: AsRef<Path>>(path: P) -> ImageLoader {
    let path = path.as_ref();
    let folder = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut files: Vec<PathBuf> = match std::fs::read_dir(path) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(is_image_extension)
            })
            .collect(),
        Err(e) => {
            log::warn!("Directory not found or unreadable: {} ({e})", path.display());
            Vec::new()
        }
    };

    files.reverse();
    ImageLoader { folder, files_rev: files }
}

/// 单通道 8-bit 图像加载器.
#[derive(Debug)]
pub struct ImageLoader {
    folder: String,
    files_rev: Vec<PathBuf>,
}

impl ImageLoader {
    /// 源目录名.
    #[inline]
    pub fn folder(&self) -> &str {
        &self.folder
    }
}

impl Iterator for ImageLoader {
    type Item = (PathBuf, ImageResult<RawImage>);

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files_rev.pop()?;
        let data = read_gray(&path, &self.folder);
        Some((path, data))
    }
}

impl ExactSizeIterator for ImageLoader {
    #[inline]
    fn len(&self) -> usize {
        self.files_rev.len()
    }
}

/// 读取 `path` 处的图像并转为单通道 8-bit 灰度.
///
/// 格式由文件内容识别, 扩展名与实际格式不符的图像同样可以读取.
fn read_gray(path: &Path, folder: &str) -> ImageResult<RawImage> {
    let gray = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .into_luma8();
    let (width, height) = gray.dimensions();
    let data = Array2::from_shape_vec((height as usize, width as usize), gray.into_raw())
        .map_err(|e| {
            image::ImageError::Decoding(image::error::DecodingError::new(
                image::error::ImageFormatHint::Unknown,
                e,
            ))
        })?;
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(RawImage::new(ImageId::new(name, folder), data))
}

/// 加载目录 `path` 下所有可以解码的图像, 与文件名一一对应.
///
/// 解码失败的文件记录警告后跳过; 空目录或不存在的目录返回空列表并记录警告.
pub fn load_dir<P: AsRef<Path>>(path: P) -> Vec<RawImage> {
    let path = path.as_ref();
    let loader = image_loader(path);
    if loader.len() == 0 {
        log::warn!("No images found in {}", path.display());
        return Vec::new();
    }

    log::info!("Loading {} images from {}", loader.len(), loader.folder());
    let mut ans = Vec::with_capacity(loader.len());
    for (file, result) in loader {
        match result {
            Ok(img) => ans.push(img),
            Err(e) => log::warn!("Failed to read {}: {e}", file.display()),
        }
    }
    ans
}
