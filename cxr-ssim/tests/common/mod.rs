//! 集成测试的公共部件: 合成 X 光片与确定性的分割 "模型".

#![allow(dead_code)]

use cxr_ssim::error::PredictError;
use cxr_ssim::segment::SegmentationModel;
use image::{GrayImage, Luma};
use ndarray::{Array4, ArrayView4};
use std::path::Path;

/// 输入强度大于 `cut` 的像素概率为 1, 否则为 0.
pub struct IntensityModel(pub f32);

impl SegmentationModel for IntensityModel {
    fn predict(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, PredictError> {
        let cut = self.0;
        Ok(batch.mapv(|v| if v > cut { 1.0 } else { 0.0 }))
    }
}

/// 总是失败的模型, 模拟资源耗尽.
pub struct FailingModel;

impl SegmentationModel for FailingModel {
    fn predict(&self, _: ArrayView4<f32>) -> Result<Array4<f32>, PredictError> {
        Err(PredictError::Backend("resource exhausted".to_string()))
    }
}

/// 一张合成胸片: 暗背景上两片 "肺野", 肺野内部是周期为 `period` 的横纹.
pub fn chest(width: u32, height: u32, period: u32) -> GrayImage {
    let (cx1, cx2) = (width as f32 * 0.3, width as f32 * 0.7);
    let cy = height as f32 * 0.5;
    let (rx, ry) = (width as f32 * 0.17, height as f32 * 0.35);
    GrayImage::from_fn(width, height, |x, y| {
        let (xf, yf) = (x as f32, y as f32);
        let inside = |cx: f32| ((xf - cx) / rx).powi(2) + ((yf - cy) / ry).powi(2) <= 1.0;
        if inside(cx1) || inside(cx2) {
            let stripe = (y / period) % 2 == 0;
            Luma([if stripe { 230 } else { 150 }])
        } else {
            Luma([20])
        }
    })
}

/// 写一张合成胸片到 `dir/name`. 格式由扩展名决定.
pub fn write_chest(dir: &Path, name: &str, period: u32) {
    std::fs::create_dir_all(dir).unwrap();
    chest(300, 280, period).save(dir.join(name)).unwrap();
}

/// 写一个无法解码的 "图像".
pub fn write_corrupt(dir: &Path, name: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), b"definitely not an image").unwrap();
}
