//! 肺部分割引擎.
//!
//! 引擎包装一个预训练的二值分割模型 ([`SegmentationModel`]). 每张输入图像先以面积平均插值缩放到
//! [`SEG_SIZE`], 再归一化到 `[0, 1]`; 同一子批次 (最多 `batch_size` 张) 一次性提交给模型.
//! 输出概率严格大于阈值的像素组成掩码, 掩码与归一化图像逐元素相乘后放大回 8-bit.
//!
//! 批处理只为吞吐量服务: 任意一张图像的掩码只取决于它自己, 与同批次的其它图像无关.
//!
//! 如果模型调用本身失败, 整个子批次退化为全零图像并记录错误, 而不会中断任务.

cfg_if::cfg_if! {
    if #[cfg(feature = "onnx")] {
        mod onnx;

        pub use onnx::OnnxModel;
    }
}

use crate::consts::gray::MAX_F32;
use crate::consts::{BATCH_SIZE, MASK_THRESHOLD, SEG_SIZE};
use crate::error::PredictError;
use crate::progress::progress_bar;
use crate::{resize_area_u8, RawImage, SegmentationMask, SegmentedImage};
use ndarray::{s, Array2, Array4, ArrayView4, Axis};
use std::num::NonZeroUsize;

/// 预训练二值分割模型的逻辑接口.
///
/// 输入为 `N x H x W x 1`, 取值 `[0, 1]` 的 `f32` 张量; 输出为同形状的逐像素概率.
/// 模型只读, 加载后在整个运行期间复用.
pub trait SegmentationModel {
    /// 对一个批次做推理.
    fn predict(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, PredictError>;
}

impl<M: SegmentationModel + ?Sized> SegmentationModel for Box<M> {
    #[inline]
    fn predict(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, PredictError> {
        (**self).predict(batch)
    }
}

impl<M: SegmentationModel + ?Sized> SegmentationModel for &M {
    #[inline]
    fn predict(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, PredictError> {
        (**self).predict(batch)
    }
}

/// 肺部分割引擎. 构造一次, 此后只读.
pub struct Segmenter<M> {
    model: M,
    batch_size: NonZeroUsize,
    threshold: f32,
    progress: bool,
}

impl<M: SegmentationModel> Segmenter<M> {
    /// 以默认子批次大小 [`BATCH_SIZE`] 和默认阈值 [`MASK_THRESHOLD`] 初始化.
    pub fn new(model: M) -> Self {
        Self {
            model,
            batch_size: NonZeroUsize::new(BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            threshold: MASK_THRESHOLD,
            progress: false,
        }
    }

    /// 设置每次模型调用的最大图像张数.
    #[inline]
    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// 设置二值化阈值.
    #[inline]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// 是否显示子批次进度条.
    #[inline]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// 每次模型调用的最大图像张数.
    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// 二值化阈值.
    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// 底层模型.
    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// 为每张图像计算肺部掩码, 顺序与 `images` 一致.
    ///
    /// 模型调用失败的子批次中, 每张图像都得到全空掩码.
    pub fn masks(&self, images: &[RawImage]) -> Vec<SegmentationMask> {
        self.run(images, self.batch_size())
            .into_iter()
            .map(|(_, mask)| mask)
            .collect()
    }

    /// 按子批次分割 `images`, 返回等长, 同序的分割后图像.
    pub fn segment_batch(&self, images: &[RawImage]) -> Vec<SegmentedImage> {
        self.finish(images, self.batch_size())
    }

    /// 逐张分割 `images` (每次模型调用只提交一张图像).
    ///
    /// 结果与 [`Self::segment_batch`] 完全一致, 只是吞吐量更低.
    pub fn segment_each(&self, images: &[RawImage]) -> Vec<SegmentedImage> {
        self.finish(images, 1)
    }

    /// 分割单张图像. 等价于大小为 1 的批次.
    pub fn segment_one(&self, image: &RawImage) -> SegmentedImage {
        self.finish(std::slice::from_ref(image), 1)
            .pop()
            .unwrap_or_else(|| SegmentedImage::zeroed(image.id().clone(), SEG_SIZE))
    }

    fn finish(&self, images: &[RawImage], batch_size: usize) -> Vec<SegmentedImage> {
        images
            .iter()
            .zip(self.run(images, batch_size))
            .map(|(img, (normalized, mask))| {
                SegmentedImage::apply_mask(img.id().clone(), normalized.view(), &mask)
            })
            .collect()
    }

    /// 返回每张图像的 `(归一化输入, 掩码)`.
    fn run(&self, images: &[RawImage], batch_size: usize) -> Vec<(Array2<f32>, SegmentationMask)> {
        let chunks = images.len().div_ceil(batch_size);
        let bar = progress_bar(chunks as u64, "Segmenting", self.progress);

        let mut ans = Vec::with_capacity(images.len());
        for (k, chunk) in images.chunks(batch_size).enumerate() {
            let normalized: Vec<Array2<f32>> = chunk.iter().map(normalize_input).collect();
            let masks = match self.predict_masks(&normalized) {
                Ok(masks) => masks,
                Err(e) => {
                    let start = k * batch_size;
                    log::error!(
                        "Batch prediction failed for images {start}..{}: {e}",
                        start + chunk.len()
                    );
                    vec![SegmentationMask::empty(SEG_SIZE); chunk.len()]
                }
            };
            ans.extend(normalized.into_iter().zip(masks));
            bar.inc(1);
        }
        bar.finish_and_clear();
        ans
    }

    /// 一次模型调用.
    fn predict_masks(&self, normalized: &[Array2<f32>]) -> Result<Vec<SegmentationMask>, PredictError> {
        let (h, w) = SEG_SIZE;
        let n = normalized.len();
        let mut batch = Array4::<f32>::zeros((n, h, w, 1));
        for (i, img) in normalized.iter().enumerate() {
            batch.slice_mut(s![i, .., .., 0]).assign(img);
        }

        let probs = self.model.predict(batch.view())?;
        if probs.dim() != (n, h, w, 1) {
            return Err(PredictError::Shape([n, h, w, 1], probs.shape().to_vec()));
        }

        Ok(probs
            .axis_iter(Axis(0))
            .map(|p| SegmentationMask::from_probabilities(p.index_axis(Axis(2), 0), self.threshold))
            .collect())
    }
}

/// 缩放到 [`SEG_SIZE`] 并归一化到 `[0, 1]`. 空图像得到全零输入.
fn normalize_input(image: &RawImage) -> Array2<f32> {
    match resize_area_u8(image.data(), SEG_SIZE) {
        Some(resized) => resized.mapv(|v| f32::from(v) / MAX_F32),
        None => {
            log::warn!("Empty image {}, segmenting as all-zero", image.id());
            Array2::zeros(SEG_SIZE)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ImageId;
    use std::cell::Cell;

    /// 以固定强度为界的确定性 "模型": 输入大于 `cut` 的像素概率为 1, 否则为 0.
    pub(crate) struct IntensityModel {
        pub cut: f32,
        pub calls: Cell<usize>,
    }

    impl IntensityModel {
        pub fn new(cut: f32) -> Self {
            Self {
                cut,
                calls: Cell::new(0),
            }
        }
    }

    impl SegmentationModel for IntensityModel {
        fn predict(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, PredictError> {
            self.calls.set(self.calls.get() + 1);
            let cut = self.cut;
            Ok(batch.mapv(|v| if v > cut { 1.0 } else { 0.0 }))
        }
    }

    /// 总是失败的模型.
    struct FailingModel;

    impl SegmentationModel for FailingModel {
        fn predict(&self, _: ArrayView4<f32>) -> Result<Array4<f32>, PredictError> {
            Err(PredictError::Backend("out of memory".into()))
        }
    }

    /// 输出形状错误的模型.
    struct WrongShapeModel;

    impl SegmentationModel for WrongShapeModel {
        fn predict(&self, batch: ArrayView4<f32>) -> Result<Array4<f32>, PredictError> {
            let (n, _, _, _) = batch.dim();
            Ok(Array4::zeros((n, 8, 8, 1)))
        }
    }

    /// 左半边亮度为 `left`, 右半边亮度为 `right` 的图像.
    fn halves(name: &str, (h, w): (usize, usize), left: u8, right: u8) -> RawImage {
        let data = Array2::from_shape_fn((h, w), |(_, x)| if x < w / 2 { left } else { right });
        RawImage::new(ImageId::new(name, "test"), data)
    }

    #[test]
    fn test_segment_one_applies_mask() {
        let seg = Segmenter::new(IntensityModel::new(0.5));
        let out = seg.segment_one(&halves("a.png", (512, 512), 200, 40));
        assert_eq!(out.shape(), SEG_SIZE);
        assert_eq!(out.id().name(), "a.png");
        assert_eq!(out.data()[(10, 10)], 200);
        assert_eq!(out.data()[(10, 200)], 0);
    }

    #[test]
    fn test_sub_batches() {
        let model = IntensityModel::new(0.5);
        let seg = Segmenter::new(&model).with_batch_size(NonZeroUsize::new(4).unwrap());
        let images: Vec<_> = (0..10)
            .map(|i| halves(&format!("{i}.png"), (64, 64), 255, i as u8))
            .collect();
        let out = seg.segment_batch(&images);
        assert_eq!(out.len(), 10);
        assert_eq!(model.calls.get(), 3);
        for (i, img) in out.iter().enumerate() {
            assert_eq!(img.id().name(), format!("{i}.png"));
        }
    }

    #[test]
    fn test_deterministic_masks() {
        let seg = Segmenter::new(IntensityModel::new(0.3));
        let images = [halves("a", (300, 280), 180, 20)];
        assert_eq!(seg.masks(&images), seg.masks(&images));
    }

    #[test]
    fn test_batch_size_invariance() {
        let seg = Segmenter::new(IntensityModel::new(0.4));
        let target = halves("x", (333, 401), 250, 90);
        let mut mixed: Vec<_> = (0..15)
            .map(|i| halves(&format!("{i}"), (100 + i * 7, 120), (i * 16) as u8, 255))
            .collect();
        mixed.insert(7, target.clone());

        let alone = seg.segment_one(&target);
        let batched = seg.segment_batch(&mixed);
        assert_eq!(batched.len(), 16);
        assert_eq!(alone.data(), batched[7].data());
        assert_eq!(seg.segment_each(&mixed)[7].data(), batched[7].data());
    }

    #[test]
    fn test_failed_batch_falls_back_to_zero() {
        let seg = Segmenter::new(FailingModel);
        let images: Vec<_> = (0..3).map(|i| halves(&i.to_string(), (32, 32), 255, 255)).collect();
        let out = seg.segment_batch(&images);
        assert_eq!(out.len(), 3);
        for img in out {
            assert_eq!(img.shape(), SEG_SIZE);
            assert!(img.data().iter().all(|&p| p == 0));
        }
    }

    #[test]
    fn test_wrong_output_shape_falls_back_to_zero() {
        let seg = Segmenter::new(WrongShapeModel);
        let out = seg.segment_one(&halves("a", (32, 32), 255, 255));
        assert!(out.data().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_empty_input() {
        let seg = Segmenter::new(IntensityModel::new(0.5));
        assert!(seg.segment_batch(&[]).is_empty());
        assert_eq!(seg.model().calls.get(), 0);
    }
}
