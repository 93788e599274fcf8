//! 面积平均 (area averaging) 插值缩放.
//!
//! 每个目标像素对应源图像上一个 (可能带小数边界的) 矩形区域,
//! 其值为该区域内源像素按覆盖面积加权的平均. 可分离实现: 先沿宽度方向,
//! 再沿高度方向.
//!
//! 放大时每个目标像素只覆盖 1 ~ 2 个源像素, 结果等价于带边界混合的最近邻.

use crate::consts::gray::MAX_F32;
use crate::Idx2d;
use ndarray::{Array2, ArrayView2, Axis};

/// 一个目标坐标对应的 `(源坐标, 权重)` 列表. 权重之和为 1.
type Taps = Vec<(usize, f64)>;

/// 计算长度 `src` 缩放到 `dst` 时, 每个目标坐标的采样权重.
fn area_taps(src: usize, dst: usize) -> Vec<Taps> {
    debug_assert!(src > 0 && dst > 0);
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|i| {
            let start = i as f64 * scale;
            let end = (start + scale).min(src as f64);
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src);
            let mut taps: Taps = (first..last)
                .filter_map(|j| {
                    let overlap = end.min(j as f64 + 1.0) - start.max(j as f64);
                    (overlap > 1e-12).then_some((j, overlap))
                })
                .collect();
            let total: f64 = taps.iter().map(|&(_, w)| w).sum();
            taps.iter_mut().for_each(|(_, w)| *w /= total);
            taps
        })
        .collect()
}

/// 以面积平均插值将 `src` 缩放到 `(height, width)`.
///
/// 源图像或目标尺寸任一维度为 0 时返回 `None`. 尺寸相同时结果与输入逐像素相等.
pub fn resize_area(src: ArrayView2<f32>, (height, width): Idx2d) -> Option<Array2<f32>> {
    let (src_h, src_w) = src.dim();
    if src_h == 0 || src_w == 0 || height == 0 || width == 0 {
        return None;
    }
    if (src_h, src_w) == (height, width) {
        return Some(src.to_owned());
    }

    let taps_w = area_taps(src_w, width);
    let mut horizontal = Array2::<f64>::zeros((src_h, width));
    for (row, mut out) in src.axis_iter(Axis(0)).zip(horizontal.axis_iter_mut(Axis(0))) {
        for (o, taps) in out.iter_mut().zip(taps_w.iter()) {
            *o = taps.iter().map(|&(j, w)| row[j] as f64 * w).sum();
        }
    }

    let taps_h = area_taps(src_h, height);
    let mut ans = Array2::<f32>::zeros((height, width));
    for (mut out, taps) in ans.axis_iter_mut(Axis(0)).zip(taps_h.iter()) {
        for &(j, w) in taps.iter() {
            out.zip_mut_with(&horizontal.row(j), |o, &v| *o += (v * w) as f32);
        }
    }
    Some(ans)
}

/// 8-bit 版本的 [`resize_area`]. 结果四舍五入并截断到 `[0, 255]`.
pub fn resize_area_u8(src: ArrayView2<u8>, shape: Idx2d) -> Option<Array2<u8>> {
    let resized = resize_area(src.mapv(f32::from).view(), shape)?;
    Some(resized.mapv(|v| v.round().clamp(0.0, MAX_F32) as u8))
}
