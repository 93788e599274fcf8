//! 结构相似度指数 (SSIM, Wang et al. 2004).
//!
//! 参数与常见的参考实现保持一致:
//!
//! 1. `7 x 7` 均值 (非高斯) 窗口, 边界按对称反射 (`d c b a | a b c d | d c b a`) 延拓;
//! 2. 方差与协方差使用样本估计, 即乘以 `N / (N - 1)`, `N = 49`;
//! 3. `K1 = 0.01`, `K2 = 0.03`;
//! 4. 最终结果是 SSIM 图去掉宽为 `(7 - 1) / 2` 的边框之后的均值.

use crate::consts::SSIM_WINDOW;
use ndarray::{s, Array2, ArrayView2, Axis, Zip};

const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// 单张图像在 SSIM 窗口下的局部统计量.
///
/// 一张参考图像会与许多未知图像比较, 预先计算其局部均值可以避免重复工作,
/// 数值上与逐对计算完全一致.
#[derive(Clone, Debug)]
pub struct WindowStats {
    data: Array2<f64>,
    mean: Array2<f64>,
    mean_sq: Array2<f64>,
}

impl WindowStats {
    /// 计算 `data` 的局部均值与局部平方均值.
    pub fn new(data: Array2<f64>) -> Self {
        let mean = uniform_filter(data.view(), SSIM_WINDOW);
        let mean_sq = uniform_filter(data.mapv(|v| v * v).view(), SSIM_WINDOW);
        Self {
            data,
            mean,
            mean_sq,
        }
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// 计算两张已统计图像的 SSIM.
///
/// 形状不一致, 或任一边长小于窗口边长时, 结果为 `NaN`; 由调用方决定如何处理.
pub fn ssim(a: &WindowStats, b: &WindowStats, data_range: f64) -> f64 {
    let (h, w) = a.shape();
    if b.shape() != (h, w) || h < SSIM_WINDOW || w < SSIM_WINDOW {
        return f64::NAN;
    }

    let np = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * data_range).powi(2);
    let c2 = (K2 * data_range).powi(2);

    let mut product = a.data.clone();
    product *= &b.data;
    let mean_xy = uniform_filter(product.view(), SSIM_WINDOW);

    let mut map = Array2::<f64>::zeros((h, w));
    Zip::from(&mut map)
        .and(&a.mean)
        .and(&b.mean)
        .and(&a.mean_sq)
        .and(&b.mean_sq)
        .and(&mean_xy)
        .for_each(|out, &ux, &uy, &uxx, &uyy, &uxy| {
            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);
            let num = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let den = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            *out = num / den;
        });

    let pad = (SSIM_WINDOW - 1) / 2;
    map.slice(s![pad..h - pad, pad..w - pad])
        .mean()
        .unwrap_or(f64::NAN)
}

/// 直接比较两张等大图像. 见 [`ssim`].
pub fn structural_similarity(a: ArrayView2<f64>, b: ArrayView2<f64>, data_range: f64) -> f64 {
    ssim(
        &WindowStats::new(a.to_owned()),
        &WindowStats::new(b.to_owned()),
        data_range,
    )
}

/// 对称反射边界下的下标.
#[inline]
fn reflect(mut i: isize, n: isize) -> usize {
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// 可分离的 `size x size` 均值滤波.
fn uniform_filter(src: ArrayView2<f64>, size: usize) -> Array2<f64> {
    let once = filter_rows(src, size);
    filter_rows(once.t(), size).reversed_axes()
}

/// 沿第二个轴 (每一行内部) 做一维均值滤波.
fn filter_rows(src: ArrayView2<f64>, size: usize) -> Array2<f64> {
    let half = (size / 2) as isize;
    let n = src.ncols() as isize;
    let mut ans = Array2::<f64>::zeros(src.dim());
    for (row, mut out) in src.axis_iter(Axis(0)).zip(ans.axis_iter_mut(Axis(0))) {
        for (i, o) in out.iter_mut().enumerate() {
            let i = i as isize;
            let sum: f64 = (i - half..=i + half).map(|j| row[reflect(j, n)]).sum();
            *o = sum / size as f64;
        }
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn gradient(h: usize, w: usize) -> Array2<f64> {
        Array2::from_shape_fn((h, w), |(y, x)| ((y * 7 + x * 3) % 17) as f64 / 16.0)
    }

    #[test]
    fn test_reflect() {
        let got: Vec<usize> = (-3..7).map(|i| reflect(i, 4)).collect();
        assert_eq!(got, vec![2, 1, 0, 0, 1, 2, 3, 3, 2, 1]);
        assert_eq!(reflect(-2, 1), 0);
        assert_eq!(reflect(3, 1), 0);
    }

    #[test]
    fn test_uniform_filter_constant() {
        let a = Array2::from_elem((9, 11), 0.25);
        let f = uniform_filter(a.view(), 7);
        assert!(f.iter().all(|&v| f64_eq(v, 0.25)));
    }

    #[test]
    fn test_uniform_filter_border() {
        // 一维: [1, 0, 0, 0], 反射后第 0 位的窗口为 [0, 0, 1, 1, 0, 0, 0].
        let a = array![[1.0, 0.0, 0.0, 0.0]];
        let f = filter_rows(a.view(), 7);
        assert!(f64_eq(f[(0, 0)], 2.0 / 7.0));
    }

    #[test]
    fn test_identical_images() {
        let a = gradient(32, 40);
        assert!(f64_eq(structural_similarity(a.view(), a.view(), 1.0), 1.0));

        let zeros = Array2::<f64>::zeros((16, 16));
        assert!(f64_eq(structural_similarity(zeros.view(), zeros.view(), 1.0), 1.0));
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let a = gradient(24, 24);
        let b = a.mapv(|v| 1.0 - v);
        let ab = structural_similarity(a.view(), b.view(), 1.0);
        let ba = structural_similarity(b.view(), a.view(), 1.0);
        assert!(f64_eq(ab, ba));
        assert!((-1.0..1.0).contains(&ab));
        assert!(ab < 0.0, "inverted image should anti-correlate: {ab}");
    }

    #[test]
    fn test_degenerate_shapes_are_nan() {
        let a = gradient(6, 30);
        assert!(structural_similarity(a.view(), a.view(), 1.0).is_nan());
        let b = gradient(8, 8);
        let c = gradient(8, 9);
        assert!(structural_similarity(b.view(), c.view(), 1.0).is_nan());
    }

    #[test]
    fn test_nan_input_propagates() {
        let mut a = gradient(10, 10);
        a[(5, 5)] = f64::NAN;
        let b = gradient(10, 10);
        assert!(structural_similarity(a.view(), b.view(), 1.0).is_nan());
    }
}
