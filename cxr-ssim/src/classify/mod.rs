//! 分类器.
//!
//! 对一张未知的分割后图像, 分别计算它与健康参考池, 患病参考池所有成员的 SSIM 均值
//! (忽略未定义的评分), 再按如下规则判定:
//!
//! | 健康均值 | 患病均值 | 类别 | 置信度 |
//! |---|---|---|---|
//! | 未定义 | 未定义 | [`Label::Undefined`] | 0 |
//! | 有定义 | 未定义 | [`Label::Healthy`] | 健康均值 |
//! | 未定义 | 有定义 | [`Label::Diseased`] | 患病均值 |
//! | `h > d` | | [`Label::Healthy`] | `h - d` |
//! | `h <= d` | | [`Label::Diseased`] | `d - h` |
//!
//! 注意最后一行: **平局判为患病**. 这是沿用下来的行为, 改变它会改变分类结果,
//! 修改前必须与领域负责人确认.
//!
//! 单张图像分类过程中的任何意外失败都会被捕获, 记为 [`Label::Error`], 而不会中断整批任务.

mod label;

pub use label::{Class, Label};

use crate::similarity::{Normalized, Scorer, SimilarityScore};
use crate::SegmentedImage;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 一类参考图像. 每次运行从固定目录构建一次, 此后只读. 允许为空.
#[derive(Clone, Debug)]
pub struct ReferencePool {
    class: Class,
    images: Vec<SegmentedImage>,
}

impl ReferencePool {
    /// 直接初始化.
    #[inline]
    pub fn new(class: Class, images: Vec<SegmentedImage>) -> Self {
        Self { class, images }
    }

    /// 空参考池.
    #[inline]
    pub fn empty(class: Class) -> Self {
        Self::new(class, Vec::new())
    }

    /// 参考池所属的类别.
    #[inline]
    pub fn class(&self) -> Class {
        self.class
    }

    /// 池中的图像, 顺序与加载顺序一致.
    #[inline]
    pub fn images(&self) -> &[SegmentedImage] {
        &self.images
    }

    /// 图像张数.
    #[inline]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// 是否为空池.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// 一张未知图像的分类结果. 即报告中的一行.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// 图像文件名.
    #[serde(rename = "imagem")]
    pub name: String,

    /// 与健康参考池的平均 SSIM. 没有任何有效比较时为 `None`.
    #[serde(rename = "ssim_medio_saudaveis")]
    pub mean_healthy: Option<f64>,

    /// 与患病参考池的平均 SSIM. 没有任何有效比较时为 `None`.
    #[serde(rename = "ssim_medio_doentes")]
    pub mean_diseased: Option<f64>,

    /// 分类结果.
    #[serde(rename = "classificacao")]
    pub label: Label,

    /// 置信度, 非负.
    #[serde(rename = "confianca")]
    pub confidence: f64,

    /// 与健康参考池的有效比较次数.
    #[serde(rename = "n_comparacoes_saudavel")]
    pub n_healthy: usize,

    /// 与患病参考池的有效比较次数.
    #[serde(rename = "n_comparacoes_doente")]
    pub n_diseased: usize,
}

impl ClassificationResult {
    /// 分类过程意外失败时的结果: 置信度 0, 比较次数 0.
    pub fn error(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mean_healthy: None,
            mean_diseased: None,
            label: Label::Error,
            confidence: 0.0,
            n_healthy: 0,
            n_diseased: 0,
        }
    }
}

/// 判定规则. 见模块文档.
pub fn decide(healthy: Option<f64>, diseased: Option<f64>) -> (Label, f64) {
    match (healthy, diseased) {
        (None, None) => (Label::Undefined, 0.0),
        (Some(h), None) => (Label::Healthy, h),
        (None, Some(d)) => (Label::Diseased, d),
        (Some(h), Some(d)) if h > d => (Label::Healthy, h - d),
        (Some(h), Some(d)) => (Label::Diseased, d - h),
    }
}

/// 忽略未定义评分的均值, 以及有效评分的个数. 没有有效评分时均值为 `None`.
pub fn mean_defined<I: IntoIterator<Item = SimilarityScore>>(scores: I) -> (Option<f64>, usize) {
    let (sum, n) = scores
        .into_iter()
        .flatten()
        .fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));
    match n {
        0 => (None, 0),
        n => (Some(sum / n as f64), n),
    }
}

/// 绑定了两个参考池的分类器.
///
/// 构造时把所有参考图像预先归一化到比较分辨率, 此后只读.
/// 无法归一化的参考图像仍占位, 与它的每一次比较都视为未定义.
pub struct Classifier {
    scorer: Scorer,
    healthy: Vec<Option<Normalized>>,
    diseased: Vec<Option<Normalized>>,
}

impl Classifier {
    /// 以评分器和两个参考池构建分类器.
    pub fn new(scorer: Scorer, healthy: &ReferencePool, diseased: &ReferencePool) -> Self {
        debug_assert_eq!(healthy.class(), Class::Healthy);
        debug_assert_eq!(diseased.class(), Class::Diseased);

        let prepare = |pool: &ReferencePool| -> Vec<Option<Normalized>> {
            pool.images()
                .iter()
                .map(|img| {
                    let n = scorer.prepare_segmented(img);
                    if n.is_none() {
                        log::warn!("Reference {} cannot be normalized", img.id());
                    }
                    n
                })
                .collect()
        };

        Self {
            scorer,
            healthy: prepare(healthy),
            diseased: prepare(diseased),
        }
    }

    /// 健康参考图像个数.
    #[inline]
    pub fn healthy_len(&self) -> usize {
        self.healthy.len()
    }

    /// 患病参考图像个数.
    #[inline]
    pub fn diseased_len(&self) -> usize {
        self.diseased.len()
    }

    /// 对一张未知图像分类. 不会 panic, 也不会返回错误.
    pub fn classify(&self, unknown: &SegmentedImage) -> ClassificationResult {
        let name = unknown.id().name();
        let result = isolate(name, || self.classify_unguarded(unknown));
        log::info!(
            "{name:30} | SSIM healthy: {} | SSIM diseased: {} | {}",
            fmt_score(result.mean_healthy),
            fmt_score(result.mean_diseased),
            result.label
        );
        result
    }

    fn classify_unguarded(&self, unknown: &SegmentedImage) -> ClassificationResult {
        let prepared = self.scorer.prepare_segmented(unknown);
        let (mean_healthy, n_healthy) = mean_defined(self.scores(prepared.as_ref(), &self.healthy));
        let (mean_diseased, n_diseased) =
            mean_defined(self.scores(prepared.as_ref(), &self.diseased));
        let (label, confidence) = decide(mean_healthy, mean_diseased);

        ClassificationResult {
            name: unknown.id().name().to_string(),
            mean_healthy,
            mean_diseased,
            label,
            confidence,
            n_healthy,
            n_diseased,
        }
    }

    /// 与一个参考池所有成员的评分, 顺序与池一致.
    fn scores(&self, unknown: Option<&Normalized>, refs: &[Option<Normalized>]) -> Vec<SimilarityScore> {
        let Some(unknown) = unknown else {
            return vec![None; refs.len()];
        };

        #[cfg(feature = "rayon")]
        let it = refs.par_iter();
        #[cfg(not(feature = "rayon"))]
        let it = refs.iter();

        it.map(|r| {
            r.as_ref()
                .and_then(|r| self.scorer.score_prepared(unknown, r))
        })
        .collect()
    }
}

/// 运行 `op`, 将其中的 panic 转换为 [`Label::Error`] 结果.
fn isolate<F: FnOnce() -> ClassificationResult>(name: &str, op: F) -> ClassificationResult {
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("Error classifying {name}: {reason}");
            ClassificationResult::error(name)
        }
    }
}

#[inline]
fn fmt_score(s: Option<f64>) -> String {
    match s {
        Some(f) => format!("{f:.4}"),
        None => "/".to_string(),
    }
}
