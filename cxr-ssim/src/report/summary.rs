//! 运行统计.

use crate::classify::{mean_defined, ClassificationResult};
use crate::Label;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use std::fmt;
use std::io::{self, Write};

/// 一次运行的汇总统计.
///
/// 平均值会跳过未定义的相似度; 没有任何行时, 所有平均值均为 `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// 报告总行数.
    pub total: usize,

    /// 判为健康的张数.
    pub healthy: usize,

    /// 判为患病的张数.
    pub diseased: usize,

    /// 未定义的张数.
    pub undefined: usize,

    /// 分类失败的张数.
    pub errors: usize,

    /// 置信度均值 (包括未定义与失败行的 0).
    pub mean_confidence: Option<f64>,

    /// 置信度中位数.
    pub median_confidence: Option<f64>,

    /// 与健康参考池平均相似度的均值.
    pub mean_ssim_healthy: Option<f64>,

    /// 与患病参考池平均相似度的均值.
    pub mean_ssim_diseased: Option<f64>,
}

impl Summary {
    /// 从全部结果计算.
    pub fn from_results(results: &[ClassificationResult]) -> Self {
        let count = |label: Label| results.iter().filter(|r| r.label == label).count();
        let confidences = results.iter().map(|r| Some(r.confidence));

        Self {
            total: results.len(),
            healthy: count(Label::Healthy),
            diseased: count(Label::Diseased),
            undefined: count(Label::Undefined),
            errors: count(Label::Error),
            mean_confidence: mean_defined(confidences).0,
            median_confidence: median(results.iter().map(|r| r.confidence)),
            mean_ssim_healthy: mean_defined(results.iter().map(|r| r.mean_healthy)).0,
            mean_ssim_diseased: mean_defined(results.iter().map(|r| r.mean_diseased)).0,
        }
    }

    /// 某个标签的张数.
    #[inline]
    pub fn count(&self, label: Label) -> usize {
        match label {
            Label::Healthy => self.healthy,
            Label::Diseased => self.diseased,
            Label::Undefined => self.undefined,
            Label::Error => self.errors,
        }
    }

    /// 将统计写进 `w` 中, 每项一行.
    pub fn describe_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        #[inline]
        fn f64_to_display(f: Option<f64>) -> String {
            match f {
                Some(f) => format!("{f:.6}"),
                None => "/".to_string(),
            }
        }

        writeln!(w, "{:30}: {}", "total_processadas", self.total)?;
        writeln!(w, "{:30}: {}", "total_saudaveis", self.healthy)?;
        writeln!(w, "{:30}: {}", "total_doentes", self.diseased)?;
        writeln!(w, "{:30}: {}", "total_indefinidos", self.undefined)?;
        writeln!(w, "{:30}: {}", "total_erros", self.errors)?;
        writeln!(w, "{:30}: {}", "confianca_media", f64_to_display(self.mean_confidence))?;
        writeln!(w, "{:30}: {}", "confianca_mediana", f64_to_display(self.median_confidence))?;
        writeln!(w, "{:30}: {}", "ssim_saudavel_medio", f64_to_display(self.mean_ssim_healthy))?;
        write!(w, "{:30}: {}", "ssim_doente_medio", f64_to_display(self.mean_ssim_diseased))?;
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::with_capacity(512);
        self.describe_into(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

/// 中位数. 偶数个元素时取中间两者的平均值.
fn median<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let sorted: Vec<f64> = values.into_iter().sorted_by_key(|&v| OrderedFloat(v)).collect();
    let n = sorted.len();
    match n {
        0 => None,
        n if n % 2 == 1 => Some(sorted[n / 2]),
        n => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}
