//! 类别与分类标签.

use serde::Serialize;
use std::fmt;

/// 参考池的类别.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Class {
    /// 已知健康.
    Healthy,

    /// 已知患病.
    Diseased,
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Diseased => "diseased",
        })
    }
}

/// 一张未知图像的分类标签.
///
/// 写入报告时使用本地化名称 (`Saudável`, `Doente`, `Indefinido`, `Erro`),
/// 下游的绘图工具依赖这些值; `Display` 使用英文.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Label {
    /// 与健康参考池更相似.
    #[serde(rename = "Saudável")]
    Healthy,

    /// 与患病参考池更相似, 或两者相等.
    #[serde(rename = "Doente")]
    Diseased,

    /// 两个参考池均没有有效比较.
    #[serde(rename = "Indefinido")]
    Undefined,

    /// 分类过程中发生了意外失败.
    #[serde(rename = "Erro")]
    Error,
}

impl Label {
    /// 所有标签, 按报告统计的顺序排列.
    pub const ALL: [Label; 4] = [Self::Healthy, Self::Diseased, Self::Undefined, Self::Error];

    /// 报告中使用的本地化名称.
    #[inline]
    pub const fn localized(&self) -> &'static str {
        match self {
            Self::Healthy => "Saudável",
            Self::Diseased => "Doente",
            Self::Undefined => "Indefinido",
            Self::Error => "Erro",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "Healthy",
            Self::Diseased => "Diseased",
            Self::Undefined => "Undefined",
            Self::Error => "Error",
        })
    }
}
