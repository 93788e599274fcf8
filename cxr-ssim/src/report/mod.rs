//! 分类报告与统计.
//!
//! 报告为 CSV 表格, 每张成功加载的未知图像一行, 列名固定:
//!
//! `imagem, ssim_medio_saudaveis, ssim_medio_doentes, classificacao, confianca,
//! n_comparacoes_saudavel, n_comparacoes_doente`
//!
//! 未定义的平均相似度写为空字段. 下游的绘图与图表工具只依赖这一格式.

mod summary;
mod writer;

pub use summary::Summary;
pub use writer::ReportWriter;

/// 报告的列名, 顺序与 [`crate::classify::ClassificationResult`] 的字段一致.
pub const COLUMNS: [&str; 7] = [
    "imagem",
    "ssim_medio_saudaveis",
    "ssim_medio_doentes",
    "classificacao",
    "confianca",
    "n_comparacoes_saudavel",
    "n_comparacoes_doente",
];
