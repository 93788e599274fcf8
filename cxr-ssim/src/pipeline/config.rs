//! 编排器配置.

use crate::consts::REPORT_FILE_NAME;
use crate::dataset::{DISEASED_DIR_NAME, HEALTHY_DIR_NAME, UNKNOWN_DIR_NAME};
use std::path::{Path, PathBuf};

/// 一次运行的显式配置. 所有路径都由调用方传入, 不存在模块级常量路径.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// 健康参考图像目录.
    pub healthy_dir: PathBuf,

    /// 患病参考图像目录.
    pub diseased_dir: PathBuf,

    /// 待分类的未知图像目录.
    pub unknown_dir: PathBuf,

    /// 输出目录. 报告和分割结果副本都写在这里.
    pub output_dir: PathBuf,

    /// 是否把每张分割后的图像写到 `{output_dir}/segmented_{源目录名}/{文件名}`.
    pub save_segmented: bool,

    /// `true` 时按子批次调用模型, `false` 时每次只提交一张图像. 两者结果一致.
    pub batched: bool,

    /// 报告文件名.
    pub report_name: String,

    /// 是否显示进度条.
    pub progress: bool,
}

impl PipelineConfig {
    /// 以 `base` 为根目录, 使用默认的子目录名构建配置.
    ///
    /// 即 `base/valid_normais_frontal`, `base/valid_Doentes_frontal`,
    /// `base/valid_desconhecidos_frontal` 与 `base/output`.
    pub fn under<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref();
        Self {
            healthy_dir: base.join(HEALTHY_DIR_NAME),
            diseased_dir: base.join(DISEASED_DIR_NAME),
            unknown_dir: base.join(UNKNOWN_DIR_NAME),
            output_dir: base.join("output"),
            save_segmented: true,
            batched: true,
            report_name: REPORT_FILE_NAME.to_string(),
            progress: false,
        }
    }

    /// 报告文件的完整路径.
    #[inline]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_name)
    }
}

impl Default for PipelineConfig {
    /// 以当前工作目录为根目录.
    fn default() -> Self {
        Self::under(".")
    }
}
