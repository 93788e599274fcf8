//! 批处理编排.
//!
//! 依次加载并分割两个参考池和未知图像集, 然后按输入顺序逐张分类,
//! 每完成一张就追加并刷新一行报告, 最后汇总统计.
//!
//! 参考池在任何分类开始之前完整构建, 此后只读; 结果列表只追加.
//!
//! 只有两种情况返回致命错误: 两个参考池都为空 ([`RunError::NoReferences`]),
//! 或者没有未知图像 ([`RunError::NoUnknowns`]). 输出目录与报告的 I/O 失败同样致命.
//! 其余失败都降级为单张图像的 `Error`/`Undefined` 记录, 或者仅记录日志.

mod config;

pub use config::PipelineConfig;

use crate::classify::{Class, ClassificationResult, Classifier, ReferencePool};
use crate::consts::SEGMENTED_DIR_PREFIX;
use crate::dataset::load_dir;
use crate::error::RunError;
use crate::progress::progress_bar;
use crate::report::{ReportWriter, Summary};
use crate::segment::{SegmentationModel, Segmenter};
use crate::similarity::Scorer;
use crate::{ImgWriteRaw, SegmentedImage};
use std::path::{Path, PathBuf};

/// 未知图像目录的分割结果副本标记.
const UNKNOWN_TAG: &str = "unknown";

/// 路径的最后一段, 不存在时为空串.
fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 一次完整运行的结果.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// 每张未知图像的分类结果, 与输入顺序一致.
    pub results: Vec<ClassificationResult>,

    /// 汇总统计.
    pub summary: Summary,

    /// 报告文件路径.
    pub report_path: PathBuf,
}

/// 批处理编排器. 分割引擎由调用方构造一次后注入.
pub struct Pipeline<M> {
    config: PipelineConfig,
    segmenter: Segmenter<M>,
    scorer: Scorer,
}

impl<M: SegmentationModel> Pipeline<M> {
    /// 初始化. 评分器使用默认比较分辨率.
    pub fn new(config: PipelineConfig, segmenter: Segmenter<M>) -> Self {
        Self {
            config,
            segmenter,
            scorer: Scorer::default(),
        }
    }

    /// 替换评分器.
    #[inline]
    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// 当前配置.
    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 分割引擎.
    #[inline]
    pub fn segmenter(&self) -> &Segmenter<M> {
        &self.segmenter
    }

    /// 加载 `dir` 下的所有图像并分割. 按配置保存分割结果副本,
    /// `tag` 用于区分同名的源目录, 见 [`Self::side_output_dir`].
    ///
    /// 目录为空或不存在时返回空列表.
    pub fn load_segmented(&self, dir: &Path, tag: &str) -> Vec<SegmentedImage> {
        let raw = load_dir(dir);
        if raw.is_empty() {
            return Vec::new();
        }

        log::info!("Segmenting {} images...", raw.len());
        let segmented = if self.config.batched {
            self.segmenter.segment_batch(&raw)
        } else {
            self.segmenter.segment_each(&raw)
        };

        if self.config.save_segmented {
            self.persist(&self.side_output_dir(dir, tag), &segmented);
        }
        segmented
    }

    /// 源目录 `source` 的分割结果副本目录: `{output_dir}/segmented_{源目录名}`.
    ///
    /// 若另一个输入目录的目录名与之相同, 则追加 `_{tag}`, 避免互相覆盖.
    pub fn side_output_dir(&self, source: &Path, tag: &str) -> PathBuf {
        let folder = folder_name(source);
        let clash = [
            &self.config.healthy_dir,
            &self.config.diseased_dir,
            &self.config.unknown_dir,
        ]
        .into_iter()
        .any(|d| d.as_path() != source && folder_name(d) == folder);

        let name = if clash {
            log::warn!(
                "Input directory name `{folder}` is not unique, saving segmented images of {} under a `_{tag}` suffix",
                source.display()
            );
            format!("{SEGMENTED_DIR_PREFIX}{folder}_{tag}")
        } else {
            format!("{SEGMENTED_DIR_PREFIX}{folder}")
        };
        self.config.output_dir.join(name)
    }

    /// 将分割结果写到 `dir`. 失败只记录日志.
    fn persist(&self, dir: &Path, images: &[SegmentedImage]) {
        if let Err(e) = std::fs::create_dir_all(dir) {
            log::warn!("Cannot create {}: {e}", dir.display());
            return;
        }
        for img in images {
            let path = dir.join(img.id().name());
            if let Err(e) = img.save_raw(&path) {
                log::warn!("Failed to save segmented image {}: {e}", path.display());
            }
        }
    }

    /// 加载一个参考池.
    fn load_pool(&self, class: Class, dir: &Path) -> ReferencePool {
        let pool = ReferencePool::new(class, self.load_segmented(dir, &class.to_string()));
        if pool.is_empty() {
            log::info!("Reference pool `{class}` is empty");
        } else {
            log::info!("Reference pool `{class}`: {} images", pool.len());
        }
        pool
    }

    /// 完整运行一次.
    pub fn run(&self) -> Result<RunOutcome, RunError> {
        let output_dir = &self.config.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|source| RunError::Io {
            path: output_dir.clone(),
            source,
        })?;

        let healthy = self.load_pool(Class::Healthy, &self.config.healthy_dir);
        let diseased = self.load_pool(Class::Diseased, &self.config.diseased_dir);
        if healthy.is_empty() && diseased.is_empty() {
            log::error!("No reference images loaded. Aborting.");
            return Err(RunError::NoReferences);
        }

        let unknowns = self.load_segmented(&self.config.unknown_dir, UNKNOWN_TAG);
        if unknowns.is_empty() {
            log::error!("No unknown images to classify. Aborting.");
            return Err(RunError::NoUnknowns(self.config.unknown_dir.clone()));
        }

        let classifier = Classifier::new(self.scorer, &healthy, &diseased);
        let mut writer = ReportWriter::create(self.config.report_path())?;
        let mut results = Vec::with_capacity(unknowns.len());

        log::info!("Classifying {} images...", unknowns.len());
        let bar = progress_bar(unknowns.len() as u64, "Classifying", self.config.progress);
        for img in unknowns.iter() {
            let result = classifier.classify(img);
            writer.append(&result)?;
            results.push(result);
            bar.inc(1);
        }
        bar.finish_and_clear();

        let report_path = writer.finish()?;
        log::info!("Report saved: {}", report_path.display());

        let summary = Summary::from_results(&results);
        for line in summary.to_string().lines() {
            log::info!("{line}");
        }

        Ok(RunOutcome {
            results,
            summary,
            report_path,
        })
    }
}
