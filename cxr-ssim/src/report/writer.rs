//! 增量式 CSV 报告写入.

use crate::classify::ClassificationResult;
use std::fs::File;
use std::path::{Path, PathBuf};

/// 逐行写入的报告.
///
/// 每追加一行就刷新一次, 运行被中断时, 已完成的行仍保留在磁盘上.
pub struct ReportWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl ReportWriter {
    /// 在 `path` 处创建 (或截断) 报告文件.
    pub fn create<P: AsRef<Path>>(path: P) -> csv::Result<Self> {
        let path = path.as_ref().to_owned();
        let writer = csv::Writer::from_path(&path)?;
        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    /// 追加一行并立即刷新. 列名在第一行之前自动写入.
    pub fn append(&mut self, row: &ClassificationResult) -> csv::Result<()> {
        self.writer.serialize(row)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// 已写入的行数 (不含列名).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// 结束写入, 返回报告文件路径.
    pub fn finish(mut self) -> csv::Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}
