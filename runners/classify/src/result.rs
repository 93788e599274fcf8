//! 运行结果.

use cxr_ssim::pipeline::RunOutcome;
use cxr_ssim::Label;
use std::io::{self, Write};

/// 分类程序的最终结果.
pub struct ClassifyResult {
    outcome: RunOutcome,
}

impl ClassifyResult {
    pub fn new(outcome: RunOutcome) -> Self {
        Self { outcome }
    }

    /// 将结果写进 `w` 中.
    fn describe_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let summary = &self.outcome.summary;
        writeln!(w, "Report: {}", self.outcome.report_path.display())?;
        utils::sep_to(&mut *w)?;
        summary.describe_into(w)?;
        writeln!(w)?;
        utils::sep_to(&mut *w)?;
        for label in Label::ALL {
            let n = summary.count(label);
            let ratio = match summary.total {
                0 => 0.0,
                t => n as f64 * 100.0 / t as f64,
            };
            writeln!(w, "{:<12}{n:>6} ({ratio:5.1}%)", label.localized())?;
        }
        Ok(())
    }

    /// 打印运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(1024);
        match self.describe_into(&mut buf) {
            Ok(()) => print!("{}", String::from_utf8_lossy(&buf)),
            Err(e) => log::error!("Cannot format summary: {e}"),
        }
        utils::sep();
    }
}
