//! 长耗时阶段的进度条.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg:>12} [{bar:40}] {pos}/{len} ({eta})";

/// 创建长度为 `len` 的进度条. `enabled` 为 `false` 时返回隐藏的进度条,
/// 调用方无需区分两种情况.
pub(crate) fn progress_bar(len: u64, msg: &'static str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len).with_message(msg);
    if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
