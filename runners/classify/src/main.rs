//! 胸部 X 光片分类程序.
//!
//! 所有路径与开关都从环境变量读取, 见 `utils::loader`.

mod result;
mod runner;

use std::process::ExitCode;
use utils::{loader, logger};

fn main() -> ExitCode {
    // 长时间运行时, 日志同时保存在输出目录下.
    if let Err(e) = logger::init_logger(loader::log_level(), loader::output_dir()) {
        eprintln!("Cannot install logger: {e}");
    }

    utils::sep();
    println!("Chest X-ray classification by lung SSIM");
    println!("Available cores: {}", utils::cpus());
    utils::sep();

    match runner::run() {
        Ok(result) => {
            result.analyze();
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
