//! 运行日志: 终端输出由 `simple_logger` 负责, 同时逐行追加到日志文件.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use simple_logger::SimpleLogger;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

/// 运行日志文件名.
pub const LOG_FILE_NAME: &str = "classify.log";

/// 同时写终端与文件的日志器.
pub struct TeeLogger {
    console: SimpleLogger,
    file: Mutex<File>,
    start: Instant,
}

impl TeeLogger {
    /// 以日志级别 `level` 初始化, 追加写入 `path`.
    pub fn new<P: AsRef<Path>>(level: LevelFilter, path: P) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            console: SimpleLogger::new().with_level(level),
            file: Mutex::new(file),
            start: Instant::now(),
        })
    }

    /// 注册为全局日志器.
    pub fn init(self) -> Result<(), SetLoggerError> {
        log::set_max_level(self.console.max_level());
        log::set_boxed_logger(Box::new(self))
    }
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.console.log(record);

        let elapsed = self.start.elapsed().as_secs_f64();
        if let Ok(mut file) = self.file.lock() {
            // 写日志失败时无处报告, 只能忽略.
            let _ = writeln!(
                file,
                "{elapsed:>10.3}s {:<5} [{}] {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// 安装日志器: 若能在 `dir` 下创建日志文件则同时写文件, 否则只写终端.
pub fn init_logger<P: AsRef<Path>>(level: LevelFilter, dir: P) -> Result<(), SetLoggerError> {
    let dir = dir.as_ref();
    let tee = std::fs::create_dir_all(dir).and_then(|_| TeeLogger::new(level, dir.join(LOG_FILE_NAME)));
    match tee {
        Ok(tee) => tee.init(),
        Err(e) => {
            SimpleLogger::new().with_level(level).init()?;
            log::warn!("Cannot open log file in {}: {e}", dir.display());
            Ok(())
        }
    }
}
