//! 日志初始化
//!
//! 基于 tracing-subscriber 的 EnvFilter: `LOG_LEVEL` 接受完整的过滤表达式
//! (例如 `info,http_access=warn`)，缺省 `info`。提供 `log_dir` 时追加
//! 按天滚动的文件输出 (`<dir>/mesa-server.<date>`)。

use std::path::Path;

use tracing_subscriber::EnvFilter;

fn build_filter(log_level: Option<&str>) -> EnvFilter {
    let directives = log_level.unwrap_or("info");
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize console-only logging (tests, tooling)
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize logging, optionally teeing into a daily-rolling file
///
/// The file writer is used only when the directory already exists; a missing
/// directory degrades to console output instead of failing startup.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_filter(log_level))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir
        && Path::new(dir).is_dir()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "mesa-server");
        subscriber.with_writer(file_appender).init();
        return;
    }

    subscriber.init();
}
