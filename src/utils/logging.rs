use anyhow::{Context, Result};
/// 日志文件工具
///
/// 会话日志文件：启动时写入表头，结束时追加一行统计
use std::fs::{self, OpenOptions};
use std::io::Write;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `title`: 表头标题
pub fn init_log_file(log_file_path: &str, title: &str) -> Result<()> {
    let log_header = format!(
        "{}\n{} - {}\n{}\n\n",
        "=".repeat(60),
        title,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法创建日志文件: {}", log_file_path))?;
    Ok(())
}

/// 追加一行带时间戳的记录
pub fn append_log_line(log_file_path: &str, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_file_path)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        line
    )?;
    Ok(())
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
