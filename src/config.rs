use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError, FileError};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 测验服务地址
    pub base_url: String,
    /// 测验会话 ID（附加到每个测验请求的 `session_id` 参数）
    pub session_id: Option<String>,
    /// 管理端登录邮箱
    pub admin_email: Option<String>,
    /// 管理端登录密码
    pub admin_password: Option<String>,
    // --- 路由 ---
    pub next_question_route: String,
    pub submit_answer_route: String,
    pub remaining_time_route: String,
    pub finalize_route: String,
    pub results_route: String,
    // --- 计时 ---
    /// 剩余时间轮询间隔（毫秒）
    pub timer_poll_interval_ms: u64,
    /// 低于该秒数时显示警告
    pub timer_warning_seconds: u64,
    /// 反馈展示后自动进入下一题的延迟（秒）
    pub auto_advance_seconds: u64,
    /// 单个请求超时（秒）
    pub request_timeout_seconds: u64,
    // --- 日志 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            session_id: None,
            admin_email: None,
            admin_password: None,
            next_question_route: "/proxima_pergunta".to_string(),
            submit_answer_route: "/responder".to_string(),
            remaining_time_route: "/tempo_restante".to_string(),
            finalize_route: "/finalizar_quiz".to_string(),
            results_route: "/resultado".to_string(),
            timer_poll_interval_ms: 1000,
            timer_warning_seconds: 120,
            auto_advance_seconds: 3,
            request_timeout_seconds: 10,
            verbose_logging: false,
            output_log_file: "quiz_session.log".to_string(),
        }
    }
}

impl Config {
    /// 仅从环境变量读取（未设置的项使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::File(FileError::ParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 读取配置：可选的 TOML 文件，再叠加环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// 用 `lookup` 提供的值覆盖配置；无法解析的值保持原样
    fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_url: lookup("QUIZ_BASE_URL").unwrap_or(self.base_url),
            session_id: lookup("QUIZ_SESSION_ID").or(self.session_id),
            admin_email: lookup("ADMIN_EMAIL").or(self.admin_email),
            admin_password: lookup("ADMIN_PASSWORD").or(self.admin_password),
            timer_poll_interval_ms: parsed(&lookup, "TIMER_POLL_INTERVAL_MS")
                .unwrap_or(self.timer_poll_interval_ms),
            timer_warning_seconds: parsed(&lookup, "TIMER_WARNING_SECONDS")
                .unwrap_or(self.timer_warning_seconds),
            auto_advance_seconds: parsed(&lookup, "AUTO_ADVANCE_SECONDS")
                .unwrap_or(self.auto_advance_seconds),
            request_timeout_seconds: parsed(&lookup, "REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(self.request_timeout_seconds),
            verbose_logging: parsed(&lookup, "VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            ..self
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.timer_poll_interval_ms == 0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                key: "timer_poll_interval_ms".to_string(),
                reason: "必须大于 0".to_string(),
            }));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::Config(ConfigError::InvalidValue {
                key: "base_url".to_string(),
                reason: format!("不是 http(s) 地址: {}", self.base_url),
            }));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.timer_poll_interval_ms)
    }

    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_secs(self.auto_advance_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// 拼接完整 URL
    pub fn url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
