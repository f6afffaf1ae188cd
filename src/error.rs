use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 网络层错误（请求失败、超时、响应无法解析）
    Network(NetworkError),
    /// 服务端返回的业务错误（`erro` 字段）
    Server(ServerError),
    /// 文件操作错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
    /// 本地校验失败
    Validation(ValidationError),
    /// 其他错误
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(e) => write!(f, "网络错误: {}", e),
            AppError::Server(e) => write!(f, "服务端错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Validation(e) => write!(f, "校验失败: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Network(e) => Some(e),
            AppError::Server(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Validation(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 网络层错误
#[derive(Debug)]
pub enum NetworkError {
    /// 请求发送失败或超时
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 非 2xx 状态且响应体中没有可读的错误信息
    BadStatus { endpoint: String, status: u16 },
    /// 响应 JSON 解析失败
    DecodeFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::RequestFailed { endpoint, source } => {
                write!(f, "请求失败 ({}): {}", endpoint, source)
            }
            NetworkError::BadStatus { endpoint, status } => {
                write!(f, "响应状态异常 ({}): HTTP {}", endpoint, status)
            }
            NetworkError::DecodeFailed { endpoint, source } => {
                write!(f, "响应解析失败 ({}): {}", endpoint, source)
            }
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetworkError::RequestFailed { source, .. }
            | NetworkError::DecodeFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            NetworkError::BadStatus { .. } => None,
        }
    }
}

/// 服务端业务错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub endpoint: String,
    pub message: String,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.endpoint)
    }
}

impl std::error::Error for ServerError {}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound { path: String },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 文件内容解析失败
    ParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 不支持的文件类型
    UnsupportedFormat { path: String },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::ParseFailed { path, source } => {
                write!(f, "文件解析失败 ({}): {}", path, source)
            }
            FileError::UnsupportedFormat { path } => {
                write!(f, "文件必须是 JSON 或 TOML: {}", path)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项取值非法
    InvalidValue { key: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::InvalidValue { key, reason } => {
                write!(f, "配置项 {} 非法: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// 题目草稿的本地校验错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("字段 {0} 不能为空")]
    MissingField(&'static str),
    #[error("选项数量必须为 4 或 5 个，实际为 {0} 个")]
    OptionCount(usize),
    #[error("正确答案必须在选项之中")]
    CorrectAnswerNotInOptions,
    #[error("题目索引无效: {0}")]
    InvalidIndex(usize),
    #[error("已有请求正在提交中")]
    SubmitInFlight,
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Network(NetworkError::DecodeFailed {
            endpoint: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::ParseFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建请求失败错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Network(NetworkError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建响应解析失败错误
    pub fn decode_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Network(NetworkError::DecodeFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建服务端业务错误
    pub fn server(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Server(ServerError {
            endpoint: endpoint.into(),
            message: message.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否为网络层错误
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Network(_))
    }

    /// 展示给用户的简短信息
    pub fn user_message(&self) -> String {
        match self {
            AppError::Server(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
