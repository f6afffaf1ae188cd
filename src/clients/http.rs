//! 两个客户端共用的请求与响应处理

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, NetworkError};

/// 构建带超时和 cookie 的 HTTP 客户端
pub(crate) fn build_http_client(config: &Config) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .cookie_store(true)
        .build()
        .map_err(|e| AppError::request_failed(&config.base_url, e))
}

/// 读取 JSON 响应
///
/// 判定顺序：
/// 1. 响应体带 `erro`/`error` 字段 → 服务端错误（无论状态码）
/// 2. 非 2xx → 状态异常
/// 3. 按目标类型解析
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    endpoint: &str,
) -> AppResult<T> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| AppError::request_failed(endpoint, e))?;

    debug!("{} 响应 HTTP {} ({} 字节)", endpoint, status.as_u16(), body.len());

    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) if status.is_success() => return Err(AppError::decode_failed(endpoint, e)),
        Err(_) => {
            return Err(AppError::Network(NetworkError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            }))
        }
    };

    if let Some(message) = error_message(&value) {
        return Err(AppError::server(endpoint, message));
    }

    if !status.is_success() {
        return Err(AppError::Network(NetworkError::BadStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        }));
    }

    serde_json::from_value(value).map_err(|e| AppError::decode_failed(endpoint, e))
}

fn error_message(value: &Value) -> Option<String> {
    ["erro", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// 把 reqwest 的发送错误包装为网络错误
pub(crate) fn send_failed(endpoint: &str, err: reqwest::Error) -> AppError {
    AppError::request_failed(endpoint, err)
}
