//! 测验会话客户端
//!
//! 封装答题流程需要的三个接口：下一题、提交答案、剩余时间。
//! 不做任何自动重试，失败直接交给调用方。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::clients::http::{build_http_client, read_json, send_failed};
use crate::clients::SessionApi;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::question::{AnswerSubmission, NextQuestion, SubmitOutcome, TimeStatus};
use crate::models::wire::{NextQuestionPayload, RemainingTimePayload, SubmitPayload};

/// 测验会话客户端
pub struct SessionClient {
    http: reqwest::Client,
    config: Config,
}

impl SessionClient {
    /// 创建新的会话客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            http: build_http_client(config)?,
            config: config.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, route: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.config.url(route));
        match &self.config.session_id {
            Some(id) => builder.query(&[("session_id", id)]),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, route: &str) -> AppResult<T> {
        let response = self
            .request(reqwest::Method::GET, route)
            .send()
            .await
            .map_err(|e| send_failed(route, e))?;
        read_json(response, route).await
    }

    /// 访问跳转路由（结束页 / 结果页），返回最终落地的 URL
    pub async fn visit(&self, route: &str) -> AppResult<String> {
        let response = self
            .request(reqwest::Method::GET, route)
            .send()
            .await
            .map_err(|e| send_failed(route, e))?;
        let final_url = response.url().to_string();
        info!("↪ 已跳转: {} (HTTP {})", final_url, response.status().as_u16());
        Ok(final_url)
    }
}

#[async_trait]
impl SessionApi for SessionClient {
    async fn fetch_next_question(&self) -> AppResult<NextQuestion> {
        let route = &self.config.next_question_route;
        debug!("📥 正在获取下一题...");
        let payload: NextQuestionPayload = self.get(route).await?;
        payload.into_next(route)
    }

    async fn submit_answer(&self, submission: &AnswerSubmission) -> AppResult<SubmitOutcome> {
        let route = &self.config.submit_answer_route;
        debug!("📤 提交答案: {} (题目 {})", submission.selection, submission.turn);
        let response = self
            .request(reqwest::Method::POST, route)
            .json(submission)
            .send()
            .await
            .map_err(|e| send_failed(route, e))?;
        let payload: SubmitPayload = read_json(response, route).await?;
        payload.into_outcome(route)
    }

    async fn poll_remaining_time(&self) -> AppResult<TimeStatus> {
        let route = &self.config.remaining_time_route;
        let payload: RemainingTimePayload = self.get(route).await?;
        payload.into_status(route)
    }
}
