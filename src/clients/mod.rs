pub mod admin_client;
pub(crate) mod http;
pub mod session_client;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::question::{AnswerSubmission, NextQuestion, SubmitOutcome, TimeStatus};

pub use admin_client::{AdminClient, AdminReply};
pub use session_client::SessionClient;

/// 答题流程依赖的会话接口
///
/// 运行器只依赖这个 trait，测试中可以替换为内存实现。
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// 获取下一题（或结束 / 超时）
    async fn fetch_next_question(&self) -> AppResult<NextQuestion>;

    /// 提交当前题目的答案
    async fn submit_answer(&self, submission: &AnswerSubmission) -> AppResult<SubmitOutcome>;

    /// 查询剩余时间
    async fn poll_remaining_time(&self) -> AppResult<TimeStatus>;
}
