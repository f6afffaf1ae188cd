//! 题目编辑表单
//!
//! 表单只有一个明确的模式（新增 / 编辑某题），提交时按当前模式
//! 生成唯一一个请求；请求未返回前再次提交会被拒绝。

use tracing::info;

use crate::clients::{AdminClient, AdminReply};
use crate::error::{AppResult, ValidationError};
use crate::models::admin::{Empty, QuestionDraft, QuestionRef};
use crate::models::question::Question;

/// 表单模式
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Create,
    Edit(QuestionRef),
}

/// 一次提交对应的请求
#[derive(Debug, Clone, PartialEq)]
pub enum FormRequest {
    Add(QuestionDraft),
    Edit(QuestionRef, QuestionDraft),
}

#[derive(Debug, Default)]
pub struct AdminForm {
    mode: FormMode,
    draft: QuestionDraft,
    in_flight: bool,
}

impl AdminForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &QuestionDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut QuestionDraft {
        &mut self.draft
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// 载入已有题目进入编辑模式
    pub fn begin_edit(&mut self, question_ref: QuestionRef, question: &Question) {
        self.draft =
            QuestionDraft::from_question(question, &question_ref.subject, &question_ref.topic);
        self.mode = FormMode::Edit(question_ref);
    }

    /// 放弃编辑，回到新增模式
    pub fn cancel_edit(&mut self) {
        self.mode = FormMode::Create;
        self.reset_fields();
    }

    /// 校验并锁定表单，返回要发送的请求
    pub fn begin_submit(&mut self) -> Result<FormRequest, ValidationError> {
        if self.in_flight {
            return Err(ValidationError::SubmitInFlight);
        }
        let draft = self.draft.clone().normalized();
        draft.validate()?;

        self.in_flight = true;
        Ok(match &self.mode {
            FormMode::Create => FormRequest::Add(draft),
            FormMode::Edit(question_ref) => FormRequest::Edit(question_ref.clone(), draft),
        })
    }

    /// 请求结束；成功后清空题目内容并回到新增模式
    pub fn finish_submit(&mut self, success: bool) {
        self.in_flight = false;
        if success {
            self.mode = FormMode::Create;
            self.reset_fields();
        }
    }

    /// 提交到服务端
    pub async fn submit(&mut self, client: &AdminClient) -> AppResult<AdminReply<Empty>> {
        let request = self.begin_submit()?;
        let result = match request {
            FormRequest::Add(draft) => client.add_question(draft).await,
            FormRequest::Edit(question_ref, draft) => {
                client.edit_question(&question_ref, draft).await
            }
        };
        self.finish_submit(result.is_ok());
        if let Ok(reply) = &result {
            info!("✓ {}", reply.message);
        }
        result
    }

    /// 保留学科和主题，方便连续录入
    fn reset_fields(&mut self) {
        self.draft = QuestionDraft {
            subject: std::mem::take(&mut self.draft.subject),
            topic: std::mem::take(&mut self.draft.topic),
            ..Default::default()
        };
    }
}
