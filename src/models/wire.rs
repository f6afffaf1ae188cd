//! 服务端响应的原始结构
//!
//! 所有字段均可缺省，由 [`crate::clients`] 按约定顺序判定：
//! 错误 → 超时 → 结束 → 正常数据。

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::question::{
    AnswerResult, NextQuestion, Question, QuestionTurn, RemainingTime, SubmitOutcome, TimeStatus,
};

#[derive(Debug, Default, Deserialize)]
pub struct NextQuestionPayload {
    #[serde(alias = "question")]
    pub pergunta: Option<Question>,
    #[serde(alias = "index")]
    pub numero: Option<usize>,
    pub total: Option<usize>,
    #[serde(alias = "points")]
    pub pontos: Option<i64>,
    #[serde(alias = "endOfQuiz", default)]
    pub fim: bool,
    #[serde(alias = "timeExpired", default)]
    pub tempo_esgotado: bool,
    #[serde(alias = "error")]
    pub erro: Option<String>,
}

impl NextQuestionPayload {
    pub fn into_next(self, endpoint: &str) -> AppResult<NextQuestion> {
        if let Some(message) = self.erro {
            return Err(AppError::server(endpoint, message));
        }
        if self.tempo_esgotado {
            return Ok(NextQuestion::TimeExpired);
        }
        if self.fim {
            return Ok(NextQuestion::EndOfQuiz);
        }
        let question = self
            .pergunta
            .ok_or_else(|| AppError::server(endpoint, "响应中缺少题目"))?;
        let index = self.numero.unwrap_or(1);
        Ok(NextQuestion::Turn(QuestionTurn {
            question,
            index,
            total: self.total.unwrap_or(index),
            points: self.pontos.unwrap_or(0),
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitPayload {
    #[serde(
        rename = "correto",
        alias = "acertou",
        alias = "correta",
        alias = "correct"
    )]
    pub correto: Option<bool>,
    #[serde(alias = "correctAnswer")]
    pub resposta_correta: Option<String>,
    #[serde(alias = "points")]
    pub pontos: Option<i64>,
    #[serde(alias = "explanation")]
    pub explicacao: Option<String>,
    #[serde(alias = "endOfQuiz", default)]
    pub fim: bool,
    #[serde(alias = "timeExpired", default)]
    pub tempo_esgotado: bool,
    #[serde(alias = "error")]
    pub erro: Option<String>,
}

impl SubmitPayload {
    pub fn into_outcome(self, endpoint: &str) -> AppResult<SubmitOutcome> {
        if let Some(message) = self.erro {
            return Err(AppError::server(endpoint, message));
        }
        if self.tempo_esgotado {
            return Ok(SubmitOutcome::TimeExpired);
        }
        let correct = self
            .correto
            .ok_or_else(|| AppError::server(endpoint, "响应中缺少判定结果"))?;
        Ok(SubmitOutcome::Answered(AnswerResult {
            correct,
            correct_answer: self.resposta_correta.unwrap_or_default(),
            points: self.pontos.unwrap_or(0),
            explanation: self.explicacao.filter(|s| !s.trim().is_empty()),
            is_last: self.fim,
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RemainingTimePayload {
    #[serde(alias = "minutes")]
    pub minutos: Option<u64>,
    #[serde(alias = "seconds")]
    pub segundos: Option<u64>,
    #[serde(alias = "totalSeconds")]
    pub total_segundos: Option<u64>,
    #[serde(alias = "timeExpired", default)]
    pub tempo_esgotado: bool,
    #[serde(alias = "error")]
    pub erro: Option<String>,
}

impl RemainingTimePayload {
    pub fn into_status(self, endpoint: &str) -> AppResult<TimeStatus> {
        if let Some(message) = self.erro {
            return Err(AppError::server(endpoint, message));
        }
        if self.tempo_esgotado {
            return Ok(TimeStatus::TimeExpired);
        }
        let total = match (self.total_segundos, self.minutos, self.segundos) {
            (Some(total), _, _) => total,
            (None, Some(m), Some(s)) => m * 60 + s,
            _ => return Err(AppError::server(endpoint, "响应中缺少剩余时间")),
        };
        if total == 0 {
            return Ok(TimeStatus::TimeExpired);
        }
        let mut remaining = RemainingTime::from_total(total);
        if let (Some(m), Some(s)) = (self.minutos, self.segundos) {
            remaining.minutes = m;
            remaining.seconds = s;
        }
        Ok(TimeStatus::Remaining(remaining))
    }
}
