use crate::models::question::{AnswerResult, QuestionTurn};

/// 会话进度
///
/// 只由答题流程的状态转移函数修改；`turn_answered` 每道新题重置。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionProgress {
    /// 当前题号（从 1 开始，0 表示尚未开始）
    pub index: usize,
    pub total: usize,
    /// 服务端给出的累计得分
    pub points: i64,
    pub answered: usize,
    pub correct: usize,
    pub turn_answered: bool,
}

impl SessionProgress {
    /// 进入新一轮
    pub fn begin_turn(self, turn: &QuestionTurn) -> Self {
        Self {
            index: turn.index,
            total: turn.total,
            points: turn.points,
            turn_answered: false,
            ..self
        }
    }

    /// 记录本轮判定结果；同一轮重复记录无效
    pub fn record_answer(self, result: &AnswerResult) -> Self {
        if self.turn_answered {
            return self;
        }
        Self {
            points: result.points,
            answered: self.answered + 1,
            correct: self.correct + usize::from(result.correct),
            turn_answered: true,
            ..self
        }
    }

    /// 正确率（四舍五入的百分比，无作答时为 0）
    pub fn accuracy_percent(&self) -> u32 {
        if self.answered == 0 {
            return 0;
        }
        ((self.correct as f64 / self.answered as f64) * 100.0).round() as u32
    }

    /// 进度条百分比
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.index as f64 / self.total as f64 * 100.0).min(100.0)
    }
}
