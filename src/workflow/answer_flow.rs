//! 答题流程状态机 - 流程层
//!
//! 核心职责：定义"一轮答题"的状态转移
//!
//! 状态顺序：
//! 1. AwaitingQuestion → 等待下一题
//! 2. QuestionDisplayed → 选项可点击
//! 3. AnswerSubmitted → 选项锁定，等待判定
//! 4. FeedbackShown → 显示对错，倒计时自动进入下一题
//!
//! 终止状态：Finished（测验结束）、Expired（时间用完）。
//!
//! `transition` 是纯函数：不做 IO，只返回新的上下文和需要执行的副作用，
//! 由编排层的运行器负责执行。

use tracing::debug;

use crate::models::question::{
    AnswerResult, AnswerSubmission, NextQuestion, QuestionTurn, SubmitOutcome,
};
use crate::models::session::SessionProgress;

/// 流程状态
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FlowState {
    #[default]
    AwaitingQuestion,
    QuestionDisplayed {
        turn: QuestionTurn,
    },
    AnswerSubmitted {
        turn: QuestionTurn,
        selection: usize,
    },
    FeedbackShown {
        turn: QuestionTurn,
        selection: usize,
        result: AnswerResult,
    },
    Finished,
    Expired,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Finished | FlowState::Expired)
    }

    /// 当前轮次（如果有）
    pub fn turn(&self) -> Option<&QuestionTurn> {
        match self {
            FlowState::QuestionDisplayed { turn }
            | FlowState::AnswerSubmitted { turn, .. }
            | FlowState::FeedbackShown { turn, .. } => Some(turn),
            _ => None,
        }
    }
}

/// 可关闭的提示信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// 获取题目失败，可重试
    FetchFailed(String),
    /// 提交失败，选项已恢复
    SubmitFailed(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::FetchFailed(m) | Notice::SubmitFailed(m) => m,
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, Notice::FetchFailed(_))
    }
}

/// 状态机上下文：状态 + 会话进度 + 提示
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowContext {
    pub state: FlowState,
    pub progress: SessionProgress,
    pub notice: Option<Notice>,
    /// 已发出获取下一题的请求，尚未返回
    pub fetch_pending: bool,
}

impl FlowContext {
    /// 等待题目但没有请求在途：只能靠重试继续
    pub fn can_refetch(&self) -> bool {
        self.state == FlowState::AwaitingQuestion && !self.fetch_pending
    }
}

/// 输入事件
#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    QuestionLoaded(NextQuestion),
    FetchFailed(String),
    OptionSelected(usize),
    SubmitCompleted { turn: usize, outcome: SubmitOutcome },
    SubmitFailed { turn: usize, message: String },
    /// 自动前进（超时或用户打断）
    AdvanceRequested,
    TimeExpired,
    Retry,
    DismissNotice,
    Quit,
}

/// 跳转目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Finalize,
    Results,
}

/// 需要运行器执行的副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchNextQuestion,
    SubmitAnswer(AnswerSubmission),
    ScheduleAdvance,
    CancelAdvance,
    Redirect(Route),
    Render,
}

/// 状态转移
pub fn transition(ctx: FlowContext, event: FlowEvent) -> (FlowContext, Vec<Effect>) {
    if ctx.state.is_terminal() {
        debug!("流程已终止，忽略事件: {:?}", event);
        return (ctx, vec![]);
    }

    let can_refetch = ctx.can_refetch();
    let FlowContext {
        state,
        progress,
        notice,
        fetch_pending,
    } = ctx;

    match (state, event) {
        // ========== 任意状态：超时 / 退出 ==========
        (_, FlowEvent::TimeExpired)
        | (_, FlowEvent::QuestionLoaded(NextQuestion::TimeExpired))
        | (
            _,
            FlowEvent::SubmitCompleted {
                outcome: SubmitOutcome::TimeExpired,
                ..
            },
        ) => expire(progress),

        (_, FlowEvent::Quit) => (
            FlowContext {
                state: FlowState::Finished,
                progress,
                notice: None,
                fetch_pending: false,
            },
            vec![
                Effect::CancelAdvance,
                Effect::Redirect(Route::Finalize),
                Effect::Render,
            ],
        ),

        // ========== 等待题目 ==========
        (FlowState::AwaitingQuestion, FlowEvent::QuestionLoaded(NextQuestion::Turn(turn))) => (
            FlowContext {
                progress: progress.begin_turn(&turn),
                state: FlowState::QuestionDisplayed { turn },
                notice: None,
                fetch_pending: false,
            },
            vec![Effect::Render],
        ),

        (FlowState::AwaitingQuestion, FlowEvent::QuestionLoaded(NextQuestion::EndOfQuiz)) => (
            FlowContext {
                state: FlowState::Finished,
                progress,
                notice: None,
                fetch_pending: false,
            },
            vec![Effect::Redirect(Route::Results), Effect::Render],
        ),

        (FlowState::AwaitingQuestion, FlowEvent::FetchFailed(message)) => (
            FlowContext {
                state: FlowState::AwaitingQuestion,
                progress,
                notice: Some(Notice::FetchFailed(message)),
                fetch_pending: false,
            },
            vec![Effect::Render],
        ),

        // 提示被关闭后仍可重试，只要没有请求在途
        (FlowState::AwaitingQuestion, FlowEvent::Retry) if can_refetch => {
            (
                FlowContext {
                    state: FlowState::AwaitingQuestion,
                    progress,
                    notice: None,
                    fetch_pending: true,
                },
                vec![Effect::FetchNextQuestion, Effect::Render],
            )
        }

        // ========== 选择选项（只写一次） ==========
        (FlowState::QuestionDisplayed { turn }, FlowEvent::OptionSelected(option)) => {
            match AnswerSubmission::for_turn(&turn, option) {
                Some(submission) => (
                    FlowContext {
                        state: FlowState::AnswerSubmitted {
                            turn,
                            selection: option,
                        },
                        progress,
                        notice: None,
                        fetch_pending: false,
                    },
                    vec![Effect::SubmitAnswer(submission), Effect::Render],
                ),
                None => (
                    FlowContext {
                        state: FlowState::QuestionDisplayed { turn },
                        progress,
                        notice,
                        fetch_pending,
                    },
                    vec![],
                ),
            }
        }

        // ========== 等待判定 ==========
        (
            FlowState::AnswerSubmitted { turn, selection },
            FlowEvent::SubmitCompleted {
                turn: answered,
                outcome: SubmitOutcome::Answered(result),
            },
        ) if answered == turn.index => (
            FlowContext {
                progress: progress.record_answer(&result),
                state: FlowState::FeedbackShown {
                    turn,
                    selection,
                    result,
                },
                notice: None,
                fetch_pending: false,
            },
            vec![Effect::ScheduleAdvance, Effect::Render],
        ),

        (
            FlowState::AnswerSubmitted { turn, .. },
            FlowEvent::SubmitFailed {
                turn: failed,
                message,
            },
        ) if failed == turn.index => (
            FlowContext {
                state: FlowState::QuestionDisplayed { turn },
                progress,
                notice: Some(Notice::SubmitFailed(message)),
                fetch_pending: false,
            },
            vec![Effect::Render],
        ),

        // ========== 反馈展示 ==========
        (FlowState::FeedbackShown { result, .. }, FlowEvent::AdvanceRequested) => {
            if result.is_last {
                (
                    FlowContext {
                        state: FlowState::Finished,
                        progress,
                        notice: None,
                        fetch_pending: false,
                    },
                    vec![
                        Effect::CancelAdvance,
                        Effect::Redirect(Route::Results),
                        Effect::Render,
                    ],
                )
            } else {
                (
                    FlowContext {
                        state: FlowState::AwaitingQuestion,
                        progress,
                        notice: None,
                        fetch_pending: true,
                    },
                    vec![
                        Effect::CancelAdvance,
                        Effect::FetchNextQuestion,
                        Effect::Render,
                    ],
                )
            }
        }

        // ========== 关闭提示 ==========
        (state, FlowEvent::DismissNotice) if notice.is_some() => (
            FlowContext {
                state,
                progress,
                notice: None,
                fetch_pending,
            },
            vec![Effect::Render],
        ),

        // 迟到或重复的事件
        (state, event) => {
            debug!("忽略事件 {:?}", event);
            (
                FlowContext {
                    state,
                    progress,
                    notice,
                    fetch_pending,
                },
                vec![],
            )
        }
    }
}

fn expire(progress: SessionProgress) -> (FlowContext, Vec<Effect>) {
    (
        FlowContext {
            state: FlowState::Expired,
            progress,
            notice: None,
            fetch_pending: false,
        },
        vec![
            Effect::CancelAdvance,
            Effect::Redirect(Route::Finalize),
            Effect::Render,
        ],
    )
}

/// 持有上下文的状态机包装
#[derive(Debug, Default)]
pub struct AnswerFlow {
    ctx: FlowContext,
}

impl AnswerFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 启动：请求第一题
    pub fn start(&mut self) -> Vec<Effect> {
        self.ctx.fetch_pending = true;
        vec![Effect::FetchNextQuestion, Effect::Render]
    }

    pub fn handle(&mut self, event: FlowEvent) -> Vec<Effect> {
        let (ctx, effects) = transition(std::mem::take(&mut self.ctx), event);
        self.ctx = ctx;
        effects
    }

    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    pub fn state(&self) -> &FlowState {
        &self.ctx.state
    }

    pub fn progress(&self) -> &SessionProgress {
        &self.ctx.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{answer, turn};

    fn displayed(index: usize, total: usize) -> AnswerFlow {
        let mut flow = AnswerFlow::new();
        flow.handle(FlowEvent::QuestionLoaded(NextQuestion::Turn(turn(index, total))));
        flow
    }

    fn submissions(effects: &[Effect]) -> Vec<&AnswerSubmission> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::SubmitAnswer(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn loaded_turn_displays_question() {
        let flow = displayed(1, 5);
        assert!(matches!(flow.state(), FlowState::QuestionDisplayed { .. }));
        assert_eq!(flow.progress().index, 1);
        assert_eq!(flow.progress().total, 5);
    }

    #[test]
    fn selection_is_write_once() {
        let mut flow = displayed(1, 5);
        let first = flow.handle(FlowEvent::OptionSelected(1));
        let second = flow.handle(FlowEvent::OptionSelected(2));

        let sent = submissions(&first);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].selection, "B");
        assert!(second.is_empty());
        assert!(matches!(
            flow.state(),
            FlowState::AnswerSubmitted { selection: 1, .. }
        ));
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let mut flow = displayed(1, 5);
        assert!(flow.handle(FlowEvent::OptionSelected(4)).is_empty());
        assert!(matches!(flow.state(), FlowState::QuestionDisplayed { .. }));
    }

    #[test]
    fn answer_shows_feedback_and_schedules_advance() {
        let mut flow = displayed(1, 5);
        flow.handle(FlowEvent::OptionSelected(1));
        let effects = flow.handle(FlowEvent::SubmitCompleted {
            turn: 1,
            outcome: SubmitOutcome::Answered(answer(true, 10)),
        });
        assert!(effects.contains(&Effect::ScheduleAdvance));
        assert_eq!(flow.progress().points, 10);
        assert_eq!(flow.progress().correct, 1);
    }

    #[test]
    fn stale_answer_for_other_turn_is_ignored() {
        let mut flow = displayed(2, 5);
        flow.handle(FlowEvent::OptionSelected(0));
        let effects = flow.handle(FlowEvent::SubmitCompleted {
            turn: 1,
            outcome: SubmitOutcome::Answered(answer(true, 10)),
        });
        assert!(effects.is_empty());
        assert_eq!(flow.progress().answered, 0);
    }

    #[test]
    fn advance_happens_once() {
        let mut flow = displayed(1, 5);
        flow.handle(FlowEvent::OptionSelected(1));
        flow.handle(FlowEvent::SubmitCompleted {
            turn: 1,
            outcome: SubmitOutcome::Answered(answer(true, 10)),
        });

        let first = flow.handle(FlowEvent::AdvanceRequested);
        let second = flow.handle(FlowEvent::AdvanceRequested);

        let fetches = first
            .iter()
            .chain(second.iter())
            .filter(|e| **e == Effect::FetchNextQuestion)
            .count();
        assert_eq!(fetches, 1);
        assert_eq!(flow.state(), &FlowState::AwaitingQuestion);
    }

    #[test]
    fn last_answer_advances_to_results() {
        let mut flow = displayed(5, 5);
        flow.handle(FlowEvent::OptionSelected(1));
        let mut last = answer(true, 50);
        last.is_last = true;
        flow.handle(FlowEvent::SubmitCompleted {
            turn: 5,
            outcome: SubmitOutcome::Answered(last),
        });
        let effects = flow.handle(FlowEvent::AdvanceRequested);
        assert!(effects.contains(&Effect::Redirect(Route::Results)));
        assert_eq!(flow.state(), &FlowState::Finished);
    }

    #[test]
    fn submit_failure_rolls_back_without_score_change() {
        let mut flow = displayed(1, 5);
        flow.handle(FlowEvent::OptionSelected(1));
        flow.handle(FlowEvent::SubmitFailed {
            turn: 1,
            message: "connection refused".to_string(),
        });

        assert!(matches!(flow.state(), FlowState::QuestionDisplayed { .. }));
        assert_eq!(flow.progress().answered, 0);
        assert_eq!(flow.progress().points, 0);
        assert!(matches!(
            flow.context().notice,
            Some(Notice::SubmitFailed(_))
        ));

        // 可以重新选择
        let effects = flow.handle(FlowEvent::OptionSelected(2));
        assert_eq!(submissions(&effects)[0].selection, "C");
    }

    #[test]
    fn time_expired_redirects_from_every_state() {
        let mut states = vec![AnswerFlow::new(), displayed(1, 3)];

        let mut submitted = displayed(1, 3);
        submitted.handle(FlowEvent::OptionSelected(0));
        states.push(submitted);

        let mut feedback = displayed(1, 3);
        feedback.handle(FlowEvent::OptionSelected(0));
        feedback.handle(FlowEvent::SubmitCompleted {
            turn: 1,
            outcome: SubmitOutcome::Answered(answer(false, 0)),
        });
        states.push(feedback);

        for mut flow in states {
            let effects = flow.handle(FlowEvent::TimeExpired);
            assert!(effects.contains(&Effect::Redirect(Route::Finalize)));
            assert!(effects.contains(&Effect::CancelAdvance));
            assert_eq!(flow.state(), &FlowState::Expired);
        }
    }

    #[test]
    fn expired_submit_outcome_redirects_to_finalize() {
        let mut flow = displayed(1, 3);
        flow.handle(FlowEvent::OptionSelected(0));
        let effects = flow.handle(FlowEvent::SubmitCompleted {
            turn: 1,
            outcome: SubmitOutcome::TimeExpired,
        });
        assert!(effects.contains(&Effect::Redirect(Route::Finalize)));
    }

    #[test]
    fn terminal_state_ignores_everything() {
        let mut flow = AnswerFlow::new();
        flow.handle(FlowEvent::QuestionLoaded(NextQuestion::EndOfQuiz));
        assert_eq!(flow.state(), &FlowState::Finished);
        assert!(flow.handle(FlowEvent::TimeExpired).is_empty());
        assert!(flow.handle(FlowEvent::Retry).is_empty());
    }

    #[test]
    fn fetch_failure_offers_retry() {
        let mut flow = AnswerFlow::new();
        flow.handle(FlowEvent::FetchFailed("timeout".to_string()));
        assert!(flow.context().notice.as_ref().is_some_and(Notice::can_retry));

        let effects = flow.handle(FlowEvent::Retry);
        assert!(effects.contains(&Effect::FetchNextQuestion));
        assert!(flow.context().notice.is_none());
        assert!(flow.context().fetch_pending);

        // 请求在途时不重复请求
        assert!(flow.handle(FlowEvent::Retry).is_empty());
    }

    #[test]
    fn dismissed_fetch_failure_can_still_retry() {
        let mut flow = AnswerFlow::new();
        flow.start();
        flow.handle(FlowEvent::FetchFailed("timeout".to_string()));
        flow.handle(FlowEvent::DismissNotice);
        assert!(flow.context().notice.is_none());
        assert!(flow.context().can_refetch());

        let effects = flow.handle(FlowEvent::Retry);
        assert!(effects.contains(&Effect::FetchNextQuestion));

        flow.handle(FlowEvent::QuestionLoaded(NextQuestion::Turn(turn(1, 3))));
        assert!(matches!(flow.state(), FlowState::QuestionDisplayed { .. }));
        assert!(!flow.context().fetch_pending);
    }

    #[test]
    fn retry_is_ignored_while_fetch_in_flight() {
        let mut flow = AnswerFlow::new();
        flow.start();
        assert!(flow.handle(FlowEvent::Retry).is_empty());
    }

    #[test]
    fn quit_redirects_to_finalize() {
        let mut flow = displayed(1, 3);
        let effects = flow.handle(FlowEvent::Quit);
        assert!(effects.contains(&Effect::Redirect(Route::Finalize)));
        assert!(flow.state().is_terminal());
    }
}
