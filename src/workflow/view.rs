//! 视图模型
//!
//! 把流程上下文映射为纯数据，展示层只负责把它画出来。

use regex::Regex;

use crate::models::question::{Question, QuestionTurn, RemainingTime, OPTION_LETTERS};
use crate::models::session::SessionProgress;
use crate::workflow::answer_flow::{FlowContext, FlowState, Notice};

/// 选项的展示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    /// 可点击
    Enabled,
    /// 已锁定
    Disabled,
    /// 已选择，等待判定
    Selected,
    /// 选对了
    Correct,
    /// 选错了
    Incorrect,
    /// 选错时标出的正确答案
    CorrectHighlight,
}

impl OptionState {
    /// 是否标记为正确答案
    pub fn marks_correct(self) -> bool {
        matches!(self, OptionState::Correct | OptionState::CorrectHighlight)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub letter: char,
    pub text: String,
    pub state: OptionState,
}

/// 题目视图
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub number: usize,
    pub total: usize,
    pub progress_percent: f64,
    pub category: String,
    pub difficulty: String,
    pub text: String,
    pub options: Vec<OptionView>,
}

/// 答题反馈
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackView {
    pub correct: bool,
    /// 答错时显示的正确答案
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub points: i64,
    /// 自动进入下一题的倒计时（秒）
    pub advance_in_seconds: u64,
    pub is_last: bool,
}

/// 统计栏
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsView {
    pub points: i64,
    pub correct: usize,
    pub answered: usize,
    pub accuracy_percent: u32,
}

/// 倒计时
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerView {
    pub display: String,
    pub warning: bool,
    pub total_seconds: u64,
}

impl TimerView {
    pub fn new(remaining: &RemainingTime, warning: bool) -> Self {
        Self {
            display: remaining.display(),
            warning,
            total_seconds: remaining.total_seconds,
        }
    }
}

/// 提示条
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    pub message: String,
    pub can_retry: bool,
}

impl From<&Notice> for NoticeView {
    fn from(notice: &Notice) -> Self {
        Self {
            message: notice.message().to_string(),
            can_retry: notice.can_retry(),
        }
    }
}

/// 一帧完整画面
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub question: Option<QuestionView>,
    pub feedback: Option<FeedbackView>,
    pub stats: StatsView,
    pub notice: Option<NoticeView>,
    /// 正在等待下一题
    pub loading: bool,
    /// 没有题目也没有请求在途，可以按 `r` 重新获取
    pub can_refetch: bool,
    pub finished: bool,
}

/// 上下文 → 画面
pub fn screen(ctx: &FlowContext, advance_in_seconds: u64) -> Screen {
    Screen {
        question: question_view(ctx),
        feedback: feedback_view(ctx, advance_in_seconds),
        stats: stats_view(&ctx.progress),
        notice: ctx.notice.as_ref().map(NoticeView::from),
        loading: ctx.state == FlowState::AwaitingQuestion && ctx.fetch_pending,
        can_refetch: ctx.can_refetch(),
        finished: ctx.state.is_terminal(),
    }
}

/// 当前上下文对应的题目视图（无题目时为 None）
pub fn question_view(ctx: &FlowContext) -> Option<QuestionView> {
    let (turn, states) = match &ctx.state {
        FlowState::QuestionDisplayed { turn } => {
            (turn, vec![OptionState::Enabled; turn.question.options.len()])
        }
        FlowState::AnswerSubmitted { turn, selection } => {
            let states = (0..turn.question.options.len())
                .map(|i| {
                    if i == *selection {
                        OptionState::Selected
                    } else {
                        OptionState::Disabled
                    }
                })
                .collect();
            (turn, states)
        }
        FlowState::FeedbackShown {
            turn,
            selection,
            result,
        } => {
            let correct = resolve_correct(&turn.question, &result.correct_answer)
                .or_else(|| result.correct.then_some(*selection));
            (turn, feedback_states(turn.question.options.len(), *selection, correct))
        }
        _ => return None,
    };

    Some(build_question_view(turn, &ctx.progress, states))
}

fn build_question_view(
    turn: &QuestionTurn,
    progress: &SessionProgress,
    states: Vec<OptionState>,
) -> QuestionView {
    let question = &turn.question;
    let options = question
        .options
        .iter()
        .zip(OPTION_LETTERS.iter())
        .zip(states)
        .map(|((text, &letter), state)| OptionView {
            letter,
            text: strip_html(text),
            state,
        })
        .collect();

    QuestionView {
        number: turn.index,
        total: turn.total,
        progress_percent: progress.progress_percent(),
        category: question.category.clone(),
        difficulty: question.difficulty.clone(),
        text: strip_html(&question.text),
        options,
    }
}

/// 服务端给出的正确答案优先，其次是题目自带的
fn resolve_correct(question: &Question, declared: &str) -> Option<usize> {
    question
        .resolve_answer(declared)
        .or_else(|| question.correct_index())
}

fn feedback_states(count: usize, selection: usize, correct: Option<usize>) -> Vec<OptionState> {
    (0..count)
        .map(|i| match correct {
            Some(c) if i == c && i == selection => OptionState::Correct,
            Some(c) if i == c => OptionState::CorrectHighlight,
            _ if i == selection => OptionState::Incorrect,
            _ => OptionState::Disabled,
        })
        .collect()
}

/// 反馈视图（仅在 FeedbackShown 状态下存在）
pub fn feedback_view(ctx: &FlowContext, advance_in_seconds: u64) -> Option<FeedbackView> {
    let FlowState::FeedbackShown { turn, result, .. } = &ctx.state else {
        return None;
    };

    let correct_answer = (!result.correct).then(|| {
        resolve_correct(&turn.question, &result.correct_answer)
            .and_then(|i| turn.question.options.get(i))
            .map(|o| strip_html(o))
            .unwrap_or_else(|| result.correct_answer.clone())
    });

    let explanation = result
        .explanation
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| turn.question.explanation())
        .map(strip_html);

    Some(FeedbackView {
        correct: result.correct,
        correct_answer,
        explanation,
        points: result.points,
        advance_in_seconds,
        is_last: result.is_last,
    })
}

pub fn stats_view(progress: &SessionProgress) -> StatsView {
    StatsView {
        points: progress.points,
        correct: progress.correct,
        answered: progress.answered,
        accuracy_percent: progress.accuracy_percent(),
    }
}

/// 键盘映射：`a`..`e` 或 `1`..`5`
pub fn option_for_key(key: char, option_count: usize) -> Option<usize> {
    let index = match key.to_ascii_lowercase() {
        c @ 'a'..='e' => c as usize - 'a' as usize,
        c @ '1'..='5' => c as usize - '1' as usize,
        _ => return None,
    };
    (index < option_count).then_some(index)
}

/// 去掉 HTML 标签并还原常见实体
pub fn strip_html(text: &str) -> String {
    let mut plain = text.to_string();

    // 块级标签换成空格，其余标签直接去掉
    if let Ok(re) = Regex::new(r"(?i)<\s*/?\s*(br|p|div|li|tr)\b[^>]*>") {
        plain = re.replace_all(&plain, " ").into_owned();
    }
    if let Ok(re) = Regex::new(r"<[^>]*>") {
        plain = re.replace_all(&plain, "").into_owned();
    }

    let decoded = plain
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
