//! 答题运行器
//!
//! 单任务事件循环：持有状态机，执行它返回的副作用，
//! 并把用户输入、计时器、网络结果合并为状态机事件。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::clients::SessionApi;
use crate::config::Config;
use crate::models::question::NextQuestion;
use crate::models::session::SessionProgress;
use crate::render::QuizView;
use crate::utils::truncate_text;
use crate::workflow::advance::AdvanceHandle;
use crate::workflow::answer_flow::{AnswerFlow, Effect, FlowEvent, FlowState, Route};
use crate::workflow::speech::{options_utterance, question_utterance};
use crate::workflow::timer::{spawn_timer, TimerEvent};
use crate::workflow::view::{option_for_key, screen};

/// 用户输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    /// 选项键 `a`..`e` / `1`..`5`
    Key(char),
    Retry,
    Dismiss,
    ReadQuestion,
    ReadOptions,
    /// 回车：跳过倒计时
    Continue,
    Quit,
}

impl UserInput {
    /// 解析一行终端输入
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut chars = line.chars();
        let Some(c) = chars.next() else {
            return Some(UserInput::Continue);
        };
        if chars.next().is_some() {
            return None;
        }
        match c.to_ascii_lowercase() {
            'r' => Some(UserInput::Retry),
            'x' => Some(UserInput::Dismiss),
            'l' => Some(UserInput::ReadQuestion),
            'o' => Some(UserInput::ReadOptions),
            'q' => Some(UserInput::Quit),
            c @ ('a'..='e' | '1'..='5') => Some(UserInput::Key(c)),
            _ => None,
        }
    }
}

/// 一次答题会话的结果
#[derive(Debug, Clone, PartialEq)]
pub struct QuizOutcome {
    /// 需要跳转的页面
    pub route: Route,
    pub final_state: FlowState,
    pub progress: SessionProgress,
}

/// 答题运行器
pub struct QuizRunner<V: QuizView> {
    api: Arc<dyn SessionApi>,
    view: V,
    flow: AnswerFlow,
    advance: Option<AdvanceHandle>,
    advance_delay: Duration,
    poll_interval: Duration,
    warning_threshold: u64,
}

impl<V: QuizView> QuizRunner<V> {
    pub fn new(api: Arc<dyn SessionApi>, view: V, config: &Config) -> Self {
        Self {
            api,
            view,
            flow: AnswerFlow::new(),
            advance: None,
            advance_delay: config.auto_advance_delay(),
            poll_interval: config.poll_interval(),
            warning_threshold: config.timer_warning_seconds,
        }
    }

    /// 运行直到跳转；输入通道关闭视为退出
    pub async fn run(mut self, mut input: mpsc::Receiver<UserInput>) -> (QuizOutcome, V) {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<FlowEvent>();
        let (timer_tx, mut timer_rx) = mpsc::unbounded_channel::<TimerEvent>();
        let timer = spawn_timer(
            self.api.clone(),
            self.poll_interval,
            self.warning_threshold,
            timer_tx,
        );

        info!("▶️ 开始答题");
        let start = self.flow.start();
        let mut redirect = self.execute(start, &events_tx);

        while redirect.is_none() {
            tokio::select! {
                Some(event) = events_rx.recv() => {
                    redirect = self.dispatch(event, &events_tx);
                }
                Some(tick) = timer_rx.recv() => {
                    redirect = match tick {
                        TimerEvent::Tick(view) => {
                            self.view.timer(&view);
                            None
                        }
                        TimerEvent::Expired => self.dispatch(FlowEvent::TimeExpired, &events_tx),
                    };
                }
                received = input.recv() => {
                    redirect = match received {
                        Some(user_input) => self.on_input(user_input, &events_tx),
                        None => {
                            debug!("输入已关闭");
                            self.dispatch(FlowEvent::Quit, &events_tx)
                        }
                    };
                }
            }
        }

        timer.abort();
        if let Some(handle) = self.advance.take() {
            handle.cancel();
        }

        let route = redirect.unwrap_or(Route::Finalize);
        let ctx = self.flow.context();
        let outcome = QuizOutcome {
            route,
            final_state: ctx.state.clone(),
            progress: ctx.progress.clone(),
        };
        (outcome, self.view)
    }

    fn dispatch(
        &mut self,
        event: FlowEvent,
        events_tx: &mpsc::UnboundedSender<FlowEvent>,
    ) -> Option<Route> {
        debug!("事件: {:?}", event);
        let effects = self.flow.handle(event);
        self.execute(effects, events_tx)
    }

    fn execute(
        &mut self,
        effects: Vec<Effect>,
        events_tx: &mpsc::UnboundedSender<FlowEvent>,
    ) -> Option<Route> {
        let mut redirect = None;

        for effect in effects {
            match effect {
                Effect::FetchNextQuestion => {
                    let api = self.api.clone();
                    let tx = events_tx.clone();
                    tokio::spawn(async move {
                        let event = match api.fetch_next_question().await {
                            Ok(next) => {
                                if let NextQuestion::Turn(turn) = &next {
                                    info!(
                                        "📥 第 {}/{} 题: {}",
                                        turn.index,
                                        turn.total,
                                        truncate_text(&turn.question.text, 40)
                                    );
                                }
                                FlowEvent::QuestionLoaded(next)
                            }
                            Err(e) => {
                                warn!("⚠️ 获取题目失败: {}", e);
                                FlowEvent::FetchFailed(e.user_message())
                            }
                        };
                        let _ = tx.send(event);
                    });
                }
                Effect::SubmitAnswer(submission) => {
                    let api = self.api.clone();
                    let tx = events_tx.clone();
                    tokio::spawn(async move {
                        let turn = submission.turn;
                        let event = match api.submit_answer(&submission).await {
                            Ok(outcome) => FlowEvent::SubmitCompleted { turn, outcome },
                            Err(e) => {
                                warn!("⚠️ 提交答案失败: {}", e);
                                FlowEvent::SubmitFailed {
                                    turn,
                                    message: e.user_message(),
                                }
                            }
                        };
                        let _ = tx.send(event);
                    });
                }
                Effect::ScheduleAdvance => {
                    if let Some(previous) = self.advance.take() {
                        previous.cancel();
                    }
                    self.advance = Some(AdvanceHandle::schedule(
                        self.advance_delay,
                        events_tx.clone(),
                        FlowEvent::AdvanceRequested,
                    ));
                }
                Effect::CancelAdvance => {
                    if let Some(handle) = self.advance.take() {
                        handle.cancel();
                    }
                }
                Effect::Redirect(route) => {
                    info!("↪ 跳转: {:?}", route);
                    redirect = Some(route);
                }
                Effect::Render => {
                    let frame = screen(self.flow.context(), self.advance_delay.as_secs());
                    self.view.render(&frame);
                }
            }
        }

        redirect
    }

    fn on_input(
        &mut self,
        input: UserInput,
        events_tx: &mpsc::UnboundedSender<FlowEvent>,
    ) -> Option<Route> {
        if input == UserInput::Quit {
            return self.dispatch(FlowEvent::Quit, events_tx);
        }

        // 反馈阶段任何按键都视为跳过倒计时
        if matches!(self.flow.state(), FlowState::FeedbackShown { .. }) {
            let won = match &self.advance {
                Some(handle) => handle.interrupt(),
                None => true,
            };
            return if won {
                self.dispatch(FlowEvent::AdvanceRequested, events_tx)
            } else {
                None
            };
        }

        match input {
            UserInput::Key(key) => {
                let count = self
                    .flow
                    .state()
                    .turn()
                    .map(|t| t.question.options.len())?;
                let option = option_for_key(key, count)?;
                self.dispatch(FlowEvent::OptionSelected(option), events_tx)
            }
            UserInput::Retry => self.dispatch(FlowEvent::Retry, events_tx),
            UserInput::Dismiss => self.dispatch(FlowEvent::DismissNotice, events_tx),
            UserInput::ReadQuestion | UserInput::ReadOptions => {
                if let Some(turn) = self.flow.state().turn() {
                    let utterance = if input == UserInput::ReadQuestion {
                        question_utterance(&turn.question)
                    } else {
                        options_utterance(&turn.question)
                    };
                    self.view.speak(&utterance);
                }
                None
            }
            UserInput::Continue | UserInput::Quit => None,
        }
    }
}
