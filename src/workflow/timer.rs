//! 剩余时间轮询
//!
//! 独立任务，按固定间隔查询服务端；本地不保存权威时钟。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clients::SessionApi;
use crate::models::question::TimeStatus;
use crate::workflow::view::TimerView;

/// 计时器发出的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Tick(TimerView),
    Expired,
}

/// 倒计时显示状态：警告一旦出现就保持
#[derive(Debug, Clone, Default)]
pub struct TimerState {
    warning_threshold: u64,
    warning: bool,
}

impl TimerState {
    pub fn new(warning_threshold: u64) -> Self {
        Self {
            warning_threshold,
            warning: false,
        }
    }

    /// 处理一次轮询结果
    pub fn apply(&mut self, status: TimeStatus) -> TimerEvent {
        match status {
            TimeStatus::Remaining(remaining) if remaining.total_seconds > 0 => {
                if remaining.total_seconds <= self.warning_threshold {
                    self.warning = true;
                }
                TimerEvent::Tick(TimerView::new(&remaining, self.warning))
            }
            _ => TimerEvent::Expired,
        }
    }

    pub fn warning(&self) -> bool {
        self.warning
    }
}

/// 启动轮询任务；到期或接收端关闭后结束
pub fn spawn_timer(
    api: Arc<dyn SessionApi>,
    interval: Duration,
    warning_threshold: u64,
    tx: mpsc::UnboundedSender<TimerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut state = TimerState::new(warning_threshold);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let status = match api.poll_remaining_time().await {
                Ok(status) => status,
                Err(e) => {
                    warn!("⚠️ 查询剩余时间失败: {}", e);
                    continue;
                }
            };

            let event = state.apply(status);
            let expired = event == TimerEvent::Expired;
            if expired {
                info!("⏰ 时间到");
            } else {
                debug!("⏱ {:?}", event);
            }

            if tx.send(event).is_err() || expired {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::models::question::{
        AnswerSubmission, NextQuestion, RemainingTime, SubmitOutcome,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedClock {
        polls: Mutex<VecDeque<AppResult<TimeStatus>>>,
    }

    #[async_trait]
    impl SessionApi for ScriptedClock {
        async fn fetch_next_question(&self) -> AppResult<NextQuestion> {
            Ok(NextQuestion::EndOfQuiz)
        }

        async fn submit_answer(&self, _: &AnswerSubmission) -> AppResult<SubmitOutcome> {
            Ok(SubmitOutcome::TimeExpired)
        }

        async fn poll_remaining_time(&self) -> AppResult<TimeStatus> {
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(TimeStatus::TimeExpired))
        }
    }

    fn remaining(total: u64) -> AppResult<TimeStatus> {
        Ok(TimeStatus::Remaining(RemainingTime::from_total(total)))
    }

    #[test]
    fn warning_is_sticky() {
        let mut state = TimerState::new(120);
        state.apply(TimeStatus::Remaining(RemainingTime::from_total(121)));
        assert!(!state.warning());
        state.apply(TimeStatus::Remaining(RemainingTime::from_total(120)));
        assert!(state.warning());
        let event = state.apply(TimeStatus::Remaining(RemainingTime::from_total(300)));
        assert!(matches!(event, TimerEvent::Tick(TimerView { warning: true, .. })));
    }

    #[test]
    fn zero_seconds_counts_as_expired() {
        let mut state = TimerState::new(120);
        assert_eq!(
            state.apply(TimeStatus::Remaining(RemainingTime::from_total(0))),
            TimerEvent::Expired
        );
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_expired_and_skips_errors() {
        let clock = ScriptedClock {
            polls: Mutex::new(VecDeque::from(vec![
                remaining(125),
                Err(AppError::server("/tempo_restante", "falha")),
                remaining(119),
                Ok(TimeStatus::TimeExpired),
            ])),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_timer(Arc::new(clock), Duration::from_secs(1), 120, tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        handle.await.unwrap();

        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            TimerEvent::Tick(TimerView { display, warning: false, .. }) if display == "02:05"
        ));
        assert!(matches!(
            &events[1],
            TimerEvent::Tick(TimerView { warning: true, .. })
        ));
        assert_eq!(events[2], TimerEvent::Expired);
    }
}
