//! 自动进入下一题的计时句柄
//!
//! 超时和用户打断（点击 / 按键）共用同一个句柄，
//! 无论哪一方先到，只有一方能拿到触发权。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// 一次性、可取消的延迟触发
#[derive(Debug)]
pub struct AdvanceHandle {
    done: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl AdvanceHandle {
    /// 在 `delay` 之后把 `event` 发送到 `tx`（除非先被取消或打断）
    pub fn schedule<T>(delay: Duration, tx: mpsc::UnboundedSender<T>, event: T) -> Self
    where
        T: Send + 'static,
    {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if claim(&flag) {
                debug!("⏭ 自动进入下一题");
                let _ = tx.send(event);
            }
        });
        Self { done, task }
    }

    /// 用户打断：抢到触发权返回 true，调用方负责前进
    pub fn interrupt(&self) -> bool {
        let won = claim(&self.done);
        if won {
            self.task.abort();
        }
        won
    }

    /// 取消；重复调用无副作用
    pub fn cancel(&self) {
        claim(&self.done);
        self.task.abort();
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

impl Drop for AdvanceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn claim(flag: &AtomicBool) -> bool {
    flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = AdvanceHandle::schedule(Duration::from_secs(3), tx, "advance");

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(rx.recv().await, Some("advance"));
        assert!(handle.is_done());
        assert!(!handle.interrupt());
    }

    #[tokio::test(start_paused = true)]
    async fn click_and_keypress_in_same_tick_fire_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = AdvanceHandle::schedule(Duration::from_secs(3), tx, "advance");

        let click = handle.interrupt();
        let keypress = handle.interrupt();
        assert!(click);
        assert!(!keypress);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = AdvanceHandle::schedule(Duration::from_secs(1), tx, ());
        handle.cancel();
        handle.cancel();
        assert!(!handle.interrupt());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }
}
