//! 展示层
//!
//! 运行器只通过 [`QuizView`] 输出画面，终端实现见 [`TerminalView`]。

pub mod terminal;

use crate::workflow::speech::Utterance;
use crate::workflow::view::{Screen, TimerView};

pub use terminal::TerminalView;

/// 答题界面
pub trait QuizView: Send {
    /// 重绘整屏
    fn render(&mut self, screen: &Screen);

    /// 更新倒计时
    fn timer(&mut self, timer: &TimerView);

    /// 朗读
    fn speak(&mut self, utterance: &Utterance);
}
