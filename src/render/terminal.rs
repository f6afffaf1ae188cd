use std::io::{self, Write};

use crate::render::QuizView;
use crate::workflow::speech::Utterance;
use crate::workflow::view::{OptionState, OptionView, Screen, TimerView};

/// 标准输出上的答题界面
pub struct TerminalView<W: Write + Send = io::Stdout> {
    out: W,
    last_timer: Option<TimerView>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            last_timer: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_screen(&mut self, screen: &Screen) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "\n{}", "=".repeat(60))?;
        writeln!(
            out,
            "🏆 {} pontos | ✅ {} acertos | 🎯 {}%",
            screen.stats.points, screen.stats.correct, screen.stats.accuracy_percent
        )?;
        if let Some(timer) = &self.last_timer {
            let icon = if timer.warning { "⚠️" } else { "⏱" };
            writeln!(out, "{} {}", icon, timer.display)?;
        }
        writeln!(out, "{}", "=".repeat(60))?;

        if screen.finished {
            writeln!(out, "🏁 Quiz encerrado")?;
            return out.flush();
        }

        if screen.loading {
            writeln!(out, "⏳ Carregando próxima pergunta...")?;
        } else if screen.can_refetch && screen.notice.is_none() {
            writeln!(out, "[r] carregar a próxima pergunta  [q] sair")?;
        }

        if let Some(question) = &screen.question {
            writeln!(
                out,
                "Pergunta {}/{} ({:.0}%)  [{}] [{}]",
                question.number,
                question.total,
                question.progress_percent,
                question.category,
                question.difficulty
            )?;
            writeln!(out, "\n{}\n", question.text)?;
            for option in &question.options {
                writeln!(out, "{}", option_line(option))?;
            }
        }

        if let Some(feedback) = &screen.feedback {
            writeln!(out)?;
            if feedback.correct {
                writeln!(out, "✅ Correto!")?;
            } else {
                writeln!(out, "❌ Incorreto!")?;
                if let Some(answer) = &feedback.correct_answer {
                    writeln!(out, "Resposta correta: {}", answer)?;
                }
            }
            if let Some(explanation) = &feedback.explanation {
                writeln!(out, "💡 {}", explanation)?;
            }
            if feedback.is_last {
                writeln!(out, "Última pergunta. Pressione Enter para ver o resultado.")?;
            } else {
                writeln!(
                    out,
                    "Próxima pergunta em {}s (Enter para continuar)",
                    feedback.advance_in_seconds
                )?;
            }
        }

        if let Some(notice) = &screen.notice {
            writeln!(out, "\n⚠️ {}", notice.message)?;
            if notice.can_retry {
                writeln!(out, "   [r] tentar novamente  [x] fechar")?;
            } else {
                writeln!(out, "   [x] fechar")?;
            }
        }

        if screen.question.is_some() && screen.feedback.is_none() {
            writeln!(out, "\n[a-e / 1-5] responder  [l] ler pergunta  [o] ler opções  [q] sair")?;
        }
        out.flush()
    }
}

impl<W: Write + Send> TerminalView<W> {
    /// 每次轮询一行倒计时；跨入警告区间时额外提示一次
    fn write_timer(&mut self, timer: &TimerView) -> io::Result<()> {
        let entered_warning =
            timer.warning && !self.last_timer.as_ref().is_some_and(|t| t.warning);
        if entered_warning {
            writeln!(self.out, "⚠️ Restam {} !", timer.display)?;
        }
        let icon = if timer.warning { "⚠️" } else { "⏱" };
        writeln!(self.out, "{} {}", icon, timer.display)?;
        self.out.flush()
    }
}

fn option_line(option: &OptionView) -> String {
    let marker = match option.state {
        OptionState::Enabled => "  ",
        OptionState::Disabled => "  ",
        OptionState::Selected => "👉",
        OptionState::Correct => "✅",
        OptionState::Incorrect => "❌",
        OptionState::CorrectHighlight => "✔️",
    };
    format!("{} {}) {}", marker, option.letter, option.text)
}

impl<W: Write + Send> QuizView for TerminalView<W> {
    fn render(&mut self, screen: &Screen) {
        if let Err(e) = self.write_screen(screen) {
            tracing::warn!("⚠️ 输出失败: {}", e);
        }
    }

    fn timer(&mut self, timer: &TimerView) {
        if let Err(e) = self.write_timer(timer) {
            tracing::warn!("⚠️ 输出失败: {}", e);
        }
        self.last_timer = Some(timer.clone());
    }

    fn speak(&mut self, utterance: &Utterance) {
        let written = writeln!(
            self.out,
            "🔊 [{} x{}] {}",
            utterance.lang, utterance.rate, utterance.text
        );
        if let Err(e) = written {
            tracing::warn!("⚠️ 输出失败: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::NextQuestion;
    use crate::models::test_support::turn;
    use crate::workflow::answer_flow::{AnswerFlow, FlowEvent};
    use crate::workflow::view::screen;

    fn rendered(flow: &AnswerFlow) -> String {
        let mut view = TerminalView::with_writer(Vec::new());
        view.render(&screen(flow.context(), 3));
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn renders_question_and_options() {
        let mut flow = AnswerFlow::new();
        flow.handle(FlowEvent::QuestionLoaded(NextQuestion::Turn(turn(1, 10))));
        let text = rendered(&flow);
        assert!(text.contains("Pergunta 1/10"));
        assert!(text.contains("B) Brasília"));
    }

    #[test]
    fn warning_is_announced_once() {
        let mut view = TerminalView::with_writer(Vec::new());
        let tick = |total: u64| TimerView {
            display: format!("00:{:02}", total),
            warning: true,
            total_seconds: total,
        };
        view.timer(&tick(59));
        view.timer(&tick(58));
        let text = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(text.matches("Restam").count(), 1);
    }

    #[test]
    fn every_tick_prints_countdown() {
        let mut view = TerminalView::with_writer(Vec::new());
        for (total, display) in [(600, "10:00"), (599, "09:59")] {
            view.timer(&TimerView {
                display: display.to_string(),
                warning: false,
                total_seconds: total,
            });
        }
        let text = String::from_utf8(view.into_inner()).unwrap();
        assert!(text.contains("⏱ 10:00"));
        assert!(text.contains("⏱ 09:59"));
    }

    #[test]
    fn write_errors_are_swallowed_after_logging() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut view = TerminalView::with_writer(Broken);
        let tick = TimerView {
            display: "00:30".to_string(),
            warning: true,
            total_seconds: 30,
        };
        view.timer(&tick);
        view.speak(&Utterance::new("Olá"));
        // 输出失败不影响计时状态
        assert_eq!(view.last_timer, Some(tick));
    }

    #[test]
    fn dismissed_fetch_failure_shows_refetch_hint() {
        let mut flow = AnswerFlow::new();
        flow.start();
        flow.handle(FlowEvent::FetchFailed("timeout".to_string()));
        flow.handle(FlowEvent::DismissNotice);
        let text = rendered(&flow);
        assert!(text.contains("[r] carregar a próxima pergunta"));
        assert!(!text.contains("Carregando"));
    }
}
