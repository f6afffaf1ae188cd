//! 运行器端到端测试：内存中的会话接口 + 记录画面的视图

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quiz_client::clients::SessionApi;
use quiz_client::config::Config;
use quiz_client::error::{AppError, AppResult};
use quiz_client::models::question::{
    AnswerResult, AnswerSubmission, NextQuestion, Question, QuestionTurn, RemainingTime,
    SubmitOutcome, TimeStatus,
};
use quiz_client::orchestrator::{QuizOutcome, QuizRunner, UserInput};
use quiz_client::render::QuizView;
use quiz_client::workflow::answer_flow::{FlowState, Route};
use quiz_client::workflow::speech::Utterance;
use quiz_client::workflow::view::{OptionState, Screen, TimerView};
use tokio::sync::mpsc;

// ========== 测试替身 ==========

#[derive(Default)]
struct FakeQuiz {
    questions: Mutex<VecDeque<NextQuestion>>,
    verdicts: Mutex<VecDeque<AppResult<SubmitOutcome>>>,
    clock: Mutex<VecDeque<TimeStatus>>,
    submit_delay: Option<Duration>,
    /// 前几次获取题目直接失败
    failing_fetches: Mutex<usize>,
    submitted: Mutex<Vec<AnswerSubmission>>,
    fetches: AtomicUsize,
}

#[async_trait]
impl SessionApi for FakeQuiz {
    async fn fetch_next_question(&self) -> AppResult<NextQuestion> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        {
            let mut failing = self.failing_fetches.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(AppError::request_failed(
                    "/proxima_pergunta",
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"),
                ));
            }
        }
        Ok(self
            .questions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(NextQuestion::EndOfQuiz))
    }

    async fn submit_answer(&self, submission: &AnswerSubmission) -> AppResult<SubmitOutcome> {
        self.submitted.lock().unwrap().push(submission.clone());
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AppError::server("/responder", "sem resposta")))
    }

    async fn poll_remaining_time(&self) -> AppResult<TimeStatus> {
        Ok(self
            .clock
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TimeStatus::Remaining(RemainingTime::from_total(600))))
    }
}

struct RecordingView {
    frames: mpsc::UnboundedSender<Screen>,
    screens: Vec<Screen>,
    timers: Vec<TimerView>,
    spoken: Vec<Utterance>,
}

impl RecordingView {
    fn new(frames: mpsc::UnboundedSender<Screen>) -> Self {
        Self {
            frames,
            screens: Vec::new(),
            timers: Vec::new(),
            spoken: Vec::new(),
        }
    }
}

impl QuizView for RecordingView {
    fn render(&mut self, screen: &Screen) {
        self.screens.push(screen.clone());
        let _ = self.frames.send(screen.clone());
    }

    fn timer(&mut self, timer: &TimerView) {
        self.timers.push(timer.clone());
    }

    fn speak(&mut self, utterance: &Utterance) {
        self.spoken.push(utterance.clone());
    }
}

// ========== 辅助函数 ==========

fn question(correct: &str) -> Question {
    Question {
        text: "Qual é a capital do Brasil?".to_string(),
        options: vec![
            "São Paulo".to_string(),
            "Brasília".to_string(),
            "Rio de Janeiro".to_string(),
            "Salvador".to_string(),
        ],
        correct_answer: correct.to_string(),
        category: "Geografia".to_string(),
        difficulty: "facil".to_string(),
        explanation: None,
        reference: None,
        subject: None,
        topic: None,
    }
}

fn turns(total: usize) -> VecDeque<NextQuestion> {
    (1..=total)
        .map(|index| {
            NextQuestion::Turn(QuestionTurn {
                question: question("Brasília"),
                index,
                total,
                points: 0,
            })
        })
        .collect()
}

fn verdict(correct: bool, points: i64) -> AppResult<SubmitOutcome> {
    Ok(SubmitOutcome::Answered(AnswerResult {
        correct,
        correct_answer: "Brasília".to_string(),
        points,
        explanation: None,
        is_last: false,
    }))
}

fn config() -> Config {
    Config {
        auto_advance_seconds: 3,
        timer_poll_interval_ms: 1000,
        ..Default::default()
    }
}

fn accepts_answer(screen: &Screen) -> bool {
    screen
        .question
        .as_ref()
        .is_some_and(|q| q.options.iter().all(|o| o.state == OptionState::Enabled))
}

/// 启动运行器；`on_frame` 根据每一帧决定要发送的输入
async fn drive<F>(api: Arc<FakeQuiz>, mut on_frame: F) -> (QuizOutcome, RecordingView)
where
    F: FnMut(&Screen) -> Vec<UserInput>,
{
    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel();
    let (input_tx, input_rx) = mpsc::channel(16);
    let runner = QuizRunner::new(api, RecordingView::new(frames_tx), &config());
    let handle = tokio::spawn(runner.run(input_rx));

    while let Some(frame) = frames_rx.recv().await {
        if frame.finished {
            break;
        }
        for input in on_frame(&frame) {
            let _ = input_tx.send(input).await;
        }
    }

    handle.await.unwrap()
}

// ========== 测试 ==========

#[tokio::test(start_paused = true)]
async fn three_of_four_correct_shows_75_percent() {
    let api = Arc::new(FakeQuiz {
        questions: Mutex::new(turns(4)),
        verdicts: Mutex::new(VecDeque::from(vec![
            verdict(true, 10),
            verdict(true, 20),
            verdict(false, 20),
            verdict(true, 30),
        ])),
        ..Default::default()
    });

    let (outcome, view) = drive(api.clone(), |frame| {
        if accepts_answer(frame) {
            vec![UserInput::Key('b')]
        } else {
            vec![]
        }
    })
    .await;

    assert_eq!(outcome.route, Route::Results);
    assert_eq!(outcome.final_state, FlowState::Finished);
    assert_eq!(outcome.progress.answered, 4);
    assert_eq!(outcome.progress.correct, 3);
    assert_eq!(outcome.progress.accuracy_percent(), 75);
    assert_eq!(outcome.progress.points, 30);

    let last = view.screens.last().unwrap();
    assert_eq!(last.stats.accuracy_percent, 75);
    assert_eq!(api.fetches.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn exactly_one_option_marked_correct_in_feedback() {
    let api = Arc::new(FakeQuiz {
        questions: Mutex::new(turns(2)),
        verdicts: Mutex::new(VecDeque::from(vec![verdict(false, 0), verdict(true, 10)])),
        ..Default::default()
    });

    let mut keys = vec!['a', 'b'].into_iter();
    let (_, view) = drive(api, |frame| {
        if accepts_answer(frame) {
            keys.next().map(UserInput::Key).into_iter().collect()
        } else {
            vec![]
        }
    })
    .await;

    let feedback_frames: Vec<_> = view.screens.iter().filter(|s| s.feedback.is_some()).collect();
    assert_eq!(feedback_frames.len(), 2);
    for frame in feedback_frames {
        let question = frame.question.as_ref().unwrap();
        let marked: Vec<_> = question
            .options
            .iter()
            .filter(|o| o.state.marks_correct())
            .collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].text, "Brasília");
    }
}

#[tokio::test(start_paused = true)]
async fn only_first_selection_is_submitted() {
    let api = Arc::new(FakeQuiz {
        questions: Mutex::new(turns(1)),
        verdicts: Mutex::new(VecDeque::from(vec![verdict(false, 0)])),
        submit_delay: Some(Duration::from_millis(500)),
        ..Default::default()
    });

    drive(api.clone(), |frame| {
        if accepts_answer(frame) {
            vec![UserInput::Key('a'), UserInput::Key('c')]
        } else {
            vec![]
        }
    })
    .await;

    let submitted = api.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].selection, "A");
}

#[tokio::test(start_paused = true)]
async fn time_expired_during_pending_submit_redirects_to_finalize() {
    let api = Arc::new(FakeQuiz {
        questions: Mutex::new(turns(3)),
        verdicts: Mutex::new(VecDeque::from(vec![verdict(true, 10)])),
        clock: Mutex::new(VecDeque::from(vec![
            TimeStatus::Remaining(RemainingTime::from_total(2)),
            TimeStatus::TimeExpired,
        ])),
        submit_delay: Some(Duration::from_secs(30)),
        ..Default::default()
    });

    let (outcome, view) = drive(api, |frame| {
        if accepts_answer(frame) {
            vec![UserInput::Key('b')]
        } else {
            vec![]
        }
    })
    .await;

    assert_eq!(outcome.route, Route::Finalize);
    assert_eq!(outcome.final_state, FlowState::Expired);
    assert_eq!(outcome.progress.answered, 0);
    assert!(view.timers.first().is_some_and(|t| t.warning));
}

#[tokio::test(start_paused = true)]
async fn click_and_keypress_advance_only_once() {
    let api = Arc::new(FakeQuiz {
        questions: Mutex::new(turns(2)),
        verdicts: Mutex::new(VecDeque::from(vec![verdict(true, 10), verdict(true, 20)])),
        ..Default::default()
    });

    let (outcome, _) = drive(api.clone(), |frame| {
        if accepts_answer(frame) {
            vec![UserInput::Key('b')]
        } else if frame.feedback.is_some() {
            vec![UserInput::Continue, UserInput::Key('a')]
        } else {
            vec![]
        }
    })
    .await;

    // 初始 1 次 + 每道题前进 1 次
    assert_eq!(api.fetches.load(Ordering::SeqCst), 3);
    assert_eq!(outcome.progress.answered, 2);
    assert_eq!(api.submitted.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn submit_network_error_reenables_options_without_scoring() {
    let api = Arc::new(FakeQuiz {
        questions: Mutex::new(turns(1)),
        verdicts: Mutex::new(VecDeque::from(vec![
            Err(AppError::request_failed(
                "/responder",
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"),
            )),
            verdict(true, 10),
        ])),
        ..Default::default()
    });

    let (outcome, view) = drive(api.clone(), |frame| {
        if accepts_answer(frame) {
            vec![UserInput::Key('b')]
        } else {
            vec![]
        }
    })
    .await;

    let rollback = view
        .screens
        .iter()
        .find(|s| s.notice.is_some())
        .expect("a notice frame after the failed submit");
    assert!(accepts_answer(rollback));
    assert_eq!(rollback.stats.points, 0);
    assert_eq!(rollback.stats.answered, 0);

    assert_eq!(api.submitted.lock().unwrap().len(), 2);
    assert_eq!(outcome.progress.answered, 1);
    assert_eq!(outcome.progress.points, 10);
}

#[tokio::test(start_paused = true)]
async fn quit_and_read_aloud() {
    let api = Arc::new(FakeQuiz {
        questions: Mutex::new(turns(3)),
        ..Default::default()
    });

    let (outcome, view) = drive(api, |frame| {
        if accepts_answer(frame) {
            vec![UserInput::ReadQuestion, UserInput::ReadOptions, UserInput::Quit]
        } else {
            vec![]
        }
    })
    .await;

    assert_eq!(outcome.route, Route::Finalize);
    assert_eq!(view.spoken.len(), 2);
    assert_eq!(view.spoken[0].text, "Qual é a capital do Brasil?");
    assert!(view.spoken[1].text.starts_with("Opção A: São Paulo. Opção B: Brasília"));
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_can_be_retried_after_dismissing_notice() {
    let api = Arc::new(FakeQuiz {
        questions: Mutex::new(turns(2)),
        failing_fetches: Mutex::new(1),
        ..Default::default()
    });

    let (outcome, view) = drive(api.clone(), |frame| {
        if frame.notice.as_ref().is_some_and(|n| n.can_retry) {
            vec![UserInput::Dismiss]
        } else if frame.can_refetch {
            vec![UserInput::Retry]
        } else if accepts_answer(frame) {
            vec![UserInput::Quit]
        } else {
            vec![]
        }
    })
    .await;

    assert_eq!(api.fetches.load(Ordering::SeqCst), 2);
    assert!(view.screens.iter().any(|s| s.notice.is_some()));
    assert!(view
        .screens
        .iter()
        .any(|s| s.question.as_ref().is_some_and(|q| q.number == 1)));
    assert_eq!(outcome.route, Route::Finalize);
    assert_eq!(outcome.progress.index, 1);
}
