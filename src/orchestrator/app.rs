use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clients::SessionClient;
use crate::config::Config;
use crate::orchestrator::quiz_runner::{QuizOutcome, QuizRunner, UserInput};
use crate::render::TerminalView;
use crate::utils::logging::{append_log_line, init_log_file};
use crate::workflow::answer_flow::{FlowState, Route};

/// 应用主结构
pub struct App {
    config: Config,
    client: Arc<SessionClient>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file, "答题会话日志")?;

        log_startup(&config);

        let client = SessionClient::new(&config).context("创建会话客户端失败")?;

        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    /// 运行答题流程，结束后访问对应的跳转页面
    pub async fn run(&self) -> Result<QuizOutcome> {
        let input = spawn_stdin_reader();
        let runner = QuizRunner::new(self.client.clone(), TerminalView::new(), &self.config);
        let (outcome, _view) = runner.run(input).await;

        let route = route_path(&self.config, outcome.route);
        match self.client.visit(route).await {
            Ok(url) => info!("📄 结果页面: {}", url),
            Err(e) => warn!("⚠️ 访问 {} 失败: {}", route, e),
        }

        print_final_stats(&outcome, &self.config);
        append_log_line(&self.config.output_log_file, &summary_line(&outcome))?;

        Ok(outcome)
    }
}

/// 跳转目标对应的路由
pub fn route_path(config: &Config, route: Route) -> &str {
    match route {
        Route::Finalize => &config.finalize_route,
        Route::Results => &config.results_route,
    }
}

/// 独立线程读取标准输入，避免阻塞运行时退出
fn spawn_stdin_reader() -> mpsc::Receiver<UserInput> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match UserInput::parse(&line) {
                Some(input) => {
                    if tx.blocking_send(input).is_err() {
                        break;
                    }
                }
                None => warn!("⚠️ 无法识别的输入: {}", line.trim()),
            }
        }
    });
    rx
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 答题模式");
    info!("🌐 服务地址: {}", config.base_url);
    if let Some(id) = &config.session_id {
        info!("🔑 会话 ID: {}", id);
    }
    info!(
        "⏱ 轮询间隔: {}ms | 自动下一题: {}s",
        config.timer_poll_interval_ms, config.auto_advance_seconds
    );
    info!("{}", "=".repeat(60));
}

fn describe_end(outcome: &QuizOutcome) -> &'static str {
    match outcome.final_state {
        FlowState::Expired => "时间到",
        _ if outcome.route == Route::Results => "全部完成",
        _ => "提前结束",
    }
}

fn print_final_stats(outcome: &QuizOutcome, config: &Config) {
    let progress = &outcome.progress;
    info!("\n{}", "=".repeat(60));
    info!("📊 答题统计 ({})", describe_end(outcome));
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🏆 得分: {}", progress.points);
    info!("✅ 答对: {}/{}", progress.correct, progress.answered);
    info!("🎯 正确率: {}%", progress.accuracy_percent());
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}

fn summary_line(outcome: &QuizOutcome) -> String {
    let progress = &outcome.progress;
    format!(
        "{} | 题目 {}/{} | 得分 {} | 答对 {}/{} | 正确率 {}%",
        describe_end(outcome),
        progress.index,
        progress.total,
        progress.points,
        progress.correct,
        progress.answered,
        progress.accuracy_percent()
    )
}
