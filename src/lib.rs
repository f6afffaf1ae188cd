//! # Quiz Client
//!
//! 测验服务的命令行客户端：答题流程 + 题库管理
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 只负责发请求、解析响应，不做重试
//! - `SessionApi` / `SessionClient` - 下一题、提交答案、剩余时间
//! - `AdminClient` - 题库、备份管理接口
//!
//! ### ② 数据层（Models）
//! - `models/` - 题目、会话进度、管理端数据结构、题库文件加载
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一轮答题"的状态转移，全部是纯逻辑
//! - `AnswerFlow` - 状态机（选择 → 提交 → 反馈 → 下一题）
//! - `AdvanceHandle` - 一次性可取消的自动前进
//! - `timer` - 剩余时间轮询
//! - `view` / `speech` - 视图模型与朗读文本
//! - `AdminForm` - 新增 / 编辑题目的表单
//!
//! ### ④ 展示层（Render）
//! - `render/` - `QuizView` trait 与终端实现
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/quiz_runner` - 事件循环，执行状态机的副作用
//! - `orchestrator/app` - 应用生命周期
//! - `orchestrator/admin` - 管理端命令
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{AdminClient, SessionApi, SessionClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::question::Question;
pub use orchestrator::{run_admin, App, QuizOutcome, QuizRunner};
pub use render::{QuizView, TerminalView};
pub use utils::logger;
pub use workflow::{AnswerFlow, FlowEvent, FlowState};
