//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责组装各层并驱动运行，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 答题应用
//! - 管理应用生命周期（初始化日志、运行、输出统计）
//! - 读取标准输入
//! - 结束后访问结束页 / 结果页
//!
//! ### `quiz_runner` - 答题运行器
//! - 持有 AnswerFlow 状态机
//! - 执行副作用（请求、自动前进、渲染）
//! - 合并用户输入、计时器、网络结果
//!
//! ### `admin` - 管理端命令
//! - 登录后执行单条题库管理命令
//!
//! ## 层次关系
//!
//! ```text
//! app (生命周期 + 输入输出)
//!     ↓
//! quiz_runner (事件循环)
//!     ↓
//! workflow::AnswerFlow (纯状态转移)
//!     ↓
//! clients (SessionApi / AdminClient)
//! ```

pub mod admin;
pub mod app;
pub mod quiz_runner;

// 重新导出主要类型
pub use admin::run_admin;
pub use app::App;
pub use quiz_runner::{QuizOutcome, QuizRunner, UserInput};
