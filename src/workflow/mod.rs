pub mod admin_form;
pub mod advance;
pub mod answer_flow;
pub mod speech;
pub mod timer;
pub mod view;

pub use admin_form::{AdminForm, FormMode, FormRequest};
pub use advance::AdvanceHandle;
pub use answer_flow::{transition, AnswerFlow, Effect, FlowContext, FlowEvent, FlowState, Route};
pub use timer::{spawn_timer, TimerEvent};
pub use view::{screen, FeedbackView, OptionState, QuestionView, Screen, StatsView, TimerView};
