// Decision making and the scheduling loop
pub mod bot;
pub mod engine;
pub mod scheduler;

pub use bot::{BotTask, TradingBot};
pub use engine::{Decision, DecisionAction, DecisionEngine, DecisionState, RejectionReason};
pub use scheduler::{ScheduledTask, Scheduler, TaskRunner};
