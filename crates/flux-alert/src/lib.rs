//! 告警评估引擎
//!
//! 周期性读取每个资源的最近指标，按条件求值、跟踪触发状态，
//! 并按提醒列表向核心服务发送通知。

pub mod aggregator;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod poller;
pub mod resolver;
pub mod scheduler;
pub mod store;
pub mod tracker;
pub mod units;

pub use aggregator::compute;
pub use error::{AlertError, Result};
pub use evaluator::{EvaluatorSettings, ResourceEvaluator, ResourceReport};
pub use model::{Aggregate, Condition, Operator, Resource, RuleRef, Rules};
pub use poller::{AlertService, PassReport};
pub use resolver::SeriesResolver;
pub use scheduler::{NotificationScheduler, NotifyOutcome, DEFAULT_REMINDERS};
pub use store::{AlertStore, FileStore, MemoryStore, ResourceLock};
pub use tracker::{track, Transition};
pub use units::UnitTable;
