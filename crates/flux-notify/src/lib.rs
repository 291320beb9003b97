pub mod error;
pub mod message;
pub mod notifier;
pub mod providers;

pub use error::{NotifyError, Result};
pub use message::AlertNotification;
pub use notifier::Notifier;
pub use providers::{CoreNotifier, CoreNotifierConfig};
