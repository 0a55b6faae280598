/// Alert dispatch, cooldown tracking and delivery
pub mod cooldown;
pub mod dispatcher;
pub mod messages;
pub mod slack;

pub use cooldown::CooldownTracker;
pub use dispatcher::AlertDispatcher;
pub use slack::{Notifier, SlackNotifier};
