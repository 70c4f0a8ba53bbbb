//! Hearth event bus and push notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope.
//! - [`delivery`]: the push gateway client and its transport seam.
//! - [`PushWorker`]: bus consumer that dispatches push batches.
//! - [`ReminderScheduler`]: periodic due-task reminder producer.

pub mod bus;
pub mod delivery;
pub mod reminder;
pub mod worker;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::push::PushDelivery;
pub use delivery::{DeliveryReport, PushTransport};
pub use reminder::{ReminderConfig, ReminderScheduler};
pub use worker::PushWorker;
