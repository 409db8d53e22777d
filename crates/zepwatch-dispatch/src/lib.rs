//! zepwatch-dispatch: the boundary between notify decisions and the
//! notification surface.
//!
//! The detection side hands [`NotifyPayload`]s to a [`NotifyClient`] and
//! moves on. A spawned [`run_dispatcher`] task turns them into
//! [`Notification`]s for a [`NotificationSink`]. Clicks on a shown
//! notification are routed back through [`TabDirectory`] to a
//! [`FocusRequest`] for the host.

pub mod client;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod focus;
pub mod message;
pub mod outbound;
pub mod sink;

pub use client::NotifyClient;
pub use command::{CommandRunner, CommandSink, SystemCommandRunner};
pub use dispatcher::run_dispatcher;
pub use error::DispatchError;
pub use focus::{FocusRequest, TabDirectory, TabInfo};
pub use message::{DEFAULT_BODY, DEFAULT_TITLE, NotifyPayload, RuntimeMessage};
pub use outbound::Outbound;
pub use sink::{HostSink, Notification, NotificationId, NotificationKind, NotificationSink};
