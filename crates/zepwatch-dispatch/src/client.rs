//! Fire-and-forget sender used by the detection pipeline.

use tokio::sync::mpsc;
use zepwatch_core::NotifyRequest;

use crate::message::{NotifyPayload, RuntimeMessage};

#[derive(Debug, Clone)]
pub struct NotifyClient {
    tx: mpsc::UnboundedSender<RuntimeMessage>,
}

impl NotifyClient {
    /// A client and the receiver to hand to [`crate::run_dispatcher`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RuntimeMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a notification. Never blocks, never fails: if the dispatcher is
    /// gone the message is logged and dropped.
    pub fn notify(&self, title: &str, body: &str) {
        self.send(RuntimeMessage::Notify(NotifyPayload::new(title, body)));
    }

    pub fn notify_request(&self, req: NotifyRequest) {
        self.send(RuntimeMessage::Notify(req.into()));
    }

    fn send(&self, msg: RuntimeMessage) {
        if let Err(e) = self.tx.send(msg) {
            tracing::warn!(msg = ?e.0, "notify dropped: dispatcher gone");
        }
    }
}
