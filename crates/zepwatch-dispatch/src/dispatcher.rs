//! The dispatch loop: notify messages in, sink calls out.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::message::RuntimeMessage;
use crate::sink::{Notification, NotificationKind, NotificationSink};

/// Drain `rx` until every [`crate::NotifyClient`] is dropped.
///
/// Defaults are re-applied here, at the boundary. Sink calls run on the
/// blocking pool, one at a time, so a slow notifier command never stalls
/// the caller's runtime thread. Sink failures are logged and dropped.
/// Returns the number of notifications the sink accepted.
pub async fn run_dispatcher<S>(
    mut rx: mpsc::UnboundedReceiver<RuntimeMessage>,
    sink: Arc<S>,
    icon_url: String,
) -> usize
where
    S: NotificationSink + ?Sized + 'static,
{
    let mut delivered = 0;
    while let Some(msg) = rx.recv().await {
        let RuntimeMessage::Notify(payload) = msg;
        let payload = payload.with_defaults();
        let notification = Notification {
            kind: NotificationKind::Basic,
            icon_url: icon_url.clone(),
            title: payload.title,
            message: payload.body,
        };

        let sink = Arc::clone(&sink);
        let title = notification.title.clone();
        match tokio::task::spawn_blocking(move || sink.create(&notification)).await {
            Ok(Ok(id)) => {
                delivered += 1;
                tracing::debug!(%id, %title, "notification created");
            }
            Ok(Err(e)) => tracing::warn!(error = %e, %title, "notification dropped"),
            Err(e) => tracing::warn!(error = %e, %title, "notification sink panicked"),
        }
    }
    tracing::info!(delivered, "dispatcher stopped");
    delivered
}
