//! `zepwatch run`: the event loop.
//!
//! The session lives on this task; everything that may block (the initial
//! store read, notifier commands) runs elsewhere and reports back.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use zepwatch_core::{PipelineContext, Settings};
use zepwatch_dispatch::{
    CommandSink, HostSink, NotificationSink, NotifyClient, Outbound, TabDirectory, run_dispatcher,
};
use zepwatch_store::KvStore;

use crate::cli::{RunOpts, SinkKind};
use crate::session::{InitialLoad, Session};

/// Wall clock in unix milliseconds.
pub fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

pub async fn run(opts: RunOpts, store: Arc<dyn KvStore>) -> anyhow::Result<()> {
    let started_at_ms = now_ms();

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_outbound(out_rx));

    let sink: Arc<dyn NotificationSink> = match opts.sink {
        SinkKind::Host => Arc::new(HostSink::new(out_tx.clone())),
        SinkKind::Command => Arc::new(CommandSink::new(opts.notify_command.clone())),
    };
    let (notifier, notify_rx) = NotifyClient::channel();
    let dispatcher = tokio::spawn(run_dispatcher(notify_rx, sink, opts.icon.clone()));

    let ctx = PipelineContext::new(Settings::default(), started_at_ms, opts.warmup_ms);
    let mut session = Session::new(
        ctx,
        TabDirectory::new(opts.tab_url_prefix.clone()),
        notifier,
        out_tx,
        Arc::clone(&store),
    );

    // Early batches may arrive before this resolves; the self filter stays
    // off until it does.
    let load_store = Arc::clone(&store);
    let mut initial_load = tokio::task::spawn_blocking(move || InitialLoad::read(&load_store));
    let mut loaded = false;

    let mut changes = store.subscribe();
    let mut changes_open = true;
    let mut store_poll = tokio::time::interval(Duration::from_millis(opts.store_poll_ms.max(1)));
    store_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let warmup_left = session.warmup_deadline_ms().saturating_sub(now_ms());
    let warmup = tokio::time::sleep(Duration::from_millis(warmup_left));
    tokio::pin!(warmup);
    let mut warmed = false;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    tracing::info!(sink = ?opts.sink, warmup_ms = opts.warmup_ms, "observer running");

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => session.handle_line(&line, now_ms()),
                Ok(None) => {
                    tracing::info!("host closed the feed");
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::warn!(error = %e, "skipping undecodable feed line");
                }
                Err(e) => {
                    tracing::error!(error = %e, "feed read failed");
                    break;
                }
            },
            res = &mut initial_load, if !loaded => {
                loaded = true;
                match res {
                    Ok(load) => session.apply_initial_load(load),
                    Err(e) => tracing::warn!(error = %e, "initial store read failed"),
                }
            }
            () = &mut warmup, if !warmed => {
                warmed = true;
                session.tick(now_ms());
            }
            res = changes.recv(), if changes_open => match res {
                Ok(changed) => session.on_store_changes(&changed),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "store notifications lagged, reloading");
                    session.reload_from_store();
                }
                Err(RecvError::Closed) => changes_open = false,
            },
            _ = store_poll.tick() => {
                if let Err(e) = store.refresh() {
                    tracing::warn!(error = %e, "store refresh failed");
                }
            }
        }
    }

    let notified = session.notified();
    let seen = session.context().seen_count();
    // Dropping the session closes the notify channel, which ends the
    // dispatcher; the host sink's sender goes with it, which ends the writer.
    drop(session);
    match dispatcher.await {
        Ok(delivered) => tracing::info!(seen, notified, delivered, "observer stopped"),
        Err(e) => tracing::warn!(error = %e, "dispatcher task failed"),
    }
    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "host writer failed"),
        Err(e) => tracing::warn!(error = %e, "host writer task failed"),
    }
    Ok(())
}

/// Write outbound messages to stdout, one JSON object per line.
async fn write_outbound(mut rx: mpsc::UnboundedReceiver<Outbound>) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(msg) = rx.recv().await {
        let mut line = match serde_json::to_string(&msg) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "unserializable outbound message");
                continue;
            }
        };
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                let _ = ctrl_c.await;
                tracing::info!("received ctrl-c, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        tracing::info!("received ctrl-c, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_unix_millis() {
        // 2020-01-01T00:00:00Z
        assert!(now_ms() > 1_577_836_800_000);
    }

    #[tokio::test]
    async fn writer_emits_ndjson_until_senders_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(write_outbound(rx));
        tx.send(Outbound::Focus(zepwatch_dispatch::FocusRequest {
            window_id: 1,
            tab_id: 2,
        }))
        .expect("send");
        drop(tx);
        task.await.expect("join").expect("write");
    }
}
