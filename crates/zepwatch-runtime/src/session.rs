//! One watched page: the render tree, the pipeline and the host-facing glue.
//!
//! Everything here is synchronous and single-threaded. The run loop feeds
//! it lines, store changes and clock ticks; it never awaits.

use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::mpsc;
use zepwatch_core::warmup::WarmupState;
use zepwatch_core::{
    Decision, Document, Element, MutationBatch, PipelineContext, Settings, UiEvent, UiEventKind,
};
use zepwatch_dispatch::{NotifyClient, Outbound, TabDirectory};
use zepwatch_store::namespace::{self, touches_identity, touches_settings};
use zepwatch_store::{ChangeSet, KvStore};

use crate::feed::{self, FeedError, HostEvent};

/// Identity and settings read from the store at startup.
#[derive(Debug, Clone, Default)]
pub struct InitialLoad {
    pub identity: Option<String>,
    pub settings: Settings,
}

impl InitialLoad {
    pub fn read(store: &impl KvStore) -> Self {
        Self {
            identity: namespace::read_identity(store),
            settings: namespace::read_settings(store),
        }
    }
}

pub struct Session {
    doc: Document,
    ctx: PipelineContext,
    tabs: TabDirectory,
    notifier: NotifyClient,
    outbound: mpsc::UnboundedSender<Outbound>,
    store: Arc<dyn KvStore>,
    notified: u64,
}

impl Session {
    pub fn new(
        ctx: PipelineContext,
        tabs: TabDirectory,
        notifier: NotifyClient,
        outbound: mpsc::UnboundedSender<Outbound>,
        store: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            doc: Document::new(),
            ctx,
            tabs,
            notifier,
            outbound,
            store,
            notified: 0,
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    pub fn notified(&self) -> u64 {
        self.notified
    }

    /// Handle one feed line. Errors are logged and the line is skipped.
    pub fn handle_line(&mut self, line: &str, now_ms: u64) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if let Err(e) = self.handle_event_line(line, now_ms) {
            tracing::warn!(error = %e, "skipping feed line");
        }
    }

    fn handle_event_line(&mut self, line: &str, now_ms: u64) -> Result<(), FeedError> {
        match feed::parse_line(line)? {
            HostEvent::Snapshot { root } => {
                self.doc = Document::from_spec(&root)?;
                self.ctx.prime(&self.doc);
                // Let the hook see a form that was already on screen.
                self.observe(&MutationBatch::new(), now_ms);
            }
            HostEvent::Mutations { records } => {
                let batch = feed::apply_mutations(&mut self.doc, records);
                self.observe(&batch, now_ms);
            }
            HostEvent::Ui {
                target,
                kind,
                key,
                value,
            } => self.on_ui(&target, kind, key.as_deref(), value.as_deref())?,
            HostEvent::Tabs { tabs } => {
                tracing::debug!(tabs = tabs.len(), "tab list updated");
                self.tabs.replace(tabs);
            }
            HostEvent::NotificationClicked { id } => self.on_notification_clicked(id.as_deref()),
        }
        Ok(())
    }

    fn observe(&mut self, batch: &MutationBatch, now_ms: u64) {
        for decision in self.ctx.observe(&self.doc, batch, now_ms) {
            if let Decision::Notify(req) = decision {
                self.notified += 1;
                self.notifier.notify_request(req);
            }
        }
    }

    fn on_ui(
        &mut self,
        target: &str,
        kind: UiEventKind,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<(), FeedError> {
        let element: Rc<Element> = self
            .doc
            .get(target)
            .ok_or_else(|| zepwatch_core::DomError::UnknownNode(target.to_owned()))?;
        if let Some(value) = value {
            element.set_value(value);
        }
        let event = UiEvent {
            target: &element,
            kind,
            key,
        };
        if let Some(name) = self.ctx.on_ui_event(&event) {
            match namespace::write_identity(&self.store, &name) {
                Ok(_) => tracing::info!(%name, "identity saved"),
                Err(e) => tracing::warn!(error = %e, %name, "failed to save identity"),
            }
        }
        Ok(())
    }

    fn on_notification_clicked(&self, id: Option<&str>) {
        let Some(focus) = self.tabs.on_notification_clicked() else {
            tracing::debug!(id, prefix = self.tabs.url_prefix(), "no tab to focus");
            return;
        };
        tracing::debug!(id, window_id = focus.window_id, tab_id = focus.tab_id, "focusing tab");
        if self.outbound.send(Outbound::Focus(focus)).is_err() {
            tracing::warn!("focus dropped: host writer gone");
        }
    }

    /// Advance the warm-up gate.
    pub fn tick(&mut self, now_ms: u64) -> WarmupState {
        self.ctx.tick(now_ms)
    }

    pub fn warmup_deadline_ms(&self) -> u64 {
        self.ctx.warmup_deadline_ms()
    }

    pub fn apply_initial_load(&mut self, load: InitialLoad) {
        self.ctx.load_identity(load.identity.as_deref());
        self.ctx.replace_settings(load.settings);
        tracing::info!(
            identity = load.identity.as_deref().unwrap_or("-"),
            "persisted state loaded"
        );
    }

    /// React to keys changed in the store, by us or anyone else.
    pub fn on_store_changes(&mut self, changes: &ChangeSet) {
        if touches_settings(changes) {
            self.ctx
                .replace_settings(namespace::read_settings(&self.store));
        }
        if touches_identity(changes) {
            self.ctx
                .apply_external_identity(namespace::read_identity(&self.store).as_deref());
        }
    }

    /// Re-read everything, after missing change notifications.
    pub fn reload_from_store(&mut self) {
        let load = InitialLoad::read(&self.store);
        self.ctx.replace_settings(load.settings);
        self.ctx.apply_external_identity(load.identity.as_deref());
    }
}
