//! Structured-log contract of workspace dispatch and layout loading.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dockyard_runtime::layout::{Action, LAYOUT_SCHEMA_VERSION, NodeId};
use dockyard_runtime::{
    DockyardConfig, KeyValueStorage, LAYOUT_KEY, LoadSource, MemoryStorage, Workspace,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedSpan {
    id: u64,
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    message: Option<String>,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

#[derive(Default)]
struct Captured {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
}

struct DispatchCapture {
    captured: Arc<Mutex<Captured>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for DispatchCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.captured.lock().unwrap().spans.push(CapturedSpan {
            id: id.into_u64(),
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        values.record(&mut visitor);
        let mut captured = self.captured.lock().unwrap();
        if let Some(span) = captured
            .spans
            .iter_mut()
            .rev()
            .find(|span| span.id == id.into_u64())
        {
            span.fields.extend(visitor.0);
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        self.captured.lock().unwrap().events.push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: fields.get("message").cloned(),
            fields,
            parent_span_name: ctx.event_span(event).map(|span| span.name().to_string()),
        });
    }
}

fn with_captured_tracing<F>(f: F) -> Captured
where
    F: FnOnce(),
{
    let captured = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(DispatchCapture {
        captured: captured.clone(),
    });
    tracing::subscriber::with_default(subscriber, f);
    let mut guard = captured.lock().unwrap();
    std::mem::take(&mut *guard)
}

fn id(raw: &str) -> NodeId {
    NodeId::new(raw).unwrap()
}

#[test]
fn dispatch_span_records_hashes() {
    let mut expected = None;
    let captured = with_captured_tracing(|| {
        let mut workspace =
            Workspace::open(MemoryStorage::new(), &DockyardConfig::default()).unwrap();
        let before = workspace.model().state_hash();
        let _ = workspace.dispatch(Action::SelectTab {
            tab_id: id("trades"),
        });
        expected = Some((before, workspace.model().state_hash()));
    });
    let (before, after) = expected.unwrap();
    assert_ne!(before, after);

    let span = captured
        .spans
        .iter()
        .find(|span| span.name == "workspace.dispatch")
        .expect("dispatch span");
    assert_eq!(span.fields["action"], "select_tab");
    assert_eq!(span.fields["before_hash"], before.to_string());
    assert_eq!(span.fields["after_hash"], after.to_string());
    assert_eq!(span.fields["outcome"], "applied");

    assert!(captured.events.iter().any(|event| {
        event.target == "dockyard.engine"
            && event.parent_span_name.as_deref() == Some("workspace.dispatch")
    }));
}

#[test]
fn ignored_dispatch_keeps_hash_and_logs_reason() {
    let captured = with_captured_tracing(|| {
        let mut workspace =
            Workspace::open(MemoryStorage::new(), &DockyardConfig::default()).unwrap();
        let _ = workspace.dispatch(Action::SelectTab {
            tab_id: id("ghost"),
        });
    });

    let span = captured
        .spans
        .iter()
        .find(|span| span.name == "workspace.dispatch")
        .expect("dispatch span");
    assert_eq!(span.fields["before_hash"], span.fields["after_hash"]);
    assert_eq!(span.fields["outcome"], "missing_node");
    assert!(
        captured
            .events
            .iter()
            .all(|event| event.level != tracing::Level::WARN)
    );
}

#[test]
fn discarded_layout_is_warned() {
    let mut storage = MemoryStorage::new();
    let stale = serde_json::json!({
        "version": LAYOUT_SCHEMA_VERSION + 1,
        "value": {}
    });
    storage.set(LAYOUT_KEY, &stale.to_string()).unwrap();

    let mut source = None;
    let captured = with_captured_tracing(|| {
        let workspace = Workspace::open(storage, &DockyardConfig::default()).unwrap();
        source = Some(workspace.loaded_from());
    });

    assert_eq!(
        source,
        Some(LoadSource::VersionMismatch {
            found: LAYOUT_SCHEMA_VERSION + 1
        })
    );
    let warning = captured
        .events
        .iter()
        .find(|event| event.target == "dockyard.store" && event.level == tracing::Level::WARN)
        .expect("store warning");
    assert_eq!(
        warning.fields["found"],
        (LAYOUT_SCHEMA_VERSION + 1).to_string()
    );
}
