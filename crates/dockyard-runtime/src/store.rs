//! Versioned persistence of layouts and per-panel state.
//!
//! Every stored document is wrapped in `{ "version": N, "value": ... }`. A
//! document whose version differs from the current one is discarded rather
//! than migrated.
//!
//! # Layout document
//!
//! ```json
//! {
//!   "version": 1,
//!   "value": { "root": "root", "next_serial": 3, "nodes": [ ... ] }
//! }
//! ```

use std::fmt;

use dockyard_layout::{
    ChartTabId, EXTRA_PAIR, LAYOUT_SCHEMA_VERSION, LayoutModel, LayoutSnapshot, NodeId,
    PanelKind, SizePolicy, TabNode, default_layout,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::{KeyValueStorage, StorageResult};

/// Storage key of the main layout document.
pub const LAYOUT_KEY: &str = "layout";

/// Current version of per-panel state documents.
pub const PANEL_STATE_VERSION: u32 = 1;

/// `{version, value}` envelope shared by every persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedDocument<T> {
    pub version: u32,
    pub value: T,
}

impl<T> VersionedDocument<T> {
    #[must_use]
    pub const fn new(version: u32, value: T) -> Self {
        Self { version, value }
    }
}

/// Where a loaded layout came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The stored document was current and valid.
    Stored,
    /// Nothing was stored.
    Missing,
    /// The backend failed to read.
    Unreadable,
    /// The stored bytes were not a layout document.
    Corrupt,
    /// The stored document had another schema version.
    VersionMismatch { found: u32 },
    /// The snapshot parsed but failed structural validation.
    Invalid,
}

impl LoadSource {
    /// Whether the default layout was substituted.
    #[must_use]
    pub const fn is_default(self) -> bool {
        !matches!(self, Self::Stored)
    }
}

/// Persistence identity of a panel.
///
/// Charts are keyed by pair so their state survives tab id renumbering;
/// every other panel kind is single-instance and keyed by kind.
///
/// Two open charts of the same pair (`ETH_USD_1`, `ETH_USD_2`) share one
/// state document: the last saved period or drawing layout applies to both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PanelKey(String);

impl PanelKey {
    #[must_use]
    pub fn kind(kind: PanelKind) -> Self {
        Self(kind.as_str().to_string())
    }

    #[must_use]
    pub fn chart(pair: &str) -> Self {
        Self(format!("chart.{pair}"))
    }

    /// Key for a tab, preferring the chart pair from its extra data and
    /// falling back to the pair encoded in the tab id.
    #[must_use]
    pub fn for_tab(tab_id: &NodeId, tab: &TabNode) -> Self {
        if tab.kind != PanelKind::Chart {
            return Self::kind(tab.kind);
        }
        match tab.extra(EXTRA_PAIR) {
            Some(pair) => Self::chart(pair),
            None => match ChartTabId::parse(tab_id.as_str()) {
                Ok(chart) => Self::chart(&chart.pair),
                Err(_) => Self::kind(PanelKind::Chart),
            },
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key holding this panel's state.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("panel.{}", self.0)
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Layout and panel-state persistence over a [`KeyValueStorage`].
#[derive(Debug)]
pub struct PersistenceStore<S> {
    storage: S,
    policy: SizePolicy,
}

impl<S: KeyValueStorage> PersistenceStore<S> {
    /// `policy` shapes the default layout substituted on load failures.
    pub fn new(storage: S, policy: SizePolicy) -> Self {
        Self { storage, policy }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Persist `model` under [`LAYOUT_KEY`], replacing any previous document.
    pub fn save(&mut self, model: &LayoutModel) -> StorageResult<()> {
        let document = VersionedDocument::new(LAYOUT_SCHEMA_VERSION, model.to_snapshot());
        let json = serde_json::to_string(&document)?;
        self.storage.set(LAYOUT_KEY, &json)
    }

    /// Stored layout, or the default layout when there is nothing usable.
    pub fn load(&self) -> LayoutModel {
        self.load_with_source().0
    }

    /// Like [`Self::load`], also reporting why a default was substituted.
    pub fn load_with_source(&self) -> (LayoutModel, LoadSource) {
        let source = match self.read_layout() {
            Ok(model) => return (model, LoadSource::Stored),
            Err(source) => source,
        };
        (default_layout(&self.policy), source)
    }

    fn read_layout(&self) -> Result<LayoutModel, LoadSource> {
        let raw = match self.storage.get(LAYOUT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Err(LoadSource::Missing),
            Err(err) => {
                tracing::warn!(target: "dockyard.store", error = %err, "layout read failed");
                return Err(LoadSource::Unreadable);
            }
        };

        let document: VersionedDocument<Value> = serde_json::from_str(&raw).map_err(|err| {
            tracing::warn!(target: "dockyard.store", error = %err, "discarding corrupt layout");
            LoadSource::Corrupt
        })?;

        if document.version != LAYOUT_SCHEMA_VERSION {
            tracing::warn!(
                target: "dockyard.store",
                found = document.version,
                expected = LAYOUT_SCHEMA_VERSION,
                "discarding layout with unsupported version"
            );
            return Err(LoadSource::VersionMismatch {
                found: document.version,
            });
        }

        let snapshot: LayoutSnapshot = serde_json::from_value(document.value).map_err(|err| {
            tracing::warn!(target: "dockyard.store", error = %err, "discarding corrupt layout");
            LoadSource::Corrupt
        })?;

        LayoutModel::from_snapshot(snapshot).map_err(|err| {
            tracing::warn!(target: "dockyard.store", error = %err, "discarding invalid layout");
            LoadSource::Invalid
        })
    }

    /// Forget the stored layout; the next load yields the default.
    pub fn reset(&mut self) -> StorageResult<()> {
        self.storage.remove(LAYOUT_KEY)
    }

    pub fn save_panel_state(&mut self, key: &PanelKey, value: &Value) -> StorageResult<()> {
        let document = VersionedDocument::new(PANEL_STATE_VERSION, value);
        let json = serde_json::to_string(&document)?;
        self.storage.set(&key.storage_key(), &json)
    }

    /// Stored state for `key`. Unreadable, corrupt or outdated documents
    /// read as absent.
    pub fn load_panel_state(&self, key: &PanelKey) -> Option<Value> {
        let raw = match self.storage.get(&key.storage_key()) {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(target: "dockyard.store", panel = %key, error = %err, "panel state read failed");
                return None;
            }
        };
        let document: VersionedDocument<Value> = match serde_json::from_str(&raw) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(target: "dockyard.store", panel = %key, error = %err, "discarding corrupt panel state");
                return None;
            }
        };
        if document.version != PANEL_STATE_VERSION {
            tracing::warn!(
                target: "dockyard.store",
                panel = %key,
                found = document.version,
                "discarding panel state with unsupported version"
            );
            return None;
        }
        Some(document.value)
    }

    pub fn clear_panel_state(&mut self, key: &PanelKey) -> StorageResult<()> {
        self.storage.remove(&key.storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use dockyard_layout::{Action, DockingEngine};
    use serde_json::json;

    fn store() -> PersistenceStore<MemoryStorage> {
        PersistenceStore::new(MemoryStorage::new(), SizePolicy::default())
    }

    fn id(raw: &str) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    #[test]
    fn empty_storage_loads_default() {
        let store = store();
        let (model, source) = store.load_with_source();
        assert_eq!(source, LoadSource::Missing);
        assert!(source.is_default());
        assert_eq!(model, default_layout(&SizePolicy::default()));
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut store = store();
        let engine = DockingEngine::new(SizePolicy::default());
        let model = engine.apply(
            &store.load(),
            Action::SelectTab {
                tab_id: id("transactions"),
            },
        );
        store.save(&model).unwrap();

        let (loaded, source) = store.load_with_source();
        assert_eq!(source, LoadSource::Stored);
        assert_eq!(loaded, model);
    }

    #[test]
    fn saved_document_is_versioned() {
        let mut store = store();
        store.save(&store.load()).unwrap();
        let raw = store.storage().get(LAYOUT_KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], json!(LAYOUT_SCHEMA_VERSION));
        assert_eq!(value["value"]["root"], json!("root"));
    }

    #[test]
    fn older_version_resets_to_default() {
        let mut store = store();
        let document = VersionedDocument::new(
            LAYOUT_SCHEMA_VERSION - 1,
            LayoutModel::empty().to_snapshot(),
        );
        store
            .storage_mut()
            .set(LAYOUT_KEY, &serde_json::to_string(&document).unwrap())
            .unwrap();

        let (model, source) = store.load_with_source();
        assert_eq!(
            source,
            LoadSource::VersionMismatch {
                found: LAYOUT_SCHEMA_VERSION - 1
            }
        );
        assert_eq!(model, default_layout(&SizePolicy::default()));
    }

    #[test]
    fn corrupt_json_resets_to_default() {
        let mut store = store();
        store.storage_mut().set(LAYOUT_KEY, "{not json").unwrap();
        assert_eq!(store.load_with_source().1, LoadSource::Corrupt);

        let wrong_shape = json!({ "version": LAYOUT_SCHEMA_VERSION, "value": [1, 2, 3] });
        store
            .storage_mut()
            .set(LAYOUT_KEY, &wrong_shape.to_string())
            .unwrap();
        assert_eq!(store.load_with_source().1, LoadSource::Corrupt);
    }

    #[test]
    fn structurally_invalid_snapshot_resets_to_default() {
        let mut store = store();
        let mut snapshot = default_layout(&SizePolicy::default()).to_snapshot();
        snapshot.root = id("missing_root");
        let document = VersionedDocument::new(LAYOUT_SCHEMA_VERSION, snapshot);
        store
            .storage_mut()
            .set(LAYOUT_KEY, &serde_json::to_string(&document).unwrap())
            .unwrap();

        let (model, source) = store.load_with_source();
        assert_eq!(source, LoadSource::Invalid);
        assert_eq!(model, default_layout(&SizePolicy::default()));
    }

    #[test]
    fn reset_forgets_layout() {
        let mut store = store();
        store.save(&store.load()).unwrap();
        store.reset().unwrap();
        assert_eq!(store.load_with_source().1, LoadSource::Missing);
    }

    #[test]
    fn panel_keys_follow_identity() {
        let chart = TabNode::chart("BTC_USD", "4h");
        assert_eq!(PanelKey::for_tab(&id("BTC_USD_3"), &chart).as_str(), "chart.BTC_USD");

        let bare_chart = TabNode::new(PanelKind::Chart);
        assert_eq!(
            PanelKey::for_tab(&id("SOL_USD_2"), &bare_chart).storage_key(),
            "panel.chart.SOL_USD"
        );

        let form = TabNode::new(PanelKind::Form);
        assert_eq!(PanelKey::for_tab(&id("form"), &form).storage_key(), "panel.form");
    }

    #[test]
    fn same_pair_charts_share_panel_state() {
        let mut store = store();
        let first = PanelKey::for_tab(&id("ETH_USD_1"), &TabNode::chart("ETH_USD", "1h"));
        let second = PanelKey::for_tab(&id("ETH_USD_2"), &TabNode::chart("ETH_USD", "1d"));
        assert_eq!(first, second);

        store.save_panel_state(&first, &json!({ "period": "15m" })).unwrap();
        store.save_panel_state(&second, &json!({ "period": "4h" })).unwrap();
        assert_eq!(store.load_panel_state(&first), Some(json!({ "period": "4h" })));
    }

    #[test]
    fn panel_state_round_trips_and_ignores_other_versions() {
        let mut store = store();
        let key = PanelKey::chart("ETH_USD");
        let state = json!({ "indicators": ["ema", "rsi"], "zoom": 3 });
        store.save_panel_state(&key, &state).unwrap();
        assert_eq!(store.load_panel_state(&key), Some(state));

        let stale = VersionedDocument::new(PANEL_STATE_VERSION + 1, json!({ "zoom": 1 }));
        store
            .storage_mut()
            .set(&key.storage_key(), &serde_json::to_string(&stale).unwrap())
            .unwrap();
        assert_eq!(store.load_panel_state(&key), None);

        store.clear_panel_state(&key).unwrap();
        assert_eq!(store.load_panel_state(&key), None);
        assert_eq!(store.load_panel_state(&PanelKey::kind(PanelKind::Form)), None);
    }
}
