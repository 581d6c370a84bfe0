//! File-backed persistence across workspace sessions.

use dockyard_runtime::layout::{
    Action, BorderLocation, DockLocation, LAYOUT_SCHEMA_VERSION, LayoutModel, NodeId, SizePolicy,
    TabNode, ToggleMode, default_layout,
};
use dockyard_runtime::{
    DockyardConfig, FileStorage, KeyValueStorage, LAYOUT_KEY, LoadSource, PanelKey,
    PersistenceStore, VersionedDocument, Workspace,
};
use proptest::prelude::*;

fn id(raw: &str) -> NodeId {
    NodeId::new(raw).unwrap()
}

fn config_in(dir: &std::path::Path) -> DockyardConfig {
    DockyardConfig {
        storage_dir: Some(dir.join("state")),
        ..DockyardConfig::default()
    }
}

#[test]
fn layout_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let saved = {
        let mut workspace = Workspace::from_config(&config).unwrap();
        assert_eq!(workspace.loaded_from(), LoadSource::Missing);
        let _ = workspace.dispatch(Action::MoveNode {
            tab_id: id("account"),
            target: BorderLocation::Right.node_id(),
            location: DockLocation::Center,
            index: None,
        });
        let _ = workspace.dispatch(Action::AddNode {
            id: workspace.model().next_chart_id("BTC_USD"),
            tab: TabNode::chart("BTC_USD", "4h"),
            target: id("tabset_chart"),
            location: DockLocation::Right,
            index: None,
        });
        let _ = workspace.toggle_size(&id("tabset_markets"), ToggleMode::Hide);
        workspace.model().clone()
    };

    assert!(dir.path().join("state").join("layout.json").exists());
    let reopened = Workspace::from_config(&config).unwrap();
    assert_eq!(reopened.loaded_from(), LoadSource::Stored);
    assert_eq!(reopened.model(), &saved);
    assert_eq!(reopened.model().state_hash(), saved.state_hash());
}

#[test]
fn previous_schema_version_loads_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path()).unwrap();
    let document = VersionedDocument::new(
        LAYOUT_SCHEMA_VERSION - 1,
        default_layout(&SizePolicy::default()).to_snapshot(),
    );
    storage
        .set(LAYOUT_KEY, &serde_json::to_string(&document).unwrap())
        .unwrap();

    let store = PersistenceStore::new(storage, SizePolicy::default());
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
fn truncated_file_loads_default() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("layout.json"), "{\"version\": 1, \"val").unwrap();
    let store = PersistenceStore::new(FileStorage::new(dir.path()).unwrap(), SizePolicy::default());
    assert_eq!(store.load_with_source().1, LoadSource::Corrupt);
}

#[test]
fn reset_persists_default_layout() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mut workspace = Workspace::from_config(&config).unwrap();
    let _ = workspace.dispatch(Action::DeleteTabSet {
        tabset_id: id("tabset_positions"),
    });
    workspace.reset();
    drop(workspace);

    let reopened = Workspace::from_config(&config).unwrap();
    assert_eq!(reopened.loaded_from(), LoadSource::Stored);
    assert_eq!(reopened.model(), &default_layout(&SizePolicy::default()));
}

#[test]
fn panel_state_survives_chart_renumbering() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mut workspace = Workspace::from_config(&config).unwrap();
    let key = workspace.panel_key(&id("ETH_USD_1")).unwrap();
    workspace
        .save_panel_state(&key, &serde_json::json!({ "indicators": ["vwap"] }))
        .unwrap();

    let _ = workspace.dispatch(Action::AddNode {
        id: id("ETH_USD_2"),
        tab: TabNode::chart("ETH_USD", "1d"),
        target: id("tabset_chart"),
        location: DockLocation::Center,
        index: None,
    });
    let _ = workspace.dispatch(Action::DeleteTab {
        tab_id: id("ETH_USD_1"),
    });
    let renumbered = workspace.panel_key(&id("ETH_USD_2")).unwrap();
    assert_eq!(renumbered, PanelKey::chart("ETH_USD"));
    assert_eq!(
        workspace.load_panel_state(&renumbered),
        Some(serde_json::json!({ "indicators": ["vwap"] }))
    );
}

#[test]
fn slash_pair_panel_state_is_stored_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut store =
        PersistenceStore::new(FileStorage::new(dir.path()).unwrap(), SizePolicy::default());
    let key = PanelKey::for_tab(&id("BTC/USD_1"), &TabNode::chart("BTC/USD", "1h"));
    assert_eq!(key, PanelKey::chart("BTC/USD"));

    store
        .save_panel_state(&key, &serde_json::json!({ "period": "4h" }))
        .unwrap();
    assert!(dir.path().join("panel.chart.BTC%2FUSD.json").exists());
    assert_eq!(
        store.load_panel_state(&key),
        Some(serde_json::json!({ "period": "4h" }))
    );
}

fn select_actions(model: &LayoutModel) -> Vec<Action> {
    model
        .tabs()
        .map(|(tab_id, _)| Action::SelectTab {
            tab_id: tab_id.clone(),
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn saved_layouts_load_back_identically(
        picks in proptest::collection::vec(0usize..64, 1..24),
        widths in proptest::collection::vec(0u32..600, 0..4),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut workspace = Workspace::from_config(&config).unwrap();
        let selects = select_actions(workspace.model());
        for pick in picks {
            let _ = workspace.dispatch(selects[pick % selects.len()].clone());
        }
        for width in widths {
            let _ = workspace.resize(&id("tabset_form"), width);
        }
        let expected = workspace.model().clone();
        drop(workspace);

        let reopened = Workspace::from_config(&config).unwrap();
        prop_assert_eq!(reopened.model(), &expected);
    }
}
