//! End-to-end docking scenarios against the default workspace layout.

use dockyard_layout::{
    Action, ActionOutcome, BorderLocation, DockLocation, DockingEngine, LayoutModel, NodeId,
    NoopReason, PanelKind, ResizeTrigger, SizeDecisionReason, SizePolicy, TabNode, ToggleMode,
    default_layout,
};

fn id(raw: &str) -> NodeId {
    NodeId::new(raw).expect("test ids are non-empty")
}

fn setup() -> (DockingEngine, LayoutModel) {
    let policy = SizePolicy::default();
    let model = default_layout(&policy);
    (DockingEngine::new(policy), model)
}

fn add_chart(model: &LayoutModel, engine: &DockingEngine, pair: &str) -> LayoutModel {
    let tab_id = model.next_chart_id(pair);
    engine.apply(
        model,
        Action::AddNode {
            id: tab_id,
            tab: TabNode::chart(pair, "1h"),
            target: id("tabset_chart"),
            location: DockLocation::Center,
            index: None,
        },
    )
}

#[test]
fn deleting_active_chart_selects_following_chart() {
    let (engine, mut model) = setup();
    model = add_chart(&model, &engine, "ETH_USD");
    model = add_chart(&model, &engine, "BTC_USD");
    assert_eq!(
        model.tabset(&id("tabset_chart")).unwrap().children,
        vec![id("ETH_USD_1"), id("ETH_USD_2"), id("BTC_USD_1")]
    );

    model = engine.apply(&model, Action::SelectTab { tab_id: id("ETH_USD_2") });
    model = engine.apply(&model, Action::DeleteTab { tab_id: id("ETH_USD_2") });
    assert_eq!(
        model.active_tab(&id("tabset_chart")).map(|(tab_id, _)| tab_id.clone()),
        Some(id("BTC_USD_1"))
    );
}

#[test]
fn sole_chart_survives_deletion() {
    let (engine, mut model) = setup();
    model = add_chart(&model, &engine, "BTC_USD");
    model = engine.apply(&model, Action::DeleteTab { tab_id: id("ETH_USD_1") });
    assert_eq!(model.tabs_of_kind(PanelKind::Chart), vec![&id("BTC_USD_1")]);

    let (after, outcome) =
        engine.apply_with_outcome(&model, Action::DeleteTab { tab_id: id("BTC_USD_1") });
    assert_eq!(outcome, ActionOutcome::Ignored(NoopReason::LastChart));
    assert_eq!(
        after.active_tab(&id("tabset_chart")).map(|(tab_id, _)| tab_id.clone()),
        Some(id("BTC_USD_1"))
    );
}

#[test]
fn markets_moved_anywhere_gets_policy_width() {
    let (engine, model) = setup();
    let sizing = engine.policy().sizing(PanelKind::Markets).unwrap();
    for target in ["tabset_chart", "tabset_positions", "tabset_form", "tabset_account"] {
        for location in [DockLocation::Center, DockLocation::Left, DockLocation::Bottom] {
            let moved = engine.apply(
                &model,
                Action::MoveNode {
                    tab_id: id("markets"),
                    target: id(target),
                    location,
                    index: None,
                },
            );
            let tabset = moved.parent_of(&id("markets")).unwrap();
            let node = moved.tabset(tabset).unwrap();
            assert_eq!(node.width, Some(sizing.default_size), "{target} {location:?}");
            assert_eq!(node.min_width, Some(sizing.min_size), "{target} {location:?}");
            assert_eq!(node.size_reason, SizeDecisionReason::Default);
        }
    }
}

#[test]
fn account_round_trips_through_right_border() {
    let (engine, model) = setup();
    let to_border = Action::MoveNode {
        tab_id: id("account"),
        target: BorderLocation::Right.node_id(),
        location: DockLocation::Center,
        index: None,
    };
    let parked = engine.apply(&model, to_border.clone());
    assert_eq!(
        parked.border(BorderLocation::Right).unwrap().children,
        vec![id("account")]
    );

    // A duplicate drop from an overlapping drag event changes nothing.
    let (again, outcome) = engine.apply_with_outcome(&parked, to_border);
    assert_eq!(outcome, ActionOutcome::Ignored(NoopReason::SameParent));
    assert_eq!(again, parked);

    let restored = engine.apply(
        &parked,
        Action::MoveNode {
            tab_id: id("account"),
            target: id("tabset_form"),
            location: DockLocation::Center,
            index: None,
        },
    );
    assert!(restored.border(BorderLocation::Right).unwrap().children.is_empty());
    assert_eq!(restored.tabs_of_kind(PanelKind::Account).len(), 1);
    assert_eq!(restored.parent_of(&id("account")), Some(&id("tabset_form")));
    restored.validate().unwrap();
}

#[test]
fn edge_drop_onto_own_tabset_is_ignored() {
    let (engine, model) = setup();
    for location in [DockLocation::Left, DockLocation::Top, DockLocation::Center] {
        let (next, outcome) = engine.apply_with_outcome(
            &model,
            Action::MoveNode {
                tab_id: id("positions"),
                target: id("tabset_positions"),
                location,
                index: None,
            },
        );
        assert_eq!(outcome, ActionOutcome::Ignored(NoopReason::SameParent));
        assert_eq!(next, model);
        assert_eq!(next.parent_of(&id("positions")), Some(&id("tabset_positions")));
    }
}

#[test]
fn select_twice_equals_select_once() {
    let (engine, model) = setup();
    let select = Action::SelectTab { tab_id: id("transactions") };
    let once = engine.apply(&model, select.clone());
    let twice = engine.apply(&once, select);
    assert_eq!(once, twice);
    assert_eq!(once.state_hash(), twice.state_hash());
}

#[test]
fn user_minimized_form_ignores_automatic_hide() {
    let (engine, model) = setup();
    let policy = engine.policy();
    let form = id("tabset_form");
    let minimize = policy
        .toggle_action(&model, &form, ToggleMode::Toggle, ResizeTrigger::User)
        .unwrap();
    let model = engine.apply(&model, minimize);
    let width = model.tabset(&form).unwrap().width;
    assert_eq!(model.tabset(&form).unwrap().size_reason, SizeDecisionReason::Minimized);

    let mut fitted = model.clone();
    for action in policy.auto_fit(&fitted, 800, 1280) {
        fitted = engine.apply(&fitted, action);
    }
    assert_eq!(fitted.tabset(&form).unwrap().width, width);
    assert_eq!(
        fitted.tabset(&id("tabset_markets")).unwrap().size_reason,
        SizeDecisionReason::AutoHidden
    );
}

#[test]
fn emptied_tabsets_are_pruned_and_rows_collapse() {
    let (engine, mut model) = setup();
    for tab in ["positions", "trades", "transactions"] {
        model = engine.apply(&model, Action::DeleteTab { tab_id: id(tab) });
    }
    assert!(model.tabset(&id("tabset_positions")).is_none());
    assert!(!model.contains(&id("row_center")));
    assert_eq!(model.parent_of(&id("tabset_chart")), Some(model.root()));
    model.validate().unwrap();
}
