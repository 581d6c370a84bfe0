//! Built-in layouts.

use crate::model::{LayoutModel, LayoutModelError};
use crate::node::{
    BorderLocation, NodeId, NodeKind, NodeRecord, PanelKind, RowNode, TabNode, TabSetNode,
};
use crate::size::{SizeAxis, SizePolicy};

/// Pair shown by the chart of a fresh workspace.
pub const DEFAULT_CHART_PAIR: &str = "ETH_USD";
/// Period shown by the chart of a fresh workspace.
pub const DEFAULT_CHART_PERIOD: &str = "1h";

/// The layout a fresh (or reset) workspace starts from.
///
/// ```text
/// markets | chart          | order form
///         |----------------|-----------
///         | positions ...  | account
/// ```
/// with chat docked in the left border and portfolio in the bottom border.
#[must_use]
pub fn default_layout(policy: &SizePolicy) -> LayoutModel {
    let mut builder = Builder::new(policy);
    let root = builder.model.root().clone();

    builder.tabset(&root, "tabset_markets", 20, vec![single(PanelKind::Markets)]);

    let center = builder.row(&root, "row_center", 60);
    builder.tabset(
        &center,
        "tabset_chart",
        70,
        vec![(
            NodeId::from_static("ETH_USD_1"),
            TabNode::chart(DEFAULT_CHART_PAIR, DEFAULT_CHART_PERIOD),
        )],
    );
    builder.tabset(
        &center,
        "tabset_positions",
        30,
        vec![
            single(PanelKind::Positions),
            single(PanelKind::Trades),
            single(PanelKind::Transactions),
        ],
    );

    let side = builder.row(&root, "row_side", 20);
    builder.tabset(&side, "tabset_form", 60, vec![single(PanelKind::Form)]);
    builder.tabset(&side, "tabset_account", 40, vec![single(PanelKind::Account)]);

    builder.border_tab(BorderLocation::Left, PanelKind::Chat);
    builder.border_tab(BorderLocation::Bottom, PanelKind::Portfolio);

    builder.model
}

/// Layout holding exactly one tab, used by popped-out windows.
pub fn single_panel_layout(
    tab_id: NodeId,
    tab: TabNode,
    policy: &SizePolicy,
) -> Result<LayoutModel, LayoutModelError> {
    let mut builder = Builder::new(policy);
    let root = builder.model.root().clone();
    let tabset_id = builder.model.allocate_id("tabset");
    builder.insert_tabset(&root, tabset_id, 100, vec![(tab_id, tab)]);
    let model = builder.model;
    model.validate()?;
    Ok(model)
}

fn single(kind: PanelKind) -> (NodeId, TabNode) {
    (NodeId::from_static(kind.as_str()), TabNode::new(kind))
}

struct Builder<'a> {
    policy: &'a SizePolicy,
    model: LayoutModel,
}

impl<'a> Builder<'a> {
    fn new(policy: &'a SizePolicy) -> Self {
        Self {
            policy,
            model: LayoutModel::empty(),
        }
    }

    fn row(&mut self, parent: &NodeId, id: &'static str, weight: u32) -> NodeId {
        let id = NodeId::from_static(id);
        self.model.insert_record(NodeRecord::new(
            id.clone(),
            None,
            NodeKind::Row(RowNode {
                children: Vec::new(),
                weight,
            }),
        ));
        self.model.push_child(parent, id.clone());
        id
    }

    fn tabset(
        &mut self,
        parent: &NodeId,
        id: &'static str,
        weight: u32,
        tabs: Vec<(NodeId, TabNode)>,
    ) {
        self.insert_tabset(parent, NodeId::from_static(id), weight, tabs);
    }

    fn insert_tabset(
        &mut self,
        parent: &NodeId,
        id: NodeId,
        weight: u32,
        tabs: Vec<(NodeId, TabNode)>,
    ) {
        // The first tab is the one shown, so it decides the initial size.
        let sizing = tabs
            .first()
            .and_then(|(_, tab)| self.policy.sizing(tab.kind));
        let mut tabset = TabSetNode {
            weight,
            ..TabSetNode::new()
        };
        if let Some(sizing) = sizing {
            match sizing.axis {
                SizeAxis::Width => {
                    tabset.width = Some(sizing.default_size);
                    tabset.min_width = Some(sizing.min_extent());
                }
                SizeAxis::Height => {
                    tabset.height = Some(sizing.default_size);
                    tabset.min_height = Some(sizing.min_extent());
                }
            }
        }
        self.model
            .insert_record(NodeRecord::new(id.clone(), None, NodeKind::TabSet(tabset)));
        self.model.push_child(parent, id.clone());
        for (tab_id, tab) in tabs {
            self.model
                .insert_record(NodeRecord::new(tab_id.clone(), None, NodeKind::Tab(tab)));
            self.model.push_child(&id, tab_id);
        }
    }

    fn border_tab(&mut self, location: BorderLocation, kind: PanelKind) {
        let (tab_id, tab) = single(kind);
        self.model
            .insert_record(NodeRecord::new(tab_id.clone(), None, NodeKind::Tab(tab)));
        self.model.push_child(&location.node_id(), tab_id);
    }
}
