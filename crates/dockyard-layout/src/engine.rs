//! Docking engine: `(LayoutModel, Action) -> LayoutModel`.
//!
//! Transitions are total. A stale or nonsensical action leaves the model
//! untouched and reports an [`ActionOutcome::Ignored`] reason instead of an
//! error, because renderer gestures routinely race against layout changes.

use crate::action::{Action, NodeAttributes};
use crate::model::LayoutModel;
use crate::node::{
    Axis, ChartTabId, DEFAULT_WEIGHT, DockLocation, NodeId, NodeKind, NodeRecord, NodeShape,
    PanelKind, RowNode, TabNode, TabSetNode,
};
use crate::size::{SizeDecisionReason, SizePolicy};

/// Why an action left the layout unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoopReason {
    /// A referenced node does not exist (any more).
    MissingNode,
    /// A referenced node exists but is the wrong kind for the action.
    WrongNodeKind,
    /// Move into the container the tab already lives in.
    SameParent,
    /// Add with an id that is already taken.
    DuplicateTab,
    /// Add of a second tab for a single-instance panel kind.
    DuplicatePanel,
    /// Removal would leave the workspace without a chart.
    LastChart,
    /// Chart tab id is not `{pair}_{sequence}`.
    InvalidChartId,
    /// Target/location combination has no meaning.
    UnsupportedTarget,
    /// The action applied cleanly but produced an identical layout.
    Unchanged,
    /// The resulting layout failed validation and was discarded.
    Rejected,
}

impl NoopReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingNode => "missing_node",
            Self::WrongNodeKind => "wrong_node_kind",
            Self::SameParent => "same_parent",
            Self::DuplicateTab => "duplicate_tab",
            Self::DuplicatePanel => "duplicate_panel",
            Self::LastChart => "last_chart",
            Self::InvalidChartId => "invalid_chart_id",
            Self::UnsupportedTarget => "unsupported_target",
            Self::Unchanged => "unchanged",
            Self::Rejected => "rejected",
        }
    }
}

/// Result classification of one [`DockingEngine::apply_with_outcome`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Ignored(NoopReason),
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Pure layout transition function parameterized by a size policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockingEngine {
    policy: SizePolicy,
}

impl DockingEngine {
    #[must_use]
    pub fn new(policy: SizePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &SizePolicy {
        &self.policy
    }

    /// Apply `action`, returning the next layout.
    #[must_use]
    pub fn apply(&self, model: &LayoutModel, action: Action) -> LayoutModel {
        self.apply_with_outcome(model, action).0
    }

    /// Apply `action` and report whether it changed anything.
    ///
    /// On any no-op the returned model equals `model`.
    #[must_use]
    pub fn apply_with_outcome(
        &self,
        model: &LayoutModel,
        action: Action,
    ) -> (LayoutModel, ActionOutcome) {
        #[cfg(feature = "tracing")]
        let name = action.name();
        let structural = action.is_structural();

        let mut next = model.clone();
        let result = self.transition(&mut next, action).and_then(|()| {
            if structural {
                next.tidy();
            }
            settle(model, &next)
        });

        match result {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    target: "dockyard.engine",
                    action = name,
                    nodes = next.len(),
                    "action applied"
                );
                (next, ActionOutcome::Applied)
            }
            Err(reason) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    target: "dockyard.engine",
                    action = name,
                    reason = reason.as_str(),
                    "action ignored"
                );
                (model.clone(), ActionOutcome::Ignored(reason))
            }
        }
    }

    fn transition(&self, model: &mut LayoutModel, action: Action) -> Result<(), NoopReason> {
        match action {
            Action::AddNode {
                id,
                tab,
                target,
                location,
                index,
            } => self.add_node(model, id, tab, &target, location, index),
            Action::MoveNode {
                tab_id,
                target,
                location,
                index,
            } => self.move_node(model, &tab_id, &target, location, index),
            Action::DeleteTab { tab_id } => delete_tab(model, &tab_id),
            Action::DeleteTabSet { tabset_id } => delete_tabset(model, &tabset_id),
            Action::SelectTab { tab_id } => select_tab(model, &tab_id),
            Action::UpdateNodeAttributes {
                node_id,
                attributes,
            } => update_attributes(model, &node_id, attributes),
            Action::RenameTab { tab_id, name } => match model.node_mut(&tab_id) {
                Some(NodeRecord {
                    kind: NodeKind::Tab(tab),
                    ..
                }) => {
                    tab.name = name;
                    Ok(())
                }
                Some(_) => Err(NoopReason::WrongNodeKind),
                None => Err(NoopReason::MissingNode),
            },
        }
    }

    fn add_node(
        &self,
        model: &mut LayoutModel,
        id: NodeId,
        tab: TabNode,
        target: &NodeId,
        location: DockLocation,
        index: Option<usize>,
    ) -> Result<(), NoopReason> {
        if model.contains(&id) {
            return Err(NoopReason::DuplicateTab);
        }
        if tab.kind.allows_multiple() {
            ChartTabId::parse(id.as_str()).map_err(|_| NoopReason::InvalidChartId)?;
        } else if !model.tabs_of_kind(tab.kind).is_empty() {
            return Err(NoopReason::DuplicatePanel);
        }
        if !model.contains(target) {
            return Err(NoopReason::MissingNode);
        }
        let kind = tab.kind;
        model.insert_record(NodeRecord::new(id.clone(), None, NodeKind::Tab(tab)));
        let container = attach(model, &id, target, location, index)?;
        self.enforce_key_size(model, &container, kind);
        Ok(())
    }

    fn move_node(
        &self,
        model: &mut LayoutModel,
        tab_id: &NodeId,
        target: &NodeId,
        location: DockLocation,
        index: Option<usize>,
    ) -> Result<(), NoopReason> {
        let kind = model
            .tab(tab_id)
            .map(|tab| tab.kind)
            .ok_or_else(|| missing_or_wrong(model, tab_id))?;
        if !model.contains(target) {
            return Err(NoopReason::MissingNode);
        }
        // Any drop onto the tab's own container, edge or center, is a no-op.
        if model.parent_of(tab_id) == Some(target) {
            return Err(NoopReason::SameParent);
        }
        detach(model, tab_id);
        let container = attach(model, tab_id, target, location, index)?;
        self.enforce_key_size(model, &container, kind);
        Ok(())
    }

    /// Key panels reset their tabset to the policy default whenever they are
    /// docked somewhere new.
    fn enforce_key_size(&self, model: &mut LayoutModel, container: &NodeId, kind: PanelKind) {
        if !kind.is_key_panel() {
            return;
        }
        let Some(sizing) = self.policy.sizing(kind) else {
            return;
        };
        if let Some(NodeRecord {
            kind: NodeKind::TabSet(tabset),
            ..
        }) = model.node_mut(container)
        {
            merge_tabset(
                tabset,
                NodeAttributes::along(sizing.axis, sizing.default_size, sizing.min_extent())
                    .with_reason(SizeDecisionReason::Default),
            );
        }
    }
}

fn settle(before: &LayoutModel, after: &LayoutModel) -> Result<(), NoopReason> {
    if after == before {
        return Err(NoopReason::Unchanged);
    }
    if let Err(err) = after.validate() {
        #[cfg(feature = "tracing")]
        tracing::warn!(target: "dockyard.engine", error = %err, "transition produced an invalid layout");
        #[cfg(not(feature = "tracing"))]
        let _ = err;
        return Err(NoopReason::Rejected);
    }
    Ok(())
}

fn shape_of(model: &LayoutModel, id: &NodeId) -> Option<NodeShape> {
    model.node(id).map(|node| node.kind.shape())
}

fn missing_or_wrong(model: &LayoutModel, id: &NodeId) -> NoopReason {
    if model.contains(id) {
        NoopReason::WrongNodeKind
    } else {
        NoopReason::MissingNode
    }
}

fn is_chart(model: &LayoutModel, id: &NodeId) -> bool {
    model.tab(id).is_some_and(|tab| tab.kind == PanelKind::Chart)
}

fn delete_tab(model: &mut LayoutModel, tab_id: &NodeId) -> Result<(), NoopReason> {
    if model.tab(tab_id).is_none() {
        return Err(missing_or_wrong(model, tab_id));
    }
    if is_chart(model, tab_id) && model.tabs_of_kind(PanelKind::Chart).len() <= 1 {
        return Err(NoopReason::LastChart);
    }
    detach(model, tab_id);
    let _ = model.remove_record(tab_id);
    Ok(())
}

fn delete_tabset(model: &mut LayoutModel, tabset_id: &NodeId) -> Result<(), NoopReason> {
    let children = model
        .tabset(tabset_id)
        .map(|tabset| tabset.children.clone())
        .ok_or_else(|| missing_or_wrong(model, tabset_id))?;
    let charts_inside = children.iter().filter(|id| is_chart(model, id)).count();
    if charts_inside > 0 && charts_inside == model.tabs_of_kind(PanelKind::Chart).len() {
        return Err(NoopReason::LastChart);
    }
    let parent = model
        .parent_of(tabset_id)
        .cloned()
        .ok_or(NoopReason::MissingNode)?;
    for child in &children {
        let _ = model.remove_record(child);
    }
    model.detach_from(&parent, tabset_id);
    let _ = model.remove_record(tabset_id);
    Ok(())
}

fn select_tab(model: &mut LayoutModel, tab_id: &NodeId) -> Result<(), NoopReason> {
    if model.tab(tab_id).is_none() {
        return Err(missing_or_wrong(model, tab_id));
    }
    let parent = model
        .parent_of(tab_id)
        .cloned()
        .ok_or(NoopReason::MissingNode)?;
    let record = model.node_mut(&parent).ok_or(NoopReason::MissingNode)?;
    let index = record
        .children()
        .iter()
        .position(|child| child == tab_id)
        .ok_or(NoopReason::MissingNode)?;
    match &mut record.kind {
        NodeKind::TabSet(tabset) => tabset.selected = index,
        NodeKind::Border(border) => border.selected = Some(index),
        _ => return Err(NoopReason::WrongNodeKind),
    }
    Ok(())
}

fn update_attributes(
    model: &mut LayoutModel,
    node_id: &NodeId,
    attributes: NodeAttributes,
) -> Result<(), NoopReason> {
    let record = model.node_mut(node_id).ok_or(NoopReason::MissingNode)?;
    match &mut record.kind {
        NodeKind::TabSet(tabset) => merge_tabset(tabset, attributes),
        NodeKind::Row(row) => {
            if let Some(weight) = attributes.weight {
                row.weight = weight.max(1);
            }
        }
        NodeKind::Border(border) => {
            let size = match border.location.size_axis() {
                Axis::Horizontal => attributes.width,
                Axis::Vertical => attributes.height,
            };
            if let Some(size) = size {
                border.size = size;
            }
        }
        NodeKind::Root(_) | NodeKind::Tab(_) => return Err(NoopReason::WrongNodeKind),
    }
    Ok(())
}

/// Shallow merge; sizes are clamped up to their minimums afterwards.
fn merge_tabset(tabset: &mut TabSetNode, attributes: NodeAttributes) {
    let NodeAttributes {
        width,
        height,
        min_width,
        min_height,
        weight,
        size_reason,
    } = attributes;
    if width.is_some() {
        tabset.width = width;
    }
    if height.is_some() {
        tabset.height = height;
    }
    if min_width.is_some() {
        tabset.min_width = min_width;
    }
    if min_height.is_some() {
        tabset.min_height = min_height;
    }
    if let Some(weight) = weight {
        tabset.weight = weight.max(1);
    }
    if let Some(reason) = size_reason {
        tabset.size_reason = reason;
    }
    if let (Some(size), Some(min)) = (tabset.width, tabset.min_width) {
        tabset.width = Some(size.max(min));
    }
    if let (Some(size), Some(min)) = (tabset.height, tabset.min_height) {
        tabset.height = Some(size.max(min));
    }
}

/// Remove a tab from its container, fixing up the container's selection.
///
/// The tab record itself stays in the model with no parent.
fn detach(model: &mut LayoutModel, tab_id: &NodeId) {
    let Some(parent) = model.parent_of(tab_id).cloned() else {
        return;
    };
    let removed_chart = is_chart(model, tab_id);
    let sibling_charts: Vec<bool> = model
        .node(&parent)
        .map(|node| {
            node.children()
                .iter()
                .map(|child| is_chart(model, child))
                .collect()
        })
        .unwrap_or_default();

    match model.node_mut(&parent).map(|node| &mut node.kind) {
        Some(NodeKind::TabSet(tabset)) => {
            let Some(index) = tabset.children.iter().position(|child| child == tab_id) else {
                return;
            };
            tabset.children.remove(index);
            let mut charts = sibling_charts;
            if index < charts.len() {
                charts.remove(index);
            }
            tabset.selected = next_selection(
                tabset.selected,
                index,
                tabset.children.len(),
                removed_chart.then_some(charts.as_slice()),
            );
        }
        Some(NodeKind::Border(border)) => {
            let Some(index) = border.children.iter().position(|child| child == tab_id) else {
                return;
            };
            border.children.remove(index);
            border.selected = match border.selected {
                Some(selected) if selected == index => None,
                Some(selected) if selected > index => Some(selected - 1),
                other => other,
            };
        }
        _ => return,
    }
    model.set_parent(tab_id, None);
}

/// Selection after removing `removed` from a tabset now holding `len` tabs.
///
/// `charts` flags the remaining tabs that are charts and is only given when
/// the removed tab was a chart, so a chart is replaced by a neighboring chart.
fn next_selection(selected: usize, removed: usize, len: usize, charts: Option<&[bool]>) -> usize {
    if len == 0 {
        return 0;
    }
    if removed < selected {
        return selected - 1;
    }
    if removed > selected {
        return selected;
    }
    if let Some(charts) = charts {
        let after = charts
            .iter()
            .skip(removed)
            .position(|chart| *chart)
            .map(|offset| removed + offset);
        let before = || {
            charts
                .get(..removed)
                .and_then(|head| head.iter().rposition(|chart| *chart))
        };
        if let Some(index) = after.or_else(before) {
            return index;
        }
    }
    removed.min(len - 1)
}

/// Place a detached tab relative to `target`, returning its new container.
fn attach(
    model: &mut LayoutModel,
    tab_id: &NodeId,
    target: &NodeId,
    location: DockLocation,
    index: Option<usize>,
) -> Result<NodeId, NoopReason> {
    let shape = shape_of(model, target).ok_or(NoopReason::MissingNode)?;
    match (shape, location.axis()) {
        (NodeShape::TabSet, None) | (NodeShape::Border, _) => {
            insert_tab(model, target, tab_id, index);
            Ok(target.clone())
        }
        (NodeShape::TabSet | NodeShape::Row, Some(axis)) => {
            let tabset = wrap_in_tabset(model, tab_id);
            split_around(model, target, &tabset, location.is_leading(), axis)?;
            Ok(tabset)
        }
        (NodeShape::Root, None) => {
            let tabset = wrap_in_tabset(model, tab_id);
            model.push_child(target, tabset.clone());
            Ok(tabset)
        }
        (NodeShape::Root, Some(axis)) => {
            let tabset = wrap_in_tabset(model, tab_id);
            dock_root_edge(model, &tabset, location.is_leading(), axis);
            Ok(tabset)
        }
        (NodeShape::Row | NodeShape::Tab, None) | (NodeShape::Tab, Some(_)) => {
            Err(NoopReason::UnsupportedTarget)
        }
    }
}

fn insert_tab(model: &mut LayoutModel, container: &NodeId, tab_id: &NodeId, index: Option<usize>) {
    match model.node_mut(container).map(|node| &mut node.kind) {
        Some(NodeKind::TabSet(tabset)) => {
            let at = index.map_or(tabset.children.len(), |index| {
                index.min(tabset.children.len())
            });
            tabset.children.insert(at, tab_id.clone());
            tabset.selected = at;
        }
        // Border strips stay collapsed; only the selection index shifts.
        Some(NodeKind::Border(border)) => {
            let at = index.map_or(border.children.len(), |index| {
                index.min(border.children.len())
            });
            border.children.insert(at, tab_id.clone());
            if let Some(selected) = border.selected
                && at <= selected
            {
                border.selected = Some(selected + 1);
            }
        }
        _ => return,
    }
    model.set_parent(tab_id, Some(container.clone()));
}

fn wrap_in_tabset(model: &mut LayoutModel, tab_id: &NodeId) -> NodeId {
    let id = model.allocate_id("tabset");
    model.insert_record(NodeRecord::new(
        id.clone(),
        None,
        NodeKind::TabSet(TabSetNode {
            children: vec![tab_id.clone()],
            ..TabSetNode::new()
        }),
    ));
    model.set_parent(tab_id, Some(id.clone()));
    id
}

fn ordered(target: &NodeId, incoming: &NodeId, leading: bool) -> Vec<NodeId> {
    if leading {
        vec![incoming.clone(), target.clone()]
    } else {
        vec![target.clone(), incoming.clone()]
    }
}

/// Insert `child` at the front or back of `container`.
fn insert_at_edge(model: &mut LayoutModel, container: &NodeId, child: &NodeId, leading: bool) {
    if let Some(children) = model.node_mut(container).and_then(NodeRecord::children_mut) {
        if leading {
            children.insert(0, child.clone());
        } else {
            children.push(child.clone());
        }
    }
    model.set_parent(child, Some(container.clone()));
}

/// Put `incoming` beside `target` along `axis`.
fn split_around(
    model: &mut LayoutModel,
    target: &NodeId,
    incoming: &NodeId,
    leading: bool,
    axis: Axis,
) -> Result<(), NoopReason> {
    let parent = model
        .parent_of(target)
        .cloned()
        .ok_or(NoopReason::UnsupportedTarget)?;
    let parent_axis = model.axis_of(&parent).ok_or(NoopReason::UnsupportedTarget)?;

    if parent_axis == axis {
        // Sibling: the target gives up half its share.
        let weight = model
            .node(target)
            .and_then(NodeRecord::weight)
            .unwrap_or(DEFAULT_WEIGHT);
        let half = weight / 2;
        if let Some(node) = model.node_mut(target) {
            node.set_weight(weight - half);
        }
        if let Some(node) = model.node_mut(incoming) {
            node.set_weight(half);
        }
        model.splice_child(&parent, target, &ordered(target, incoming, leading));
        model.set_parent(incoming, Some(parent));
        return Ok(());
    }

    if shape_of(model, target) == Some(NodeShape::Row) {
        // A row one level below a cross-axis parent already runs along `axis`.
        insert_at_edge(model, target, incoming, leading);
        return Ok(());
    }

    let weight = model
        .node(target)
        .and_then(NodeRecord::weight)
        .unwrap_or(DEFAULT_WEIGHT);
    let row = model.allocate_id("row");
    let children = ordered(target, incoming, leading);
    model.insert_record(NodeRecord::new(
        row.clone(),
        Some(parent.clone()),
        NodeKind::Row(RowNode {
            children: children.clone(),
            weight,
        }),
    ));
    model.splice_child(&parent, target, std::slice::from_ref(&row));
    for child in &children {
        model.set_parent(child, Some(row.clone()));
        if let Some(node) = model.node_mut(child) {
            node.set_weight(DEFAULT_WEIGHT);
        }
    }
    Ok(())
}

/// Dock `incoming` along one edge of the whole main tree.
fn dock_root_edge(model: &mut LayoutModel, incoming: &NodeId, leading: bool, axis: Axis) {
    let root = model.root().clone();
    if axis == Axis::Horizontal {
        insert_at_edge(model, &root, incoming, leading);
        return;
    }

    let children = model
        .node(&root)
        .map(|node| node.children().to_vec())
        .unwrap_or_default();
    let inner = match children.as_slice() {
        [] => {
            model.push_child(&root, incoming.clone());
            return;
        }
        [only] if shape_of(model, only) == Some(NodeShape::Row) => {
            // The lone top-level row is already vertical.
            insert_at_edge(model, only, incoming, leading);
            return;
        }
        [only] => only.clone(),
        _ => {
            let row = model.allocate_id("row");
            model.insert_record(NodeRecord::new(
                row.clone(),
                Some(root.clone()),
                NodeKind::Row(RowNode {
                    children: children.clone(),
                    weight: DEFAULT_WEIGHT,
                }),
            ));
            for child in &children {
                model.set_parent(child, Some(row.clone()));
            }
            row
        }
    };

    let column = model.allocate_id("row");
    let ordered_children = ordered(&inner, incoming, leading);
    model.insert_record(NodeRecord::new(
        column.clone(),
        Some(root.clone()),
        NodeKind::Row(RowNode {
            children: ordered_children.clone(),
            weight: DEFAULT_WEIGHT,
        }),
    ));
    for child in &ordered_children {
        model.set_parent(child, Some(column.clone()));
    }
    if let Some(children) = model.node_mut(&root).and_then(NodeRecord::children_mut) {
        *children = vec![column];
    }
}
