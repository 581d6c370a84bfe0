//! Validated layout tree and its canonical snapshot form.
//!
//! [`LayoutModel`] is the single source of truth for the workspace shape. It
//! is immutable by convention: the docking engine clones it, mutates the
//! clone, tidies it and hands back a replacement. [`LayoutSnapshot`] is the
//! serialized shape handed to renderers and persisted to storage.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::node::{
    Axis, BorderLocation, BorderNode, ChartTabId, NodeId, NodeKind, NodeRecord, NodeShape, PanelKind,
    RootNode, TabNode, TabSetNode,
};

/// Current layout schema version.
///
/// Breaking changes to node payloads must bump this; persisted layouts with
/// any other version are discarded rather than migrated.
pub const LAYOUT_SCHEMA_VERSION: u32 = 1;

/// Id of the root node in every layout built by this crate.
pub const ROOT_ID: &str = "root";

/// Canonical serialized layout shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub root: NodeId,
    /// Counter used to mint ids for engine-created rows and tabsets.
    #[serde(default)]
    pub next_serial: u64,
    pub nodes: Vec<NodeRecord>,
}

impl LayoutSnapshot {
    /// Sort nodes by id for deterministic serialization.
    pub fn canonicalize(&mut self) {
        self.nodes.sort_by(|a, b| a.id.cmp(&b.id));
    }
}

/// Validated layout tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutModel {
    root: NodeId,
    next_serial: u64,
    nodes: BTreeMap<NodeId, NodeRecord>,
}

impl LayoutModel {
    /// Layout holding only the root and four empty borders.
    #[must_use]
    pub fn empty() -> Self {
        let root = NodeId::from_static(ROOT_ID);
        let borders: Vec<NodeId> = BorderLocation::ALL
            .into_iter()
            .map(BorderLocation::node_id)
            .collect();
        let mut nodes = BTreeMap::new();
        for location in BorderLocation::ALL {
            let border_id = location.node_id();
            let _ = nodes.insert(
                border_id.clone(),
                NodeRecord::new(
                    border_id,
                    Some(root.clone()),
                    NodeKind::Border(BorderNode::new(location)),
                ),
            );
        }
        let _ = nodes.insert(
            root.clone(),
            NodeRecord::new(
                root.clone(),
                None,
                NodeKind::Root(RootNode {
                    children: Vec::new(),
                    borders,
                }),
            ),
        );
        Self {
            root,
            next_serial: 1,
            nodes,
        }
    }

    /// Construct and validate from a serial snapshot.
    pub fn from_snapshot(mut snapshot: LayoutSnapshot) -> Result<Self, LayoutModelError> {
        snapshot.canonicalize();
        let mut nodes = BTreeMap::new();
        for node in snapshot.nodes {
            let node_id = node.id.clone();
            if nodes.insert(node_id.clone(), node).is_some() {
                return Err(LayoutModelError::DuplicateNodeId { node_id });
            }
        }
        let model = Self {
            root: snapshot.root,
            next_serial: snapshot.next_serial.max(1),
            nodes,
        };
        model.validate()?;
        Ok(model)
    }

    /// Export to canonical snapshot form.
    #[must_use]
    pub fn to_snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            root: self.root.clone(),
            next_serial: self.next_serial,
            nodes: self.nodes.values().cloned().collect(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &NodeId {
        &self.root
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate nodes in canonical id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.nodes.get(id).and_then(|node| node.parent.as_ref())
    }

    /// Flex weight of a row or tabset.
    #[must_use]
    pub fn weight_of(&self, id: &NodeId) -> Option<u32> {
        self.nodes.get(id).and_then(NodeRecord::weight)
    }

    #[must_use]
    pub fn tab(&self, id: &NodeId) -> Option<&TabNode> {
        self.nodes.get(id).and_then(NodeRecord::as_tab)
    }

    #[must_use]
    pub fn tabset(&self, id: &NodeId) -> Option<&TabSetNode> {
        self.nodes.get(id).and_then(NodeRecord::as_tabset)
    }

    #[must_use]
    pub fn border(&self, location: BorderLocation) -> Option<&BorderNode> {
        self.nodes
            .get(&location.node_id())
            .and_then(NodeRecord::as_border)
    }

    /// Active tab of a tabset.
    #[must_use]
    pub fn active_tab(&self, tabset_id: &NodeId) -> Option<(&NodeId, &TabNode)> {
        let tab_id = self.tabset(tabset_id)?.active()?;
        Some((tab_id, self.tab(tab_id)?))
    }

    /// Every tab, in canonical id order.
    pub fn tabs(&self) -> impl Iterator<Item = (&NodeId, &TabNode)> {
        self.nodes
            .values()
            .filter_map(|node| node.as_tab().map(|tab| (&node.id, tab)))
    }

    /// Ids of tabs of one panel kind.
    #[must_use]
    pub fn tabs_of_kind(&self, kind: PanelKind) -> Vec<&NodeId> {
        self.tabs()
            .filter(|(_, tab)| tab.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Next free chart tab id for `pair` (one past the highest sequence in use).
    #[must_use]
    pub fn next_chart_id(&self, pair: &str) -> NodeId {
        let sequence = self
            .tabs_of_kind(PanelKind::Chart)
            .into_iter()
            .filter_map(|id| ChartTabId::parse(id.as_str()).ok())
            .filter(|chart| chart.pair == pair)
            .map(|chart| chart.sequence)
            .max()
            .unwrap_or(0);
        ChartTabId::new(pair, sequence.saturating_add(1)).to_node_id()
    }

    /// Ids of every tabset in canonical order.
    #[must_use]
    pub fn tabset_ids(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| matches!(node.kind, NodeKind::TabSet(_)))
            .map(|node| node.id.clone())
            .collect()
    }

    /// Whether the tab currently lives in a border strip.
    #[must_use]
    pub fn is_in_border(&self, tab_id: &NodeId) -> bool {
        self.parent_of(tab_id)
            .and_then(|parent| self.nodes.get(parent))
            .is_some_and(|parent| matches!(parent.kind, NodeKind::Border(_)))
    }

    /// Distance from the root (root is 0).
    #[must_use]
    pub fn depth(&self, id: &NodeId) -> Option<usize> {
        let mut depth = 0usize;
        let mut cursor = self.nodes.get(id)?;
        while let Some(parent) = &cursor.parent {
            depth += 1;
            if depth > self.nodes.len() {
                return None;
            }
            cursor = self.nodes.get(parent)?;
        }
        Some(depth)
    }

    /// Layout axis of a root or row container.
    #[must_use]
    pub fn axis_of(&self, container: &NodeId) -> Option<Axis> {
        match self.nodes.get(container)?.kind {
            NodeKind::Root(_) | NodeKind::Row(_) => Some(Axis::for_depth(self.depth(container)?)),
            _ => None,
        }
    }

    /// Resolve the visible panel of every tabset and expanded border through
    /// a host resolver.
    pub fn resolve_visible<R: crate::node::PanelResolver>(
        &self,
        resolver: &R,
    ) -> Vec<(NodeId, R::Output)> {
        let mut visible = Vec::new();
        for node in self.nodes.values() {
            let shown = match &node.kind {
                NodeKind::TabSet(tabset) => tabset.active(),
                NodeKind::Border(border) => border
                    .selected
                    .and_then(|index| border.children.get(index)),
                _ => None,
            };
            if let Some(tab_id) = shown
                && let Some(tab) = self.tab(tab_id)
            {
                visible.push((tab_id.clone(), resolver.resolve(tab.kind, &tab.extra)));
            }
        }
        visible
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<(), LayoutModelError> {
        validate_layout(self)
    }

    /// Deterministic structural hash of the current layout.
    ///
    /// Intended for dispatch logs and replay diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        fn mix(hash: &mut u64, byte: u8) {
            *hash ^= u64::from(byte);
            *hash = hash.wrapping_mul(PRIME);
        }

        fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
            for byte in bytes {
                mix(hash, *byte);
            }
        }

        fn mix_u64(hash: &mut u64, value: u64) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        fn mix_opt_u32(hash: &mut u64, value: Option<u32>) {
            match value {
                Some(value) => {
                    mix(hash, 1);
                    mix_bytes(hash, &value.to_le_bytes());
                }
                None => mix(hash, 0),
            }
        }

        fn mix_str(hash: &mut u64, value: &str) {
            mix_u64(hash, value.len() as u64);
            mix_bytes(hash, value.as_bytes());
        }

        fn mix_ids(hash: &mut u64, ids: &[NodeId]) {
            mix_u64(hash, ids.len() as u64);
            for id in ids {
                mix_str(hash, id.as_str());
            }
        }

        let mut hash = OFFSET_BASIS;
        mix_str(&mut hash, self.root.as_str());
        mix_u64(&mut hash, self.next_serial);
        mix_u64(&mut hash, self.nodes.len() as u64);

        for node in self.nodes.values() {
            mix_str(&mut hash, node.id.as_str());
            match &node.parent {
                Some(parent) => {
                    mix(&mut hash, 1);
                    mix_str(&mut hash, parent.as_str());
                }
                None => mix(&mut hash, 0),
            }

            match &node.kind {
                NodeKind::Root(root) => {
                    mix(&mut hash, 1);
                    mix_ids(&mut hash, &root.children);
                    mix_ids(&mut hash, &root.borders);
                }
                NodeKind::Row(row) => {
                    mix(&mut hash, 2);
                    mix_ids(&mut hash, &row.children);
                    mix_u64(&mut hash, u64::from(row.weight));
                }
                NodeKind::TabSet(tabset) => {
                    mix(&mut hash, 3);
                    mix_ids(&mut hash, &tabset.children);
                    mix_u64(&mut hash, tabset.selected as u64);
                    mix_opt_u32(&mut hash, tabset.width);
                    mix_opt_u32(&mut hash, tabset.height);
                    mix_opt_u32(&mut hash, tabset.min_width);
                    mix_opt_u32(&mut hash, tabset.min_height);
                    mix_u64(&mut hash, u64::from(tabset.weight));
                    mix(&mut hash, tabset.size_reason as u8);
                }
                NodeKind::Tab(tab) => {
                    mix(&mut hash, 4);
                    mix_str(&mut hash, &tab.name);
                    mix_str(&mut hash, tab.kind.as_str());
                    mix_u64(&mut hash, tab.extra.len() as u64);
                    for (key, value) in &tab.extra {
                        mix_str(&mut hash, key);
                        mix_str(&mut hash, value);
                    }
                }
                NodeKind::Border(border) => {
                    mix(&mut hash, 5);
                    mix_str(&mut hash, border.location.as_str());
                    mix_ids(&mut hash, &border.children);
                    mix_opt_u32(
                        &mut hash,
                        border.selected.map(|index| index as u32),
                    );
                    mix_u64(&mut hash, u64::from(border.size));
                }
            }
        }

        hash
    }

    // ---------------------------------------------------------------------
    // Crate-internal mutation used by the engine and the default builders.
    // ---------------------------------------------------------------------

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn insert_record(&mut self, record: NodeRecord) {
        let _ = self.nodes.insert(record.id.clone(), record);
    }

    pub(crate) fn remove_record(&mut self, id: &NodeId) -> Option<NodeRecord> {
        self.nodes.remove(id)
    }

    pub(crate) fn set_parent(&mut self, id: &NodeId, parent: Option<NodeId>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
        }
    }

    /// Mint an unused id of the form `{prefix}_{serial}`.
    pub(crate) fn allocate_id(&mut self, prefix: &str) -> NodeId {
        loop {
            let serial = self.next_serial;
            self.next_serial = self.next_serial.saturating_add(1);
            if let Ok(candidate) = NodeId::new(format!("{prefix}_{serial}"))
                && !self.nodes.contains_key(&candidate)
            {
                return candidate;
            }
        }
    }

    /// Append `child` to a container and point it back at the container.
    pub(crate) fn push_child(&mut self, parent: &NodeId, child: NodeId) {
        if let Some(children) = self.nodes.get_mut(parent).and_then(NodeRecord::children_mut) {
            children.push(child.clone());
        }
        self.set_parent(&child, Some(parent.clone()));
    }

    /// Prune empty tabsets, collapse singleton rows, clamp selections.
    ///
    /// Collapsing splices a lone row's children into the grandparent so the
    /// depth-derived orientation of every surviving container is unchanged.
    pub(crate) fn tidy(&mut self) {
        let root = self.root.clone();
        self.tidy_container(&root);
        for location in BorderLocation::ALL {
            if let Some(NodeRecord {
                kind: NodeKind::Border(border),
                ..
            }) = self.nodes.get_mut(&location.node_id())
            {
                border.selected = clamp_optional(border.selected, border.children.len());
            }
        }
    }

    fn tidy_container(&mut self, container: &NodeId) {
        let children = match self.nodes.get(container) {
            Some(node) => node.children().to_vec(),
            None => return,
        };
        for child in children {
            let Some(shape) = self.nodes.get(&child).map(|node| node.kind.shape()) else {
                self.detach_from(container, &child);
                continue;
            };
            match shape {
                NodeShape::TabSet => self.tidy_tabset(container, &child),
                NodeShape::Row => {
                    self.tidy_container(&child);
                    self.collapse_row(container, &child);
                }
                _ => {}
            }
        }
    }

    fn tidy_tabset(&mut self, container: &NodeId, tabset_id: &NodeId) {
        let empty = match self.nodes.get_mut(tabset_id) {
            Some(NodeRecord {
                kind: NodeKind::TabSet(tabset),
                ..
            }) => {
                if tabset.selected >= tabset.children.len() {
                    tabset.selected = tabset.children.len().saturating_sub(1);
                }
                tabset.children.is_empty()
            }
            _ => false,
        };
        if empty {
            self.detach_from(container, tabset_id);
            let _ = self.nodes.remove(tabset_id);
        }
    }

    fn collapse_row(&mut self, container: &NodeId, row_id: &NodeId) {
        let (children, weight) = match self.nodes.get(row_id) {
            Some(NodeRecord {
                kind: NodeKind::Row(row),
                ..
            }) => (row.children.clone(), row.weight),
            _ => return,
        };
        match children.as_slice() {
            [] => {
                self.detach_from(container, row_id);
                let _ = self.nodes.remove(row_id);
            }
            [only] => {
                let only = only.clone();
                let only_is_row = self
                    .nodes
                    .get(&only)
                    .is_some_and(|node| node.kind.shape() == NodeShape::Row);
                let replacement = if only_is_row {
                    let grandchildren = self
                        .nodes
                        .get(&only)
                        .map(|node| node.children().to_vec())
                        .unwrap_or_default();
                    let _ = self.nodes.remove(&only);
                    grandchildren
                } else {
                    if let Some(node) = self.nodes.get_mut(&only) {
                        node.set_weight(weight);
                    }
                    vec![only]
                };
                for id in &replacement {
                    self.set_parent(id, Some(container.clone()));
                }
                self.splice_child(container, row_id, &replacement);
                let _ = self.nodes.remove(row_id);
            }
            _ => {}
        }
    }

    /// Replace `old` in `container`'s child list with `replacement`.
    pub(crate) fn splice_child(&mut self, container: &NodeId, old: &NodeId, replacement: &[NodeId]) {
        if let Some(children) = self
            .nodes
            .get_mut(container)
            .and_then(NodeRecord::children_mut)
            && let Some(index) = children.iter().position(|id| id == old)
        {
            let _ = children.splice(index..=index, replacement.iter().cloned());
        }
    }

    /// Remove `child` from `container`'s child list.
    pub(crate) fn detach_from(&mut self, container: &NodeId, child: &NodeId) {
        if let Some(children) = self
            .nodes
            .get_mut(container)
            .and_then(NodeRecord::children_mut)
        {
            children.retain(|id| id != child);
        }
    }
}

fn clamp_optional(selected: Option<usize>, len: usize) -> Option<usize> {
    match selected {
        _ if len == 0 => None,
        Some(index) if index >= len => Some(len - 1),
        other => other,
    }
}

/// Structural validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutModelError {
    EmptyNodeId,
    DuplicateNodeId {
        node_id: NodeId,
    },
    MissingRoot {
        root: NodeId,
    },
    RootNotRoot {
        root: NodeId,
        kind: &'static str,
    },
    RootHasParent {
        root: NodeId,
        parent: NodeId,
    },
    ExtraRoot {
        node_id: NodeId,
    },
    MissingChild {
        parent: NodeId,
        child: NodeId,
    },
    ParentMismatch {
        node_id: NodeId,
        expected: NodeId,
        actual: Option<NodeId>,
    },
    DuplicateChild {
        parent: NodeId,
        child: NodeId,
    },
    IllegalNesting {
        node_id: NodeId,
        kind: &'static str,
        parent_kind: &'static str,
    },
    EmptyTabSet {
        node_id: NodeId,
    },
    UnderfilledRow {
        node_id: NodeId,
        children: usize,
    },
    SelectionOutOfRange {
        node_id: NodeId,
        selected: usize,
        len: usize,
    },
    BorderMismatch {
        node_id: NodeId,
        location: BorderLocation,
    },
    MissingBorder {
        location: BorderLocation,
    },
    SizeBelowMinimum {
        node_id: NodeId,
        axis: &'static str,
        size: u32,
        min: u32,
    },
    DuplicatePanel {
        kind: PanelKind,
        first: NodeId,
        second: NodeId,
    },
    MalformedChartId {
        node_id: NodeId,
    },
    UnreachableNode {
        node_id: NodeId,
    },
}

impl fmt::Display for LayoutModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyNodeId => write!(f, "layout contains an empty node id"),
            Self::DuplicateNodeId { node_id } => write!(f, "duplicate layout node id {node_id}"),
            Self::MissingRoot { root } => write!(f, "root node {root} not found"),
            Self::RootNotRoot { root, kind } => {
                write!(f, "root node {root} is a {kind}, not a root")
            }
            Self::RootHasParent { root, parent } => {
                write!(f, "root node {root} must not have parent {parent}")
            }
            Self::ExtraRoot { node_id } => {
                write!(f, "node {node_id} is a second root container")
            }
            Self::MissingChild { parent, child } => {
                write!(f, "node {parent} references missing child {child}")
            }
            Self::ParentMismatch {
                node_id,
                expected,
                actual,
            } => write!(
                f,
                "node {node_id} parent mismatch: expected {expected}, got {}",
                actual.as_ref().map_or("none", NodeId::as_str)
            ),
            Self::DuplicateChild { parent, child } => {
                write!(f, "node {parent} lists child {child} more than once")
            }
            Self::IllegalNesting {
                node_id,
                kind,
                parent_kind,
            } => write!(f, "{kind} {node_id} cannot live inside a {parent_kind}"),
            Self::EmptyTabSet { node_id } => write!(f, "tabset {node_id} has no tabs"),
            Self::UnderfilledRow { node_id, children } => write!(
                f,
                "row {node_id} has {children} child(ren); rows need at least 2"
            ),
            Self::SelectionOutOfRange {
                node_id,
                selected,
                len,
            } => write!(
                f,
                "node {node_id} selects index {selected} but has {len} tab(s)"
            ),
            Self::BorderMismatch { node_id, location } => write!(
                f,
                "border {node_id} does not match its {} edge id",
                location.as_str()
            ),
            Self::MissingBorder { location } => {
                write!(f, "layout has no {} border", location.as_str())
            }
            Self::SizeBelowMinimum {
                node_id,
                axis,
                size,
                min,
            } => write!(f, "tabset {node_id} {axis}={size} is below its minimum {min}"),
            Self::DuplicatePanel {
                kind,
                first,
                second,
            } => write!(
                f,
                "single-instance panel {kind} appears twice ({first} and {second})"
            ),
            Self::MalformedChartId { node_id } => {
                write!(f, "chart tab id {node_id} is not of the form {{pair}}_{{sequence}}")
            }
            Self::UnreachableNode { node_id } => {
                write!(f, "node {node_id} is unreachable from root")
            }
        }
    }
}

impl std::error::Error for LayoutModelError {}

fn validate_layout(model: &LayoutModel) -> Result<(), LayoutModelError> {
    let nodes = &model.nodes;
    let root = nodes.get(&model.root).ok_or_else(|| LayoutModelError::MissingRoot {
        root: model.root.clone(),
    })?;
    let NodeKind::Root(root_node) = &root.kind else {
        return Err(LayoutModelError::RootNotRoot {
            root: model.root.clone(),
            kind: root.kind.label(),
        });
    };
    if let Some(parent) = &root.parent {
        return Err(LayoutModelError::RootHasParent {
            root: model.root.clone(),
            parent: parent.clone(),
        });
    }

    for location in BorderLocation::ALL {
        let border_id = location.node_id();
        if !root_node.borders.contains(&border_id) {
            return Err(LayoutModelError::MissingBorder { location });
        }
    }

    let mut single_instance: BTreeMap<PanelKind, NodeId> = BTreeMap::new();
    for node in nodes.values() {
        if node.id.is_blank() {
            return Err(LayoutModelError::EmptyNodeId);
        }
        match &node.kind {
            NodeKind::Root(_) if node.id != model.root => {
                return Err(LayoutModelError::ExtraRoot {
                    node_id: node.id.clone(),
                });
            }
            NodeKind::TabSet(tabset) => {
                if tabset.children.is_empty() {
                    return Err(LayoutModelError::EmptyTabSet {
                        node_id: node.id.clone(),
                    });
                }
                if tabset.selected >= tabset.children.len() {
                    return Err(LayoutModelError::SelectionOutOfRange {
                        node_id: node.id.clone(),
                        selected: tabset.selected,
                        len: tabset.children.len(),
                    });
                }
                check_min(&node.id, "width", tabset.width, tabset.min_width)?;
                check_min(&node.id, "height", tabset.height, tabset.min_height)?;
            }
            NodeKind::Row(row) if row.children.len() < 2 => {
                return Err(LayoutModelError::UnderfilledRow {
                    node_id: node.id.clone(),
                    children: row.children.len(),
                });
            }
            NodeKind::Border(border) => {
                if node.id != border.location.node_id() {
                    return Err(LayoutModelError::BorderMismatch {
                        node_id: node.id.clone(),
                        location: border.location,
                    });
                }
                if let Some(selected) = border.selected
                    && selected >= border.children.len()
                {
                    return Err(LayoutModelError::SelectionOutOfRange {
                        node_id: node.id.clone(),
                        selected,
                        len: border.children.len(),
                    });
                }
            }
            NodeKind::Tab(tab) => {
                if tab.kind.allows_multiple() {
                    if ChartTabId::parse(node.id.as_str()).is_err() {
                        return Err(LayoutModelError::MalformedChartId {
                            node_id: node.id.clone(),
                        });
                    }
                } else if let Some(first) = single_instance.insert(tab.kind, node.id.clone()) {
                    return Err(LayoutModelError::DuplicatePanel {
                        kind: tab.kind,
                        first,
                        second: node.id.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    // Walk from the root, checking parent links and nesting rules.
    let mut visited: FxHashSet<&NodeId> = FxHashSet::default();
    let _ = visited.insert(&model.root);
    let mut stack: Vec<&NodeId> = vec![&model.root];
    while let Some(parent_id) = stack.pop() {
        let Some(parent) = nodes.get(parent_id) else {
            continue;
        };
        let borders: &[NodeId] = match &parent.kind {
            NodeKind::Root(root) => &root.borders,
            _ => &[],
        };
        for child_id in parent.children().iter().chain(borders) {
            let child = nodes
                .get(child_id)
                .ok_or_else(|| LayoutModelError::MissingChild {
                    parent: parent_id.clone(),
                    child: child_id.clone(),
                })?;
            if child.parent.as_ref() != Some(parent_id) {
                return Err(LayoutModelError::ParentMismatch {
                    node_id: child_id.clone(),
                    expected: parent_id.clone(),
                    actual: child.parent.clone(),
                });
            }
            if !visited.insert(child_id) {
                return Err(LayoutModelError::DuplicateChild {
                    parent: parent_id.clone(),
                    child: child_id.clone(),
                });
            }
            check_nesting(parent, child, borders.contains(child_id))?;
            stack.push(child_id);
        }
    }

    if let Some(node) = nodes.values().find(|node| !visited.contains(&node.id)) {
        return Err(LayoutModelError::UnreachableNode {
            node_id: node.id.clone(),
        });
    }

    Ok(())
}

fn check_min(
    node_id: &NodeId,
    axis: &'static str,
    size: Option<u32>,
    min: Option<u32>,
) -> Result<(), LayoutModelError> {
    if let (Some(size), Some(min)) = (size, min)
        && size < min
    {
        return Err(LayoutModelError::SizeBelowMinimum {
            node_id: node_id.clone(),
            axis,
            size,
            min,
        });
    }
    Ok(())
}

fn check_nesting(
    parent: &NodeRecord,
    child: &NodeRecord,
    as_border: bool,
) -> Result<(), LayoutModelError> {
    let legal = match (&parent.kind, &child.kind) {
        (NodeKind::Root(_), NodeKind::Border(_)) => as_border,
        (NodeKind::Root(_) | NodeKind::Row(_), NodeKind::Row(_) | NodeKind::TabSet(_)) => {
            !as_border
        }
        (NodeKind::TabSet(_) | NodeKind::Border(_), NodeKind::Tab(_)) => true,
        _ => false,
    };
    if legal {
        Ok(())
    } else {
        Err(LayoutModelError::IllegalNesting {
            node_id: child.id.clone(),
            kind: child.kind.label(),
            parent_kind: parent.kind.label(),
        })
    }
}
