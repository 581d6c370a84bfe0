//! Layout mutation requests emitted by the renderer.
//!
//! Actions are plain serializable data so a host can forward user gestures
//! (drag, splitter movement, tab click, close button) without knowing how the
//! engine implements them.

use serde::{Deserialize, Serialize};

use crate::node::{DockLocation, NodeId, TabNode};
use crate::size::{SizeAxis, SizeDecisionReason};

/// One layout mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Insert a brand-new tab relative to `target`.
    AddNode {
        id: NodeId,
        tab: TabNode,
        target: NodeId,
        location: DockLocation,
        #[serde(default)]
        index: Option<usize>,
    },
    /// Relocate an existing tab, keeping its identity and extra data.
    MoveNode {
        tab_id: NodeId,
        target: NodeId,
        location: DockLocation,
        #[serde(default)]
        index: Option<usize>,
    },
    /// Close one tab.
    DeleteTab { tab_id: NodeId },
    /// Close a whole tabset with all of its tabs.
    DeleteTabSet { tabset_id: NodeId },
    /// Activate a tab within its tabset or border.
    SelectTab { tab_id: NodeId },
    /// Shallow-merge size attributes onto a node.
    UpdateNodeAttributes {
        node_id: NodeId,
        attributes: NodeAttributes,
    },
    /// Change a tab's caption without touching its identity.
    RenameTab { tab_id: NodeId, name: String },
}

impl Action {
    /// Stable action name for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "add_node",
            Self::MoveNode { .. } => "move_node",
            Self::DeleteTab { .. } => "delete_tab",
            Self::DeleteTabSet { .. } => "delete_tabset",
            Self::SelectTab { .. } => "select_tab",
            Self::UpdateNodeAttributes { .. } => "update_node_attributes",
            Self::RenameTab { .. } => "rename_tab",
        }
    }

    /// Whether the action can change the tree shape (and so needs a tidy pass).
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AddNode { .. }
                | Self::MoveNode { .. }
                | Self::DeleteTab { .. }
                | Self::DeleteTabSet { .. }
        )
    }
}

/// Partial node attributes. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAttributes {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub weight: Option<u32>,
    pub size_reason: Option<SizeDecisionReason>,
}

impl NodeAttributes {
    /// Size and minimum along one axis.
    #[must_use]
    pub const fn along(axis: SizeAxis, size: u32, min: u32) -> Self {
        let mut attributes = Self {
            width: None,
            height: None,
            min_width: None,
            min_height: None,
            weight: None,
            size_reason: None,
        };
        match axis {
            SizeAxis::Width => {
                attributes.width = Some(size);
                attributes.min_width = Some(min);
            }
            SizeAxis::Height => {
                attributes.height = Some(size);
                attributes.min_height = Some(min);
            }
        }
        attributes
    }

    #[must_use]
    pub const fn with_reason(mut self, reason: SizeDecisionReason) -> Self {
        self.size_reason = Some(reason);
        self
    }

    #[must_use]
    pub const fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && self.min_width.is_none()
            && self.min_height.is_none()
            && self.weight.is_none()
            && self.size_reason.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PanelKind;

    #[test]
    fn actions_deserialize_from_renderer_json() {
        let json = r#"{
            "action": "move_node",
            "tab_id": "account",
            "target": "border_right",
            "location": "center"
        }"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            Action::MoveNode {
                tab_id: NodeId::new("account").unwrap(),
                target: NodeId::new("border_right").unwrap(),
                location: DockLocation::Center,
                index: None,
            }
        );
        assert!(action.is_structural());
        assert_eq!(action.name(), "move_node");
    }

    #[test]
    fn add_node_carries_tab_payload() {
        let action = Action::AddNode {
            id: NodeId::new("BTC_USD_1").unwrap(),
            tab: TabNode::chart("BTC_USD", "15m"),
            target: NodeId::new("tabset_chart").unwrap(),
            location: DockLocation::Center,
            index: Some(1),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "add_node");
        assert_eq!(json["tab"]["kind"], PanelKind::Chart.as_str());
        assert_eq!(json["tab"]["extra"]["period"], "15m");
    }

    #[test]
    fn along_sets_only_one_axis() {
        let attrs = NodeAttributes::along(SizeAxis::Height, 240, 120);
        assert_eq!(attrs.height, Some(240));
        assert_eq!(attrs.min_height, Some(120));
        assert_eq!(attrs.width, None);
        assert!(!attrs.is_empty());
        assert!(NodeAttributes::default().is_empty());
    }
}
