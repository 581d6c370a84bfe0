//! Per-panel size policy and the resize guard.
//!
//! Every sized panel kind has a minimum and a default extent along one axis
//! (width for vertically docked panels, height for horizontally docked ones).
//! Each tabset records *why* it has its current size in a
//! [`SizeDecisionReason`]; automatic, viewport-driven resizes consult that
//! reason so a deliberate user resize or close is never undone by a heuristic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{Action, NodeAttributes};
use crate::model::LayoutModel;
use crate::node::{NodeId, PanelKind, TabSetNode};

/// Default extent of a minimized tabset (tab strip only).
pub const DEFAULT_MINIMIZED_SIZE: u32 = 32;

/// Why a tabset has its current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeDecisionReason {
    /// Policy default (fresh tabset or automatically restored).
    #[default]
    Default,
    /// The user collapsed the tabset.
    Minimized,
    /// The user dragged or restored the tabset to a size of their choosing.
    UserResized,
    /// A viewport heuristic collapsed the tabset.
    AutoHidden,
}

impl SizeDecisionReason {
    /// Whether the recorded size is the minimized extent.
    #[must_use]
    pub const fn is_minimized(self) -> bool {
        matches!(self, Self::Minimized | Self::AutoHidden)
    }

    /// Whether the user deliberately chose the current size.
    #[must_use]
    pub const fn is_user_decision(self) -> bool {
        matches!(self, Self::Minimized | Self::UserResized)
    }
}

/// Origin of a resize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeTrigger {
    /// Explicit gesture (toggle button, splitter drag).
    User,
    /// Viewport-driven heuristic (window narrower than a breakpoint, ...).
    Automatic,
}

/// Requested toggle direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleMode {
    /// Flip between minimized and default.
    Toggle,
    /// Force minimized.
    Hide,
    /// Force default.
    Show,
}

/// Dimension a panel kind is sized along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeAxis {
    Width,
    Height,
}

/// Size bounds for one panel kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSizing {
    pub axis: SizeAxis,
    pub min_size: u32,
    pub default_size: u32,
}

impl PanelSizing {
    #[must_use]
    pub const fn width(min_size: u32, default_size: u32) -> Self {
        Self {
            axis: SizeAxis::Width,
            min_size,
            default_size,
        }
    }

    #[must_use]
    pub const fn height(min_size: u32, default_size: u32) -> Self {
        Self {
            axis: SizeAxis::Height,
            min_size,
            default_size,
        }
    }

    /// Minimum actually applied to tabsets, never above the default so a
    /// key panel always lands at exactly its default size.
    #[must_use]
    pub const fn min_extent(&self) -> u32 {
        if self.min_size < self.default_size {
            self.min_size
        } else {
            self.default_size
        }
    }
}

/// Size rules for every sized panel kind.
///
/// `chart` is intentionally absent: charts absorb the remaining space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizePolicy {
    pub minimized_size: u32,
    pub panels: BTreeMap<PanelKind, PanelSizing>,
}

impl Default for SizePolicy {
    fn default() -> Self {
        let panels = BTreeMap::from([
            (PanelKind::Markets, PanelSizing::width(280, 320)),
            (PanelKind::Form, PanelSizing::width(300, 340)),
            (PanelKind::Account, PanelSizing::width(280, 300)),
            (PanelKind::Chat, PanelSizing::width(240, 300)),
            (PanelKind::Positions, PanelSizing::height(120, 240)),
            (PanelKind::Trades, PanelSizing::height(120, 240)),
            (PanelKind::Transactions, PanelSizing::height(120, 240)),
            (PanelKind::Portfolio, PanelSizing::height(120, 260)),
        ]);
        Self {
            minimized_size: DEFAULT_MINIMIZED_SIZE,
            panels,
        }
    }
}

impl SizePolicy {
    /// Size rules for `kind`, if it is sized at all.
    #[must_use]
    pub fn sizing(&self, kind: PanelKind) -> Option<PanelSizing> {
        self.panels.get(&kind).copied()
    }

    #[must_use]
    pub fn is_minimized_size(&self, size: u32) -> bool {
        size <= self.minimized_size
    }

    /// New extent for a toggle request.
    ///
    /// `Toggle` restores the default when the panel is currently at or below
    /// the minimized size and minimizes it otherwise.
    #[must_use]
    pub fn toggle_size(&self, kind: PanelKind, current_size: u32, mode: ToggleMode) -> Option<u32> {
        let sizing = self.sizing(kind)?;
        let size = match mode {
            ToggleMode::Hide => self.minimized_size,
            ToggleMode::Show => sizing.default_size,
            ToggleMode::Toggle if self.is_minimized_size(current_size) => sizing.default_size,
            ToggleMode::Toggle => self.minimized_size,
        };
        Some(size)
    }

    /// Whether a resize from `trigger` may touch a tabset whose size was
    /// decided for `reason`.
    #[must_use]
    pub const fn resize_guard(reason: SizeDecisionReason, trigger: ResizeTrigger) -> bool {
        match trigger {
            ResizeTrigger::User => true,
            ResizeTrigger::Automatic => !reason.is_user_decision(),
        }
    }

    /// Build the attribute update for toggling `tabset_id`.
    ///
    /// Returns `None` when the tabset is gone, its active panel is unsized, or
    /// the resize guard suppresses an automatic trigger.
    #[must_use]
    pub fn toggle_action(
        &self,
        model: &LayoutModel,
        tabset_id: &NodeId,
        mode: ToggleMode,
        trigger: ResizeTrigger,
    ) -> Option<Action> {
        let (tabset, sizing) = self.resolve(model, tabset_id)?;
        if !Self::resize_guard(tabset.size_reason, trigger) {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                target: "dockyard.size",
                tabset = %tabset_id,
                reason = ?tabset.size_reason,
                "automatic resize suppressed by user decision"
            );
            return None;
        }
        let current = extent(tabset, sizing.axis).unwrap_or(sizing.default_size);
        let kind = model.active_tab(tabset_id)?.1.kind;
        let size = self.toggle_size(kind, current, mode)?;
        let minimized = self.is_minimized_size(size);
        let reason = match (trigger, minimized) {
            (ResizeTrigger::User, true) => SizeDecisionReason::Minimized,
            (ResizeTrigger::User, false) => SizeDecisionReason::UserResized,
            (ResizeTrigger::Automatic, true) => SizeDecisionReason::AutoHidden,
            (ResizeTrigger::Automatic, false) => SizeDecisionReason::Default,
        };
        let min = if minimized {
            self.minimized_size
        } else {
            sizing.min_extent()
        };
        let unchanged = current == size
            && extent_min(tabset, sizing.axis) == Some(min)
            && tabset.size_reason == reason;
        if unchanged {
            return None;
        }
        Some(Action::UpdateNodeAttributes {
            node_id: tabset_id.clone(),
            attributes: NodeAttributes::along(sizing.axis, size, min).with_reason(reason),
        })
    }

    /// Build the attribute update for a user splitter drag to `size`.
    ///
    /// Sizes at or below the minimized extent snap to minimized; anything else
    /// is clamped up to the panel minimum.
    #[must_use]
    pub fn resize_action(&self, model: &LayoutModel, tabset_id: &NodeId, size: u32) -> Option<Action> {
        let (_, sizing) = self.resolve(model, tabset_id)?;
        let attributes = if self.is_minimized_size(size) {
            NodeAttributes::along(sizing.axis, self.minimized_size, self.minimized_size)
                .with_reason(SizeDecisionReason::Minimized)
        } else {
            NodeAttributes::along(sizing.axis, size.max(sizing.min_extent()), sizing.min_extent())
                .with_reason(SizeDecisionReason::UserResized)
        };
        Some(Action::UpdateNodeAttributes {
            node_id: tabset_id.clone(),
            attributes,
        })
    }

    /// Viewport-driven hide/show for every key-panel tabset.
    ///
    /// Narrower than `breakpoint` hides, otherwise shows. Tabsets whose size
    /// the user decided are left alone.
    #[must_use]
    pub fn auto_fit(&self, model: &LayoutModel, viewport_width: u32, breakpoint: u32) -> Vec<Action> {
        let mode = if viewport_width < breakpoint {
            ToggleMode::Hide
        } else {
            ToggleMode::Show
        };
        model
            .tabset_ids()
            .into_iter()
            .filter(|id| {
                model
                    .active_tab(id)
                    .is_some_and(|(_, tab)| tab.kind.is_key_panel())
            })
            .filter_map(|id| self.toggle_action(model, &id, mode, ResizeTrigger::Automatic))
            .collect()
    }

    fn resolve<'a>(
        &self,
        model: &'a LayoutModel,
        tabset_id: &NodeId,
    ) -> Option<(&'a TabSetNode, PanelSizing)> {
        let tabset = model.tabset(tabset_id)?;
        let (_, tab) = model.active_tab(tabset_id)?;
        let sizing = self.sizing(tab.kind)?;
        Some((tabset, sizing))
    }
}

fn extent(tabset: &TabSetNode, axis: SizeAxis) -> Option<u32> {
    match axis {
        SizeAxis::Width => tabset.width,
        SizeAxis::Height => tabset.height,
    }
}

fn extent_min(tabset: &TabSetNode, axis: SizeAxis) -> Option<u32> {
    match axis {
        SizeAxis::Width => tabset.min_width,
        SizeAxis::Height => tabset.min_height,
    }
}
