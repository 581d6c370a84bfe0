#![forbid(unsafe_code)]

//! Dockyard layout core.
//!
//! A trading workspace is a tree of tabbed panels: a horizontal root, rows
//! that alternate orientation with depth, tabsets holding tabs, and four
//! border strips. This crate owns that tree and everything that changes it.
//!
//! # Key Components
//!
//! - [`LayoutModel`] - Validated layout tree with canonical [`LayoutSnapshot`] form
//! - [`Action`] - Serializable mutation requests emitted by a renderer
//! - [`DockingEngine`] - Pure `(model, action) -> model` transitions
//! - [`SizePolicy`] - Per-panel size rules and the automatic-resize guard
//! - [`default_layout`] - The layout a fresh workspace starts from
//!
//! The crate does no I/O. Persistence, popout windows and logging setup live
//! in `dockyard-runtime`.

pub mod action;
pub mod defaults;
pub mod engine;
pub mod model;
pub mod node;
pub mod size;

pub use action::{Action, NodeAttributes};
pub use defaults::{DEFAULT_CHART_PAIR, DEFAULT_CHART_PERIOD, default_layout, single_panel_layout};
pub use engine::{ActionOutcome, DockingEngine, NoopReason};
pub use model::{LAYOUT_SCHEMA_VERSION, LayoutModel, LayoutModelError, LayoutSnapshot, ROOT_ID};
pub use node::{
    Axis, BorderLocation, BorderNode, ChartTabId, DEFAULT_BORDER_SIZE, DEFAULT_WEIGHT,
    DockLocation, EXTRA_PAIR, EXTRA_PERIOD, NodeId, NodeIdError, NodeKind, NodeRecord, NodeShape,
    PanelKind, PanelResolver, RootNode, RowNode, TabNode, TabSetNode,
};
pub use size::{
    DEFAULT_MINIMIZED_SIZE, PanelSizing, ResizeTrigger, SizeAxis, SizeDecisionReason, SizePolicy,
    ToggleMode,
};
