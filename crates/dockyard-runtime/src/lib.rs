#![forbid(unsafe_code)]

//! Dockyard runtime: everything around the pure layout engine that touches
//! the outside world.
//!
//! # Key Components
//!
//! - [`Workspace`] - Live session: dispatches actions, persists the result
//! - [`PersistenceStore`] - Versioned layout and panel-state documents
//! - [`KeyValueStorage`] - Storage seam with [`MemoryStorage`] and [`FileStorage`]
//! - [`PopoutCoordinator`] - Read-only popout window projection
//! - [`DockyardConfig`] - TOML/JSON configuration
//! - [`logging::init`] - fmt subscriber installation

pub mod config;
pub mod logging;
pub mod popout;
pub mod storage;
pub mod store;
pub mod workspace;

pub use dockyard_layout as layout;

pub use config::{ConfigError, DEFAULT_AUTO_FIT_BREAKPOINT, DEFAULT_POPOUT_ORIGIN, DockyardConfig};
pub use popout::{
    PopoutCoordinator, PopoutError, PopoutParams, PopoutRequest, WindowHandle, WindowOpener,
    window_size,
};
pub use storage::{
    ConfiguredStorage, FileStorage, KeyValueStorage, MemoryStorage, StorageError, StorageResult,
};
pub use store::{
    LAYOUT_KEY, LoadSource, PANEL_STATE_VERSION, PanelKey, PersistenceStore, VersionedDocument,
};
pub use workspace::Workspace;
