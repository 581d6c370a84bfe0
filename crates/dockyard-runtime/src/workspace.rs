//! One live workspace session.
//!
//! [`Workspace`] owns the current [`LayoutModel`], routes every [`Action`]
//! through the [`DockingEngine`] in dispatch order and persists the result.
//! Saves are fire-and-forget: a failed write is logged and the in-memory
//! layout stays authoritative.

use dockyard_layout::{
    Action, ActionOutcome, DockingEngine, LayoutModel, NodeId, ResizeTrigger, SizePolicy,
    ToggleMode, default_layout,
};
use serde_json::Value;

use crate::config::{ConfigError, DockyardConfig};
use crate::popout::{PopoutCoordinator, PopoutError, WindowHandle, WindowOpener};
use crate::storage::{ConfiguredStorage, KeyValueStorage, StorageResult};
use crate::store::{LoadSource, PanelKey, PersistenceStore};

#[derive(Debug)]
pub struct Workspace<S> {
    engine: DockingEngine,
    store: PersistenceStore<S>,
    popouts: PopoutCoordinator,
    model: LayoutModel,
    loaded_from: LoadSource,
    auto_fit_breakpoint: u32,
}

impl Workspace<ConfiguredStorage> {
    /// Open a workspace on the storage backend named by `config`.
    pub fn from_config(config: &DockyardConfig) -> Result<Self, ConfigError> {
        Self::open(config.storage()?, config)
    }
}

impl<S: KeyValueStorage> Workspace<S> {
    /// Open a workspace over `storage`, restoring the saved layout or
    /// falling back to the default one. Configs failing
    /// [`DockyardConfig::validate`] are refused.
    pub fn open(storage: S, config: &DockyardConfig) -> Result<Self, ConfigError> {
        config.ensure_valid()?;
        let popouts = PopoutCoordinator::new(&config.popout_origin)?;
        let policy = config.size_policy.clone();
        let store = PersistenceStore::new(storage, policy.clone());
        let (model, loaded_from) = store.load_with_source();
        tracing::info!(
            target: "dockyard.workspace",
            source = ?loaded_from,
            nodes = model.len(),
            state_hash = model.state_hash(),
            "workspace opened"
        );
        Ok(Self {
            engine: DockingEngine::new(policy),
            store,
            popouts,
            model,
            loaded_from,
            auto_fit_breakpoint: config.auto_fit_breakpoint,
        })
    }

    #[must_use]
    pub fn model(&self) -> &LayoutModel {
        &self.model
    }

    #[must_use]
    pub fn policy(&self) -> &SizePolicy {
        self.engine.policy()
    }

    /// How the layout was obtained when the workspace opened.
    #[must_use]
    pub fn loaded_from(&self) -> LoadSource {
        self.loaded_from
    }

    pub fn store(&self) -> &PersistenceStore<S> {
        &self.store
    }

    pub fn into_store(self) -> PersistenceStore<S> {
        self.store
    }

    /// Apply one action and persist the layout if it changed.
    pub fn dispatch(&mut self, action: Action) -> ActionOutcome {
        let span = tracing::info_span!(
            target: "dockyard.workspace",
            "workspace.dispatch",
            action = action.name(),
            before_hash = self.model.state_hash(),
            after_hash = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        let _guard = span.enter();

        let (next, outcome) = self.engine.apply_with_outcome(&self.model, action);
        span.record("after_hash", next.state_hash());
        span.record(
            "outcome",
            match outcome {
                ActionOutcome::Applied => "applied",
                ActionOutcome::Ignored(reason) => reason.as_str(),
            },
        );

        if outcome.is_applied() {
            self.model = next;
            self.persist();
        }
        outcome
    }

    /// Dispatch actions in order, returning how many were applied.
    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = Action>) -> usize {
        actions
            .into_iter()
            .map(|action| self.dispatch(action))
            .filter(|outcome| outcome.is_applied())
            .count()
    }

    /// User toggle of a tabset's size. `None` when there is nothing to do.
    pub fn toggle_size(&mut self, tabset_id: &NodeId, mode: ToggleMode) -> Option<ActionOutcome> {
        let action =
            self.engine
                .policy()
                .toggle_action(&self.model, tabset_id, mode, ResizeTrigger::User)?;
        Some(self.dispatch(action))
    }

    /// User splitter drag of a tabset to `size`.
    pub fn resize(&mut self, tabset_id: &NodeId, size: u32) -> Option<ActionOutcome> {
        let action = self
            .engine
            .policy()
            .resize_action(&self.model, tabset_id, size)?;
        Some(self.dispatch(action))
    }

    /// Hide or show key panels for a viewport `width` pixels wide, leaving
    /// user-sized panels alone. Returns how many tabsets changed.
    pub fn fit_viewport(&mut self, width: u32) -> usize {
        let actions = self
            .engine
            .policy()
            .auto_fit(&self.model, width, self.auto_fit_breakpoint);
        self.dispatch_all(actions)
    }

    /// Replace the layout with the default one and persist it.
    pub fn reset(&mut self) {
        self.model = default_layout(self.engine.policy());
        if let Err(err) = self.store.reset() {
            tracing::warn!(target: "dockyard.store", error = %err, "layout reset failed");
        }
        self.persist();
        tracing::info!(
            target: "dockyard.workspace",
            state_hash = self.model.state_hash(),
            "workspace reset to default layout"
        );
    }

    /// Pop the active tab of `tabset_id` out into a new window.
    ///
    /// A chart period saved in the panel's state wins over the one the tab was
    /// created with.
    pub fn popout<O>(&self, tabset_id: &NodeId, opener: &mut O) -> Result<WindowHandle, PopoutError>
    where
        O: WindowOpener + ?Sized,
    {
        let state = self
            .model
            .active_tab(tabset_id)
            .and_then(|(tab_id, tab)| self.load_panel_state(&PanelKey::for_tab(tab_id, tab)));
        self.popouts.popout_with_state(&self.model, tabset_id, state.as_ref(), opener)
    }

    /// Persistence key of a tab currently in the layout.
    #[must_use]
    pub fn panel_key(&self, tab_id: &NodeId) -> Option<PanelKey> {
        self.model
            .tab(tab_id)
            .map(|tab| PanelKey::for_tab(tab_id, tab))
    }

    pub fn save_panel_state(&mut self, key: &PanelKey, value: &Value) -> StorageResult<()> {
        self.store.save_panel_state(key, value)
    }

    #[must_use]
    pub fn load_panel_state(&self, key: &PanelKey) -> Option<Value> {
        self.store.load_panel_state(key)
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.model) {
            tracing::warn!(target: "dockyard.store", error = %err, "layout save failed");
        }
    }
}
