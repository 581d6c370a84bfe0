//! Popping a tabset's active panel out into its own window.
//!
//! A popout is a read-only projection: the coordinator borrows the layout,
//! encodes the active tab's identity into a URL and hands it to a host
//! supplied [`WindowOpener`]. The popped window rebuilds a single-panel
//! layout from that URL with [`PopoutParams::parse`] and
//! [`PopoutParams::to_layout`].
//!
//! URL shape: `{origin}/popout/{group}?id={id}&period={period}&tabSet={tabset}`
//! where `group` is the panel kind, `id` the chart pair (or the tab id for
//! non-chart panels) and `period` is empty for panels without one.

use dockyard_layout::{
    ChartTabId, DEFAULT_CHART_PERIOD, EXTRA_PAIR, EXTRA_PERIOD, LayoutModel, LayoutModelError,
    NodeId, NodeIdError, PanelKind, SizePolicy, TabNode, single_panel_layout,
};
use serde_json::Value;
use thiserror::Error;
use url::Url;

const POPOUT_SEGMENT: &str = "popout";

#[derive(Debug, Error)]
pub enum PopoutError {
    #[error("invalid popout URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("popout origin {origin:?} cannot carry a path")]
    OriginNotBase { origin: String },

    #[error("no tabset {tabset_id}")]
    MissingTabSet { tabset_id: NodeId },

    #[error("tabset {tabset_id} has no active tab")]
    EmptyTabSet { tabset_id: NodeId },

    #[error("{url} is not a popout URL")]
    NotPopoutUrl { url: String },

    #[error("popout URL is missing {name:?}")]
    MissingParameter { name: &'static str },

    #[error(transparent)]
    Identifier(#[from] NodeIdError),

    #[error("popout layout is invalid: {0}")]
    Layout(#[from] LayoutModelError),

    #[error("window opener refused {url}")]
    Blocked { url: String },
}

/// Fixed window size `(width, height)` for a popped-out panel kind.
#[must_use]
pub const fn window_size(kind: PanelKind) -> (u32, u32) {
    match kind {
        PanelKind::Chart => (900, 600),
        PanelKind::Markets => (360, 720),
        PanelKind::Form => (380, 720),
        PanelKind::Account => (360, 600),
        PanelKind::Positions | PanelKind::Trades | PanelKind::Transactions => (900, 360),
        PanelKind::Chat => (380, 600),
        PanelKind::Portfolio => (900, 420),
    }
}

/// State carried from the main window into a popout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopoutParams {
    pub kind: PanelKind,
    /// Chart pair for charts, tab id otherwise.
    pub id: String,
    pub period: Option<String>,
    /// Tabset the panel was popped from.
    pub tab_set: NodeId,
}

impl PopoutParams {
    /// Capture the identity of `tab` living in `tabset_id`.
    #[must_use]
    pub fn from_tab(tabset_id: &NodeId, tab_id: &NodeId, tab: &TabNode) -> Self {
        let id = match tab.kind {
            PanelKind::Chart => tab
                .extra(EXTRA_PAIR)
                .map(str::to_string)
                .or_else(|| ChartTabId::parse(tab_id.as_str()).ok().map(|chart| chart.pair))
                .unwrap_or_else(|| tab_id.to_string()),
            _ => tab_id.to_string(),
        };
        Self {
            kind: tab.kind,
            id,
            period: tab.extra(EXTRA_PERIOD).map(str::to_string),
            tab_set: tabset_id.clone(),
        }
    }

    /// Overlay a chart period saved as panel state (`{"period": "4h", ...}`)
    /// on the one captured from the layout.
    #[must_use]
    pub fn with_panel_state(mut self, state: &Value) -> Self {
        if self.kind != PanelKind::Chart {
            return self;
        }
        if let Some(period) = state
            .get(EXTRA_PERIOD)
            .and_then(Value::as_str)
            .filter(|period| !period.is_empty())
        {
            self.period = Some(period.to_string());
        }
        self
    }

    /// Encode as a popout URL below `origin`.
    pub fn to_url(&self, origin: &Url) -> Result<Url, PopoutError> {
        let mut url = origin.clone();
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| PopoutError::OriginNotBase {
                origin: origin.to_string(),
            })?
            .pop_if_empty()
            .push(POPOUT_SEGMENT)
            .push(self.kind.as_str());
        url.query_pairs_mut()
            .clear()
            .append_pair("id", &self.id)
            .append_pair("period", self.period.as_deref().unwrap_or_default())
            .append_pair("tabSet", self.tab_set.as_str());
        Ok(url)
    }

    /// Decode a popout URL. Unknown query parameters are ignored.
    pub fn parse(raw: &str) -> Result<Self, PopoutError> {
        let url = Url::parse(raw)?;
        let not_popout = || PopoutError::NotPopoutUrl {
            url: raw.to_string(),
        };
        let segments: Vec<&str> = url.path_segments().ok_or_else(not_popout)?.collect();
        let kind = match segments.as_slice() {
            [.., POPOUT_SEGMENT, group] => group.parse::<PanelKind>()?,
            _ => return Err(not_popout()),
        };

        let mut id = None;
        let mut period = None;
        let mut tab_set = None;
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "id" => id = Some(value.into_owned()),
                "period" => period = Some(value.into_owned()),
                "tabSet" => tab_set = Some(value.into_owned()),
                _ => {}
            }
        }

        let id = id
            .filter(|id| !id.is_empty())
            .ok_or(PopoutError::MissingParameter { name: "id" })?;
        let tab_set = tab_set
            .filter(|tab_set| !tab_set.is_empty())
            .ok_or(PopoutError::MissingParameter { name: "tabSet" })?;
        Ok(Self {
            kind,
            id,
            period: period.filter(|period| !period.is_empty()),
            tab_set: NodeId::new(tab_set)?,
        })
    }

    /// Single-panel layout rendered by the popped window.
    pub fn to_layout(&self, policy: &SizePolicy) -> Result<LayoutModel, PopoutError> {
        let (tab_id, tab) = match self.kind {
            PanelKind::Chart => {
                let period = self.period.as_deref().unwrap_or(DEFAULT_CHART_PERIOD);
                (
                    ChartTabId::new(self.id.as_str(), 1).to_node_id(),
                    TabNode::chart(self.id.as_str(), period),
                )
            }
            kind => (NodeId::new(kind.as_str())?, TabNode::new(kind)),
        };
        Ok(single_panel_layout(tab_id, tab, policy)?)
    }
}

/// Opaque handle to a window created by a [`WindowOpener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

/// Everything a host needs to open a popout window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopoutRequest {
    pub url: Url,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

/// Host window factory.
pub trait WindowOpener {
    /// Open a top-level window; `None` when the host refuses (popup blocked).
    fn open(&mut self, request: &PopoutRequest) -> Option<WindowHandle>;
}

/// Builds popout requests against a fixed origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopoutCoordinator {
    origin: Url,
}

impl PopoutCoordinator {
    pub fn new(origin: &str) -> Result<Self, PopoutError> {
        let origin = Url::parse(origin)?;
        if origin.cannot_be_a_base() {
            return Err(PopoutError::OriginNotBase {
                origin: origin.to_string(),
            });
        }
        Ok(Self { origin })
    }

    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Request for popping out the active tab of `tabset_id`.
    pub fn request(
        &self,
        model: &LayoutModel,
        tabset_id: &NodeId,
    ) -> Result<PopoutRequest, PopoutError> {
        self.request_with_state(model, tabset_id, None)
    }

    /// [`Self::request`] with the active panel's saved state applied.
    pub fn request_with_state(
        &self,
        model: &LayoutModel,
        tabset_id: &NodeId,
        state: Option<&Value>,
    ) -> Result<PopoutRequest, PopoutError> {
        if model.tabset(tabset_id).is_none() {
            return Err(PopoutError::MissingTabSet {
                tabset_id: tabset_id.clone(),
            });
        }
        let (tab_id, tab) = model
            .active_tab(tabset_id)
            .ok_or_else(|| PopoutError::EmptyTabSet {
                tabset_id: tabset_id.clone(),
            })?;
        let mut params = PopoutParams::from_tab(tabset_id, tab_id, tab);
        if let Some(state) = state {
            params = params.with_panel_state(state);
        }
        let (width, height) = window_size(tab.kind);
        Ok(PopoutRequest {
            url: params.to_url(&self.origin)?,
            title: tab.name.clone(),
            width,
            height,
        })
    }

    /// Open the active tab of `tabset_id` in a new window.
    pub fn popout<O>(
        &self,
        model: &LayoutModel,
        tabset_id: &NodeId,
        opener: &mut O,
    ) -> Result<WindowHandle, PopoutError>
    where
        O: WindowOpener + ?Sized,
    {
        self.popout_with_state(model, tabset_id, None, opener)
    }

    /// [`Self::popout`] with the active panel's saved state applied.
    pub fn popout_with_state<O>(
        &self,
        model: &LayoutModel,
        tabset_id: &NodeId,
        state: Option<&Value>,
        opener: &mut O,
    ) -> Result<WindowHandle, PopoutError>
    where
        O: WindowOpener + ?Sized,
    {
        let request = self.request_with_state(model, tabset_id, state)?;
        match opener.open(&request) {
            Some(handle) => {
                tracing::info!(
                    target: "dockyard.popout",
                    tabset = %tabset_id,
                    url = %request.url,
                    width = request.width,
                    height = request.height,
                    "panel popped out"
                );
                Ok(handle)
            }
            None => {
                tracing::warn!(target: "dockyard.popout", url = %request.url, "window opener refused popout");
                Err(PopoutError::Blocked {
                    url: request.url.to_string(),
                })
            }
        }
    }
}
