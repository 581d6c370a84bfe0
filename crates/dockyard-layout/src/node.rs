//! Layout node schema.
//!
//! Every element of a workspace layout is a [`NodeRecord`] carrying a stable
//! [`NodeId`], an optional parent reference and a [`NodeKind`] payload. The
//! payload is a closed tagged union so every consumer matches exhaustively on
//! node and panel kinds instead of comparing component strings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::size::SizeDecisionReason;

/// Default flex weight assigned to freshly created rows and tabsets.
pub const DEFAULT_WEIGHT: u32 = 50;

/// Stable identifier for layout nodes.
///
/// Identifiers double as persistence keys and size-policy lookup keys, so
/// they are never renumbered by the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node ID, rejecting empty strings.
    pub fn new(raw: impl Into<String>) -> Result<Self, NodeIdError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(NodeIdError::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build an id from a literal known to be non-empty.
    pub(crate) fn from_static(raw: &'static str) -> Self {
        Self(raw.to_string())
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Errors while parsing node and tab identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeIdError {
    Empty,
    MalformedChartId { raw: String },
    UnknownPanelKind { raw: String },
}

impl fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "node id must not be empty"),
            Self::MalformedChartId { raw } => {
                write!(f, "chart tab id {raw:?} is not of the form {{pair}}_{{sequence}}")
            }
            Self::UnknownPanelKind { raw } => write!(f, "unknown panel kind {raw:?}"),
        }
    }
}

impl std::error::Error for NodeIdError {}

/// Closed set of panel kinds a tab can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Chart,
    Positions,
    Account,
    Markets,
    Form,
    Trades,
    Transactions,
    Chat,
    Portfolio,
}

impl PanelKind {
    /// Every panel kind in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Chart,
        Self::Positions,
        Self::Account,
        Self::Markets,
        Self::Form,
        Self::Trades,
        Self::Transactions,
        Self::Chat,
        Self::Portfolio,
    ];

    /// Wire name of the kind, also the tab id of single-instance panels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Positions => "positions",
            Self::Account => "account",
            Self::Markets => "markets",
            Self::Form => "form",
            Self::Trades => "trades",
            Self::Transactions => "transactions",
            Self::Chat => "chat",
            Self::Portfolio => "portfolio",
        }
    }

    /// Default tab caption.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Chart => "Chart",
            Self::Positions => "Positions",
            Self::Account => "Account",
            Self::Markets => "Markets",
            Self::Form => "Order Form",
            Self::Trades => "Trades",
            Self::Transactions => "Transactions",
            Self::Chat => "Chat",
            Self::Portfolio => "Portfolio",
        }
    }

    /// Key panels get their default/min width enforced on every dock operation.
    #[must_use]
    pub const fn is_key_panel(self) -> bool {
        matches!(self, Self::Markets | Self::Form | Self::Account)
    }

    /// Whether several tabs of this kind may coexist in one layout.
    #[must_use]
    pub const fn allows_multiple(self) -> bool {
        matches!(self, Self::Chart)
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelKind {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| NodeIdError::UnknownPanelKind { raw: s.to_string() })
    }
}

/// Parsed chart tab identity: `{pair}_{sequence}`.
///
/// The pair itself may contain underscores (`ETH_USD`); the sequence is the
/// suffix after the last one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChartTabId {
    pub pair: String,
    pub sequence: u32,
}

impl ChartTabId {
    #[must_use]
    pub fn new(pair: impl Into<String>, sequence: u32) -> Self {
        Self {
            pair: pair.into(),
            sequence,
        }
    }

    /// Parse a chart tab id.
    pub fn parse(raw: &str) -> Result<Self, NodeIdError> {
        let malformed = || NodeIdError::MalformedChartId {
            raw: raw.to_string(),
        };
        let (pair, sequence) = raw.rsplit_once('_').ok_or_else(malformed)?;
        if pair.is_empty() {
            return Err(malformed());
        }
        let sequence = sequence.parse::<u32>().map_err(|_| malformed())?;
        Ok(Self::new(pair, sequence))
    }

    /// Format as a node id.
    #[must_use]
    pub fn to_node_id(&self) -> NodeId {
        NodeId(format!("{}_{}", self.pair, self.sequence))
    }
}

/// Orientation a container lays its children out along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Orientation of a container at `depth` (root is depth 0, horizontal).
    #[must_use]
    pub const fn for_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            Self::Horizontal
        } else {
            Self::Vertical
        }
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Where an added or moved node lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockLocation {
    Center,
    Left,
    Right,
    Top,
    Bottom,
}

impl DockLocation {
    /// Split axis for edge locations; `None` for `Center`.
    #[must_use]
    pub const fn axis(self) -> Option<Axis> {
        match self {
            Self::Center => None,
            Self::Left | Self::Right => Some(Axis::Horizontal),
            Self::Top | Self::Bottom => Some(Axis::Vertical),
        }
    }

    /// Whether the incoming node is placed before the target.
    #[must_use]
    pub const fn is_leading(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }
}

/// The four fixed docking regions around the main tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderLocation {
    Left,
    Right,
    Top,
    Bottom,
}

impl BorderLocation {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Top, Self::Bottom];

    /// Node id of the border region.
    #[must_use]
    pub fn node_id(self) -> NodeId {
        NodeId(format!("border_{}", self.as_str()))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    /// Left/right strips are sized by width, top/bottom by height.
    #[must_use]
    pub const fn size_axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Horizontal,
            Self::Top | Self::Bottom => Axis::Vertical,
        }
    }
}

/// Top-level container payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootNode {
    /// Main-tree children, laid out horizontally.
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Border regions, one per edge.
    #[serde(default)]
    pub borders: Vec<NodeId>,
}

/// Axis container payload. Orientation follows depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowNode {
    pub children: Vec<NodeId>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

/// Group of tabs sharing one visible region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSetNode {
    pub children: Vec<NodeId>,
    /// Index of the active tab.
    #[serde(default)]
    pub selected: usize,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub min_width: Option<u32>,
    #[serde(default)]
    pub min_height: Option<u32>,
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Why the current size is what it is; gates automatic resizing.
    #[serde(default)]
    pub size_reason: SizeDecisionReason,
}

impl TabSetNode {
    /// Empty tabset with default weight and unconstrained size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            selected: 0,
            width: None,
            height: None,
            min_width: None,
            min_height: None,
            weight: DEFAULT_WEIGHT,
            size_reason: SizeDecisionReason::Default,
        }
    }

    /// Currently active tab id, if any.
    #[must_use]
    pub fn active(&self) -> Option<&NodeId> {
        self.children.get(self.selected)
    }
}

impl Default for TabSetNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Leaf panel reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabNode {
    /// Caption shown on the tab.
    pub name: String,
    pub kind: PanelKind,
    /// Transient panel data (chart pair, period, ...). Opaque to the engine.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl TabNode {
    /// Tab with the kind's default caption and no extra data.
    #[must_use]
    pub fn new(kind: PanelKind) -> Self {
        Self {
            name: kind.title().to_string(),
            kind,
            extra: BTreeMap::new(),
        }
    }

    /// Chart tab for `pair` at `period`.
    #[must_use]
    pub fn chart(pair: impl Into<String>, period: impl Into<String>) -> Self {
        let pair = pair.into();
        Self::new(PanelKind::Chart)
            .with_name(pair.replace('_', "/"))
            .with_extra(EXTRA_PAIR, pair)
            .with_extra(EXTRA_PERIOD, period)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.extra.insert(key.into(), value.into());
        self
    }

    /// Convenience accessor for one extra-data entry.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// Extra-data key holding a chart's pair id.
pub const EXTRA_PAIR: &str = "pair";
/// Extra-data key holding a chart's period.
pub const EXTRA_PERIOD: &str = "period";

/// Fixed-edge docking region for ejected tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderNode {
    pub location: BorderLocation,
    #[serde(default)]
    pub children: Vec<NodeId>,
    /// Expanded tab, `None` when the strip is collapsed.
    #[serde(default)]
    pub selected: Option<usize>,
    #[serde(default = "default_border_size")]
    pub size: u32,
}

impl BorderNode {
    #[must_use]
    pub fn new(location: BorderLocation) -> Self {
        Self {
            location,
            children: Vec::new(),
            selected: None,
            size: DEFAULT_BORDER_SIZE,
        }
    }
}

/// Default expanded size of a border strip.
pub const DEFAULT_BORDER_SIZE: u32 = 300;

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

fn default_border_size() -> u32 {
    DEFAULT_BORDER_SIZE
}

/// Node payload variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Root(RootNode),
    Row(RowNode),
    #[serde(rename = "tabset")]
    TabSet(TabSetNode),
    Tab(TabNode),
    Border(BorderNode),
}

/// Payload-free node discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeShape {
    Root,
    Row,
    TabSet,
    Tab,
    Border,
}

impl NodeKind {
    #[must_use]
    pub const fn shape(&self) -> NodeShape {
        match self {
            Self::Root(_) => NodeShape::Root,
            Self::Row(_) => NodeShape::Row,
            Self::TabSet(_) => NodeShape::TabSet,
            Self::Tab(_) => NodeShape::Tab,
            Self::Border(_) => NodeShape::Border,
        }
    }

    /// Short kind label for diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Root(_) => "root",
            Self::Row(_) => "row",
            Self::TabSet(_) => "tabset",
            Self::Tab(_) => "tab",
            Self::Border(_) => "border",
        }
    }
}

/// Serializable node record in the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl NodeRecord {
    #[must_use]
    pub fn new(id: NodeId, parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self { id, parent, kind }
    }

    /// Ordered child ids for container kinds; empty for tabs.
    ///
    /// Root borders are not included.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Root(root) => &root.children,
            NodeKind::Row(row) => &row.children,
            NodeKind::TabSet(tabset) => &tabset.children,
            NodeKind::Border(border) => &border.children,
            NodeKind::Tab(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.kind {
            NodeKind::Root(root) => Some(&mut root.children),
            NodeKind::Row(row) => Some(&mut row.children),
            NodeKind::TabSet(tabset) => Some(&mut tabset.children),
            NodeKind::Border(border) => Some(&mut border.children),
            NodeKind::Tab(_) => None,
        }
    }

    /// Flex weight of rows and tabsets.
    #[must_use]
    pub fn weight(&self) -> Option<u32> {
        match &self.kind {
            NodeKind::Row(row) => Some(row.weight),
            NodeKind::TabSet(tabset) => Some(tabset.weight),
            _ => None,
        }
    }

    pub(crate) fn set_weight(&mut self, weight: u32) {
        match &mut self.kind {
            NodeKind::Row(row) => row.weight = weight.max(1),
            NodeKind::TabSet(tabset) => tabset.weight = weight.max(1),
            _ => {}
        }
    }

    #[must_use]
    pub fn as_tab(&self) -> Option<&TabNode> {
        match &self.kind {
            NodeKind::Tab(tab) => Some(tab),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tabset(&self) -> Option<&TabSetNode> {
        match &self.kind {
            NodeKind::TabSet(tabset) => Some(tabset),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_border(&self) -> Option<&BorderNode> {
        match &self.kind {
            NodeKind::Border(border) => Some(border),
            _ => None,
        }
    }
}

/// Externally supplied renderer for panel contents.
///
/// The engine only carries the panel kind and its opaque extra data; turning
/// those into something drawable is the host's business.
pub trait PanelResolver {
    type Output;

    fn resolve(&self, kind: PanelKind, extra: &BTreeMap<String, String>) -> Self::Output;
}
