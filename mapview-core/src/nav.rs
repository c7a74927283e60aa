//! URL fragment and browser history bookkeeping.
//!
//! The fragment has the fixed shape `#<mapId>-s=<o|c>`.

use serde::{Deserialize, Serialize};

const STATE_DELIMITER: &str = "-s=";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SidebarState {
    #[default]
    #[serde(rename = "o")]
    Open,
    #[serde(rename = "c")]
    Closed,
}

impl SidebarState {
    pub fn code(self) -> &'static str {
        match self {
            SidebarState::Open => "o",
            SidebarState::Closed => "c",
        }
    }

    /// `None` for anything other than `o` or `c`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "o" => Some(SidebarState::Open),
            "c" => Some(SidebarState::Closed),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SidebarState::Open => SidebarState::Closed,
            SidebarState::Closed => SidebarState::Open,
        }
    }

    pub fn is_open(self) -> bool {
        self == SidebarState::Open
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Empty when no map is active.
    pub map_id: String,
    pub sidebar: SidebarState,
    /// Whether the sidebar token was one of the recognised codes.
    pub sidebar_explicit: bool,
}

impl Fragment {
    pub fn new(map_id: &str, sidebar: SidebarState) -> Self {
        Fragment {
            map_id: map_id.to_string(),
            sidebar,
            sidebar_explicit: true,
        }
    }

    pub fn encode(&self) -> String {
        format!("#{}{STATE_DELIMITER}{}", self.map_id, self.sidebar.code())
    }

    /// Parse `location.hash`, with or without the leading `#`. The sidebar
    /// token is the text between the first and second delimiter; an
    /// unrecognised token reads as open.
    pub fn decode(hash: &str) -> Self {
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        let mut parts = hash.split(STATE_DELIMITER);
        let map_id = parts.next().unwrap_or_default();
        let parsed = parts.next().and_then(SidebarState::from_code);
        Fragment {
            map_id: map_id.to_string(),
            sidebar: parsed.unwrap_or_default(),
            sidebar_explicit: parsed.is_some(),
        }
    }

    pub fn map_id(&self) -> Option<&str> {
        Some(self.map_id.as_str()).filter(|id| !id.is_empty())
    }
}

/// State object stored with pushed history entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub map_id: String,
    pub sidebar_state: SidebarState,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HistoryOp {
    Replace(String),
    Push {
        url: String,
        state: Option<HistoryEntry>,
    },
}

/// What a back/forward navigation asks the viewer to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PopAction {
    pub load: Option<String>,
    pub sidebar: Option<SidebarState>,
}

/// Turns viewer changes into history operations. While a back/forward
/// navigation is being replayed, nothing is recorded.
#[derive(Clone, Debug, Default)]
pub struct NavSync {
    query: String,
    replaying: bool,
}

impl NavSync {
    /// `query` is `location.search`, kept on every URL written.
    pub fn new(query: &str) -> Self {
        NavSync {
            query: query.to_string(),
            replaying: false,
        }
    }

    pub fn url(&self, fragment: &Fragment) -> String {
        format!("{}{}", self.query, fragment.encode())
    }

    /// Start-up entry; never grows the back stack.
    pub fn initial(&self, map_id: &str, sidebar: SidebarState) -> HistoryOp {
        HistoryOp::Replace(self.url(&Fragment::new(map_id, sidebar)))
    }

    pub fn sidebar_changed(&self, map_id: &str, sidebar: SidebarState) -> Option<HistoryOp> {
        (!self.replaying).then(|| HistoryOp::Replace(self.url(&Fragment::new(map_id, sidebar))))
    }

    pub fn map_loaded(&self, map_id: &str, sidebar: SidebarState) -> Option<HistoryOp> {
        (!self.replaying).then(|| HistoryOp::Push {
            url: self.url(&Fragment::new(map_id, sidebar)),
            state: Some(HistoryEntry {
                map_id: map_id.to_string(),
                sidebar_state: sidebar,
            }),
        })
    }

    /// A load that left no map active.
    pub fn map_cleared(&self, sidebar: SidebarState) -> Option<HistoryOp> {
        (!self.replaying).then(|| HistoryOp::Push {
            url: self.url(&Fragment::new("", sidebar)),
            state: None,
        })
    }

    /// Resolve a `popstate`. The entry's state object wins over the fragment.
    pub fn on_pop(
        &self,
        state: Option<&HistoryEntry>,
        hash: &str,
        current_map: Option<&str>,
        current_sidebar: SidebarState,
    ) -> PopAction {
        let frag = Fragment::decode(hash);
        let target = state
            .map(|s| s.map_id.as_str())
            .filter(|id| !id.is_empty())
            .or(frag.map_id());
        let sidebar = state
            .map(|s| s.sidebar_state)
            .or(frag.sidebar_explicit.then_some(frag.sidebar));
        PopAction {
            load: target
                .filter(|id| Some(*id) != current_map)
                .map(str::to_string),
            sidebar: sidebar.filter(|s| *s != current_sidebar),
        }
    }

    pub fn begin_replay(&mut self) {
        self.replaying = true;
    }

    pub fn end_replay(&mut self) {
        self.replaying = false;
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }
}
