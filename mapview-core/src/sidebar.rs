//! Navigation tree shown in the sidebar.

use crate::model::{MapDescriptor, MapKind};

const UNNAMED_FOLDER: &str = "Unnamed Folder!";
const UNNAMED_MAP: &str = "Unnamed Map!";
pub const EMPTY_CATALOG: &str = "No maps available.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryAction {
    /// Load the map with this entry's id.
    Load,
    /// Tell the user the map is not ready yet.
    ComingSoon,
    /// Folder without a map of its own.
    None,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavEntry {
    pub id: String,
    pub label: String,
    pub title: String,
    pub kind: MapKind,
    /// Click on a map item, double-click on a folder header.
    pub action: EntryAction,
    pub children: Vec<NavEntry>,
}

impl NavEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == MapKind::Folder
    }

    fn from_descriptor(d: &MapDescriptor) -> Self {
        let folder = d.kind == MapKind::Folder;
        let fallback = if folder { UNNAMED_FOLDER } else { UNNAMED_MAP };
        let name = if d.name.is_empty() { fallback } else { d.name.as_str() };
        let (label, title, action) = if d.is_coming_soon() {
            (
                format!("{name} (Soon)"),
                format!("{name} - Coming Soon!"),
                EntryAction::ComingSoon,
            )
        } else if d.id.is_empty() {
            (name.to_string(), format!("Click to toggle '{name}'."), EntryAction::None)
        } else if folder {
            (
                name.to_string(),
                format!("Click to toggle '{name}', double-click to load map."),
                EntryAction::Load,
            )
        } else {
            (name.to_string(), format!("Load map: {name}"), EntryAction::Load)
        };
        NavEntry {
            id: d.id.clone(),
            label,
            title,
            kind: d.kind,
            action,
            children: if folder {
                d.child_maps().map(NavEntry::from_descriptor).collect()
            } else {
                Vec::new()
            },
        }
    }
}

pub fn build(roots: &[MapDescriptor]) -> Vec<NavEntry> {
    roots.iter().map(NavEntry::from_descriptor).collect()
}

/// Ids of the folders enclosing `id`, outermost first.
pub fn ancestors(entries: &[NavEntry], id: &str) -> Option<Vec<String>> {
    for e in entries {
        if e.id == id {
            return Some(Vec::new());
        }
        if let Some(mut path) = ancestors(&e.children, id) {
            path.insert(0, e.id.clone());
            return Some(path);
        }
    }
    None
}
