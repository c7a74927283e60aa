//! Filter checkboxes and the visibility rules derived from them.
//!
//! The tree is rebuilt from the active map on every switch. Group and master
//! states are never stored; they are recomputed from the leaves.

use std::collections::BTreeSet;

use crate::constants::UNNAMED_ROAD_TYPE;
use crate::model::{MapDescriptor, PointOfInterest, Region, Road};
use crate::popup::capitalize;

/// Fixed POI type → group classification.
const POI_TYPE_GROUPS: &[(&str, &[&str])] = &[
    (
        "Settlements",
        &["City", "Town", "Village", "Hamlet", "Settlement", "Capital"],
    ),
    (
        "Structures",
        &[
            "Castle", "Fortress", "Fort", "Tower", "Ruin", "Temple", "Shrine", "Mine",
            "Lighthouse", "Bridge", "Dungeon", "Lair", "Camp", "Asylum", "Landmark",
        ],
    ),
    (
        "Natural Features",
        &[
            "Mountain", "Peak", "Forest", "Wood", "River", "Lake", "Cave", "Cavern", "Coast",
            "Bay", "Cove", "Swamp", "Marsh", "Desert", "Natural Landmark",
        ],
    ),
    ("Other", &["Point of Interest", "Region", "Portal"]),
    ("Unknown", &["Unknown"]),
];

/// Group a raw POI type belongs to.
pub fn poi_group(type_: Option<&str>) -> &'static str {
    let t = type_.filter(|t| !t.is_empty()).unwrap_or("Unknown");
    POI_TYPE_GROUPS
        .iter()
        .find(|(_, types)| types.contains(&t))
        .map(|(group, _)| *group)
        .unwrap_or("Other")
}

/// Filter key of a road.
pub fn road_type(road: &Road) -> &str {
    road.type_
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(UNNAMED_ROAD_TYPE)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriState {
    Unchecked,
    Checked,
    Indeterminate,
}

impl TriState {
    pub fn checked(self) -> bool {
        self == TriState::Checked
    }

    pub fn indeterminate(self) -> bool {
        self == TriState::Indeterminate
    }

    /// Aggregate leaf flags: all ⇒ checked, none ⇒ unchecked, otherwise
    /// indeterminate. An empty set counts as checked.
    pub fn from_counts(checked: usize, total: usize) -> Self {
        if checked == total {
            TriState::Checked
        } else if checked == 0 {
            TriState::Unchecked
        } else {
            TriState::Indeterminate
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toggle {
    pub name: String,
    pub checked: bool,
}

impl Toggle {
    fn on(name: &str) -> Self {
        Toggle {
            name: name.to_string(),
            checked: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegionGroup {
    pub name: String,
    pub values: Vec<Toggle>,
}

impl RegionGroup {
    pub fn state(&self) -> TriState {
        let on = self.values.iter().filter(|v| v.checked).count();
        TriState::from_counts(on, self.values.len())
    }
}

/// A single checkbox interaction.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterChange {
    All(bool),
    PoiGroup { name: String, checked: bool },
    RegionGroup { name: String, checked: bool },
    RegionValue { group: String, value: String, checked: bool },
    RoadType { name: String, checked: bool },
}

/// Which overlay views a change invalidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Recompute {
    pub pois: bool,
    pub regions: bool,
    pub roads: bool,
}

impl Recompute {
    pub const ALL: Recompute = Recompute {
        pois: true,
        regions: true,
        roads: true,
    };
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterTree {
    pub poi_groups: Vec<Toggle>,
    pub region_groups: Vec<RegionGroup>,
    pub road_types: Vec<Toggle>,
}

impl FilterTree {
    /// Build the checkboxes for exactly what `map` contains, all checked.
    pub fn from_map(map: &MapDescriptor) -> Self {
        let poi_groups = if map.points_of_interest.is_empty() {
            Vec::new()
        } else {
            let groups: BTreeSet<&str> = map
                .points_of_interest
                .iter()
                .map(|p| poi_group(p.type_.as_deref()))
                .collect();
            groups.into_iter().map(Toggle::on).collect()
        };

        let region_groups = match map.region_filter_groups() {
            Some(groups) if !map.regions.is_empty() => groups
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(name, values)| RegionGroup {
                    name: name.clone(),
                    values: values.iter().map(|v| Toggle::on(v)).collect(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let types: BTreeSet<&str> = map.roads.iter().map(road_type).collect();
        let road_types = types.into_iter().map(Toggle::on).collect();

        FilterTree {
            poi_groups,
            region_groups,
            road_types,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.poi_groups.is_empty() && self.region_groups.is_empty() && self.road_types.is_empty()
    }

    /// Master toggle state over POI groups, region groups and road types.
    pub fn master(&self) -> TriState {
        let mut total = 0;
        let mut on = 0;
        let mut partial = false;
        for t in self.poi_groups.iter().chain(self.road_types.iter()) {
            total += 1;
            on += usize::from(t.checked);
        }
        for g in &self.region_groups {
            total += 1;
            match g.state() {
                TriState::Checked => on += 1,
                TriState::Indeterminate => partial = true,
                TriState::Unchecked => {}
            }
        }
        if partial {
            TriState::Indeterminate
        } else {
            TriState::from_counts(on, total)
        }
    }

    pub fn all_checked(&self) -> bool {
        self.master().checked()
    }

    pub fn poi_group_checked(&self, group: &str) -> bool {
        self.poi_groups.iter().any(|t| t.checked && t.name == group)
    }

    /// Whether `value` is ticked in any group. A region is drawn when its
    /// value is ticked somewhere.
    pub fn region_value_checked(&self, value: &str) -> bool {
        self.region_groups
            .iter()
            .flat_map(|g| g.values.iter())
            .any(|t| t.checked && t.name == value)
    }

    /// State of the `value` checkbox inside `group`.
    pub fn region_value_checked_in(&self, group: &str, value: &str) -> bool {
        self.region_groups
            .iter()
            .filter(|g| g.name == group)
            .flat_map(|g| g.values.iter())
            .any(|t| t.checked && t.name == value)
    }

    pub fn road_type_checked(&self, type_: &str) -> bool {
        self.road_types.iter().any(|t| t.checked && t.name == type_)
    }

    /// Apply a checkbox change and report which views must be recomputed.
    pub fn apply(&mut self, change: &FilterChange) -> Recompute {
        match change {
            FilterChange::All(checked) => {
                let leaves = self
                    .poi_groups
                    .iter_mut()
                    .chain(self.road_types.iter_mut())
                    .chain(self.region_groups.iter_mut().flat_map(|g| g.values.iter_mut()));
                for t in leaves {
                    t.checked = *checked;
                }
                Recompute::ALL
            }
            FilterChange::PoiGroup { name, checked } => {
                set_named(&mut self.poi_groups, name, *checked);
                Recompute {
                    pois: true,
                    ..Default::default()
                }
            }
            FilterChange::RegionGroup { name, checked } => {
                for g in self.region_groups.iter_mut().filter(|g| &g.name == name) {
                    for v in &mut g.values {
                        v.checked = *checked;
                    }
                }
                Recompute {
                    regions: true,
                    ..Default::default()
                }
            }
            FilterChange::RegionValue {
                group,
                value,
                checked,
            } => {
                for g in self.region_groups.iter_mut().filter(|g| &g.name == group) {
                    set_named(&mut g.values, value, *checked);
                }
                Recompute {
                    regions: true,
                    ..Default::default()
                }
            }
            FilterChange::RoadType { name, checked } => {
                set_named(&mut self.road_types, name, *checked);
                Recompute {
                    roads: true,
                    ..Default::default()
                }
            }
        }
    }
}

fn set_named(toggles: &mut [Toggle], name: &str, checked: bool) {
    for t in toggles.iter_mut().filter(|t| t.name == name) {
        t.checked = checked;
    }
}

/// Display label of a road type checkbox.
pub fn road_type_label(type_: &str) -> String {
    capitalize(type_)
}

/// Lowercased text that remembers where each byte came from, so a match can
/// be located in the original string.
pub(crate) struct Folded {
    pub text: String,
    origin: Vec<usize>,
}

impl Folded {
    pub fn new(s: &str) -> Self {
        let mut text = String::with_capacity(s.len());
        let mut origin = Vec::with_capacity(s.len());
        for (at, c) in s.char_indices() {
            for lower in c.to_lowercase() {
                text.push(lower);
                origin.resize(text.len(), at);
            }
        }
        Folded { text, origin }
    }

    /// Byte range in `source` covering the folded range `r`, widened to whole
    /// source characters.
    pub fn source_range(
        &self,
        source: &str,
        r: std::ops::Range<usize>,
    ) -> Option<std::ops::Range<usize>> {
        if r.is_empty() {
            return None;
        }
        let start = *self.origin.get(r.start)?;
        let last = *self.origin.get(r.end - 1)?;
        let end = last + source[last..].chars().next().map_or(0, char::len_utf8);
        Some(start..end)
    }
}

/// Inputs of the visibility rules.
#[derive(Clone, Copy, Debug)]
pub struct Visibility<'a> {
    pub filters: &'a FilterTree,
    pub markers_visible: bool,
    pub search: &'a str,
}

impl Visibility<'_> {
    pub fn name_matches(&self, name: &str) -> bool {
        name.to_lowercase()
            .contains(&self.search.trim().to_lowercase())
    }

    pub fn poi(&self, poi: &PointOfInterest) -> bool {
        self.markers_visible
            && self.name_matches(&poi.name)
            && (self.filters.all_checked()
                || self.filters.poi_group_checked(poi_group(poi.type_.as_deref())))
    }

    pub fn region(&self, region: &Region) -> bool {
        self.markers_visible
            && (self.filters.all_checked()
                || region
                    .value
                    .as_deref()
                    .is_some_and(|v| self.filters.region_value_checked(v)))
    }

    /// Roads ignore the markers flag.
    pub fn road(&self, road: &Road) -> bool {
        self.filters.all_checked() || self.filters.road_type_checked(road_type(road))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> MapDescriptor {
        serde_json::from_value(json!({
            "id": "m",
            "pointsOfInterest": [
                {"name": "Ashford", "type": "Town", "coords": [1, 1]},
                {"name": "Black Peak", "type": "Peak", "coords": [2, 2]},
                {"name": "Oddity", "type": "Whatever", "coords": [3, 3]},
                {"name": "Nameless", "coords": [4, 4]}
            ],
            "regions": [
                {"name": "North", "type": "Kingdom", "value": "Aster", "coordinates": [[0,0],[0,1],[1,1]]},
                {"name": "South", "type": "Kingdom", "value": "Briar", "coordinates": [[0,0],[0,1],[1,1]]}
            ],
            "roads": [
                {"name": "King's Way", "type": "highway", "coordinates": [[0,0],[1,1]]},
                {"name": "Trail", "coordinates": [[0,0],[1,1]]}
            ],
            "filterGroups": {"Regions": {"Kingdoms": ["Aster", "Briar"], "Empty": []}}
        }))
        .unwrap()
    }

    #[test]
    fn classification_defaults() {
        assert_eq!(poi_group(Some("Town")), "Settlements");
        assert_eq!(poi_group(Some("Natural Landmark")), "Natural Features");
        assert_eq!(poi_group(Some("Spaceport")), "Other");
        assert_eq!(poi_group(None), "Unknown");
    }

    #[test]
    fn tree_reflects_map_contents() {
        let tree = FilterTree::from_map(&sample());
        let names: Vec<_> = tree.poi_groups.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            ["Natural Features", "Other", "Settlements", "Unknown"]
        );
        assert_eq!(tree.region_groups.len(), 1);
        let roads: Vec<_> = tree.road_types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(roads, ["Unnamed Road Type", "highway"]);
        assert_eq!(road_type_label("highway"), "Highway");
        assert_eq!(tree.master(), TriState::Checked);
    }

    #[test]
    fn empty_map_has_no_filters() {
        let tree = FilterTree::from_map(&MapDescriptor::default());
        assert!(tree.is_empty());
        assert_eq!(tree.master(), TriState::Checked);
    }

    #[test]
    fn master_tracks_children() {
        let mut tree = FilterTree::from_map(&sample());
        tree.apply(&FilterChange::RegionValue {
            group: "Kingdoms".into(),
            value: "Briar".into(),
            checked: false,
        });
        assert_eq!(tree.region_groups[0].state(), TriState::Indeterminate);
        assert_eq!(tree.master(), TriState::Indeterminate);

        tree.apply(&FilterChange::All(false));
        assert_eq!(tree.master(), TriState::Unchecked);

        tree.apply(&FilterChange::PoiGroup {
            name: "Other".into(),
            checked: true,
        });
        assert_eq!(tree.master(), TriState::Indeterminate);

        tree.apply(&FilterChange::All(true));
        assert_eq!(tree.master(), TriState::Checked);
        assert!(!tree.master().indeterminate());
    }

    #[test]
    fn shared_region_value_is_tracked_per_group() {
        let map: MapDescriptor = serde_json::from_value(json!({
            "id": "m",
            "regions": [{"name": "R", "value": "Aster", "coordinates": [[0,0],[0,1],[1,1]]}],
            "filterGroups": {"Regions": {"Kingdoms": ["Aster", "Briar"], "Houses": ["Aster"]}}
        }))
        .unwrap();
        let mut tree = FilterTree::from_map(&map);
        tree.apply(&FilterChange::RegionValue {
            group: "Kingdoms".into(),
            value: "Aster".into(),
            checked: false,
        });
        assert!(!tree.region_value_checked_in("Kingdoms", "Aster"));
        assert!(tree.region_value_checked_in("Houses", "Aster"));
        assert!(tree.region_value_checked_in("Kingdoms", "Briar"));
        assert!(!tree.region_value_checked_in("Houses", "Briar"));

        tree.apply(&FilterChange::RegionGroup {
            name: "Houses".into(),
            checked: false,
        });
        assert!(!tree.region_value_checked("Aster"));
        let vis = Visibility {
            filters: &tree,
            markers_visible: true,
            search: "",
        };
        assert!(!vis.region(&map.regions[0]));
    }

    #[test]
    fn changes_report_their_domain() {
        let mut tree = FilterTree::from_map(&sample());
        let r = tree.apply(&FilterChange::RoadType {
            name: "highway".into(),
            checked: false,
        });
        assert_eq!(
            r,
            Recompute {
                roads: true,
                ..Default::default()
            }
        );
        let r = tree.apply(&FilterChange::RegionGroup {
            name: "Kingdoms".into(),
            checked: false,
        });
        assert!(r.regions && !r.pois && !r.roads);
        assert_eq!(tree.region_groups[0].state(), TriState::Unchecked);
        assert_eq!(tree.apply(&FilterChange::All(true)), Recompute::ALL);
    }

    #[test]
    fn visibility_rules() {
        let map = sample();
        let mut tree = FilterTree::from_map(&map);
        let vis = Visibility {
            filters: &tree,
            markers_visible: true,
            search: "",
        };
        assert!(map.points_of_interest.iter().all(|p| vis.poi(p)));

        tree.apply(&FilterChange::PoiGroup {
            name: "Settlements".into(),
            checked: false,
        });
        tree.apply(&FilterChange::RoadType {
            name: "highway".into(),
            checked: false,
        });
        let vis = Visibility {
            filters: &tree,
            markers_visible: true,
            search: "",
        };
        assert!(!vis.poi(&map.points_of_interest[0]));
        assert!(vis.poi(&map.points_of_interest[1]));
        assert!(vis.region(&map.regions[0]));
        assert!(!vis.road(&map.roads[0]));
        assert!(vis.road(&map.roads[1]));

        let hidden = Visibility {
            filters: &tree,
            markers_visible: false,
            search: "",
        };
        assert!(!hidden.poi(&map.points_of_interest[1]));
        assert!(!hidden.region(&map.regions[0]));
        assert!(hidden.road(&map.roads[1]));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let map = sample();
        let tree = FilterTree::from_map(&map);
        let vis = Visibility {
            filters: &tree,
            markers_visible: true,
            search: "PEAK",
        };
        let shown: Vec<_> = map
            .points_of_interest
            .iter()
            .filter(|p| vis.poi(p))
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(shown, ["Black Peak"]);
    }

    #[test]
    fn search_folds_whole_strings() {
        let tree = FilterTree::default();
        let vis = Visibility {
            filters: &tree,
            markers_visible: true,
            search: " i\u{307}ZM ",
        };
        assert!(vis.name_matches("İzmir"));
        assert!(!vis.name_matches("Izmir"));
        let folded = Folded::new("aİb");
        assert_eq!(folded.text, "ai\u{307}b");
        assert_eq!(folded.source_range("aİb", 1..2), Some(1..3));
    }
}
