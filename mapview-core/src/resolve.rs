use crate::model::MapDescriptor;

/// Depth-first pre-order lookup by id.
pub fn find_map<'a>(items: &'a [MapDescriptor], id: &str) -> Option<&'a MapDescriptor> {
    for item in items {
        if item.id == id {
            return Some(item);
        }
        if let Some(found) = find_in_children(item, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_children<'a>(item: &'a MapDescriptor, id: &str) -> Option<&'a MapDescriptor> {
    for child in item.child_maps() {
        if child.id == id {
            return Some(child);
        }
        if let Some(found) = find_in_children(child, id) {
            return Some(found);
        }
    }
    None
}

/// First id that is not coming soon; if every map is coming soon, the first id
/// at all.
pub fn first_loadable_id(items: &[MapDescriptor]) -> Option<&str> {
    let mut first_any = None;
    for item in items {
        if let Some(id) = first_matching(item, &mut first_any) {
            return Some(id);
        }
    }
    first_any
}

fn first_matching<'a>(item: &'a MapDescriptor, first_any: &mut Option<&'a str>) -> Option<&'a str> {
    if !item.id.is_empty() {
        if first_any.is_none() {
            *first_any = Some(item.id.as_str());
        }
        if !item.is_coming_soon() {
            return Some(item.id.as_str());
        }
    }
    item.child_maps().find_map(|c| first_matching(c, first_any))
}

/// Ids of every descriptor in pre-order.
pub fn all_ids(items: &[MapDescriptor]) -> Vec<&str> {
    fn walk<'a>(item: &'a MapDescriptor, out: &mut Vec<&'a str>) {
        out.push(item.id.as_str());
        for c in item.child_maps() {
            walk(c, out);
        }
    }
    let mut out = Vec::new();
    for item in items {
        walk(item, &mut out);
    }
    out
}
