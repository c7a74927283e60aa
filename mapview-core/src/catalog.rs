//! Hierarchical catalog loading.
//!
//! The root index lists map stubs whose `children` may be plain ids. Every id
//! is fetched once, level by level, and the tree is then assembled with
//! placeholders standing in for anything that could not be resolved.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;

use crate::config::ViewerConfig;
use crate::error::{CatalogError, SourceError};
use crate::model::{ChildRef, MapDescriptor};
use crate::resolve;

/// Where catalog files come from. The browser build fetches over HTTP; tests
/// serve from memory.
#[allow(async_fn_in_trait)]
pub trait MapSource {
    async fn fetch_index(&self) -> Result<String, SourceError>;
    async fn fetch_map(&self, id: &str) -> Result<String, SourceError>;
}

/// Fully resolved forest of map descriptors.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub roots: Vec<MapDescriptor>,
}

impl Catalog {
    pub fn new(roots: Vec<MapDescriptor>) -> Self {
        Catalog { roots }
    }

    pub fn find(&self, id: &str) -> Option<&MapDescriptor> {
        resolve::find_map(&self.roots, id)
    }

    pub fn first_loadable_id(&self) -> Option<&str> {
        resolve::first_loadable_id(&self.roots)
    }

    /// Map to show at start-up: the requested one when it can be shown,
    /// otherwise the first loadable map.
    pub fn initial_map(&self, requested: Option<&str>) -> Option<&MapDescriptor> {
        if let Some(m) = requested.and_then(|id| self.find(id))
            && !m.is_coming_soon()
        {
            return Some(m);
        }
        self.first_loadable_id().and_then(|id| self.find(id))
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

type Fetched = HashMap<String, Result<MapDescriptor, String>>;

pub struct CatalogLoader<S> {
    source: S,
    max_depth: usize,
}

impl<S: MapSource> CatalogLoader<S> {
    pub fn new(source: S, config: &ViewerConfig) -> Self {
        CatalogLoader {
            source,
            max_depth: config.max_child_depth,
        }
    }

    /// Load the index and resolve every child reference.
    pub async fn load(&self) -> Result<Catalog, CatalogError> {
        let text = self
            .source
            .fetch_index()
            .await
            .map_err(CatalogError::Index)?;
        let mut roots: Vec<MapDescriptor> = serde_json::from_str(&text)?;
        log::info!("Map index lists {} entries", roots.len());

        let fetched = self.fetch_all(&roots).await;
        let mut lineage = Vec::new();
        for root in &mut roots {
            lineage.push(root.id.clone());
            self.attach(root, 1, &mut lineage, &fetched);
            lineage.pop();
        }
        Ok(Catalog::new(roots))
    }

    // Breadth-first: each level is fetched concurrently and joined before the
    // children it reveals are queued.
    async fn fetch_all(&self, roots: &[MapDescriptor]) -> Fetched {
        let mut fetched = Fetched::new();
        let mut frontier = Vec::new();
        for root in roots {
            pending_ids(root, 1, &mut frontier);
        }
        while !frontier.is_empty() {
            let mut seen = HashSet::new();
            let batch: Vec<(String, usize)> = frontier
                .drain(..)
                .filter(|(id, depth)| {
                    *depth <= self.max_depth
                        && !id.is_empty()
                        && !fetched.contains_key(id)
                        && seen.insert(id.clone())
                })
                .collect();
            let results = join_all(batch.iter().map(|(id, _)| self.fetch_child(id))).await;
            for ((id, depth), res) in batch.into_iter().zip(results) {
                if let Ok(desc) = &res {
                    pending_ids(desc, depth + 1, &mut frontier);
                }
                fetched.insert(id, res);
            }
        }
        fetched
    }

    async fn fetch_child(&self, id: &str) -> Result<MapDescriptor, String> {
        let text = match self.source.fetch_map(id).await {
            Ok(t) => t,
            Err(SourceError::NotFound) => {
                log::warn!("Child map file not found: {id} - marking as coming-soon");
                return Err("not found".to_string());
            }
            Err(e) => {
                log::warn!("Failed to load child map {id}: {e} - marking as coming-soon");
                return Err(e.to_string());
            }
        };
        match serde_json::from_str::<MapDescriptor>(&text) {
            Ok(mut desc) => {
                if desc.id.is_empty() {
                    desc.id = id.to_string();
                }
                if desc.name.is_empty() {
                    desc.name = id.to_string();
                }
                Ok(desc)
            }
            Err(e) => {
                log::error!("Error processing child {id}: {e}");
                Err(e.to_string())
            }
        }
    }

    fn attach(
        &self,
        node: &mut MapDescriptor,
        depth: usize,
        lineage: &mut Vec<String>,
        fetched: &Fetched,
    ) {
        let parent = node.id.clone();
        for child in node.children.iter_mut() {
            let resolved = match child {
                ChildRef::Map(inline) => {
                    lineage.push(inline.id.clone());
                    self.attach(inline, depth + 1, lineage, fetched);
                    lineage.pop();
                    continue;
                }
                ChildRef::Id(id) => self.resolve_id(id, depth, lineage, fetched),
                ChildRef::Invalid(v) => {
                    log::warn!("Invalid child reference {v} under {parent}");
                    MapDescriptor::placeholder(&invalid_label(v), "invalid child reference")
                }
            };
            *child = ChildRef::Map(Box::new(resolved));
        }
    }

    fn resolve_id(
        &self,
        id: &str,
        depth: usize,
        lineage: &mut Vec<String>,
        fetched: &Fetched,
    ) -> MapDescriptor {
        if id.is_empty() {
            return MapDescriptor::placeholder("Invalid Child", "empty child id");
        }
        if depth > self.max_depth {
            log::warn!("Child {id} exceeds depth limit {}", self.max_depth);
            return MapDescriptor::placeholder(id, "depth limit exceeded");
        }
        if lineage.iter().any(|a| a == id) {
            log::warn!("Child {id} references one of its ancestors");
            return MapDescriptor::placeholder(id, "cyclic reference");
        }
        match fetched.get(id) {
            Some(Ok(desc)) => {
                let mut desc = desc.clone();
                lineage.push(id.to_string());
                self.attach(&mut desc, depth + 1, lineage, fetched);
                lineage.pop();
                desc
            }
            Some(Err(reason)) => MapDescriptor::placeholder(id, reason.clone()),
            None => MapDescriptor::placeholder(id, "not fetched"),
        }
    }
}

/// Queue the string children of `node`, which sit at `depth`.
fn pending_ids(node: &MapDescriptor, depth: usize, out: &mut Vec<(String, usize)>) {
    for child in &node.children {
        match child {
            ChildRef::Id(id) => out.push((id.clone(), depth)),
            ChildRef::Map(inline) => pending_ids(inline, depth + 1, out),
            ChildRef::Invalid(_) => {}
        }
    }
}

fn invalid_label(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "Invalid Child".to_string(),
        other => other.to_string(),
    }
}
