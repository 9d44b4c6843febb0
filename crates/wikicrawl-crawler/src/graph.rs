use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

/// A page, identified by its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vertex(String);

impl Vertex {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Vertex {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Vertex {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Vertex {
    fn from(path: String) -> Self {
        Self(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Vertex {0} is already in the graph")]
    AlreadyExists(Vertex),
    #[error("Vertex {0} is not in the graph")]
    NotFound(Vertex),
}

/// Directed graph keeping vertices and their successors in insertion order.
#[derive(Debug, Clone, Default)]
pub struct VertexGraph {
    order: Vec<Vertex>,
    successors: HashMap<Vertex, Vec<Vertex>>,
}

impl VertexGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, v: Vertex) -> Result<(), GraphError> {
        if self.successors.contains_key(&v) {
            return Err(GraphError::AlreadyExists(v));
        }
        self.successors.insert(v.clone(), Vec::new());
        self.order.push(v);
        Ok(())
    }

    /// Appends `to` to the successors of `from`. `to` is not required to be a member.
    pub fn add_edge(&mut self, from: &Vertex, to: Vertex) -> Result<(), GraphError> {
        match self.successors.get_mut(from) {
            Some(succ) => {
                succ.push(to);
                Ok(())
            }
            None => Err(GraphError::NotFound(from.clone())),
        }
    }

    pub fn neighbors(&self, v: &Vertex) -> Result<Vec<Vertex>, GraphError> {
        self.successors
            .get(v)
            .cloned()
            .ok_or_else(|| GraphError::NotFound(v.clone()))
    }

    pub fn out_degree(&self, v: &Vertex) -> Result<usize, GraphError> {
        self.successors
            .get(v)
            .map(Vec::len)
            .ok_or_else(|| GraphError::NotFound(v.clone()))
    }

    pub fn vertices(&self) -> Vec<Vertex> {
        self.order.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vertex> {
        self.order.iter()
    }

    pub fn contains<Q>(&self, path: &Q) -> bool
    where
        Vertex: Borrow<Q>,
        Q: std::hash::Hash + Eq + ?Sized,
    {
        self.successors.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.values().map(Vec::len).sum()
    }

    /// Drops every edge whose target path is not in `visited`, returns how many were removed.
    pub fn prune_edges_to_unvisited(&mut self, visited: &HashSet<String>) -> usize {
        let mut removed = 0;
        for succ in self.successors.values_mut() {
            let before = succ.len();
            succ.retain(|to| visited.contains(to.path()));
            removed += before - succ.len();
        }
        removed
    }
}
