use std::collections::{HashMap, VecDeque};

use crate::graph::Vertex;

/// FIFO of vertices awaiting expansion.
#[derive(Debug, Clone, Default)]
pub struct FrontierQueue {
    queue: VecDeque<Vertex>,
    queued: HashMap<Vertex, usize>,
}

impl FrontierQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, v: Vertex) {
        *self.queued.entry(v.clone()).or_default() += 1;
        self.queue.push_back(v);
    }

    pub fn dequeue(&mut self) -> Option<Vertex> {
        let v = self.queue.pop_front()?;
        if let Some(n) = self.queued.get_mut(&v) {
            *n -= 1;
            if *n == 0 {
                self.queued.remove(&v);
            }
        }
        Some(v)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.queued.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
