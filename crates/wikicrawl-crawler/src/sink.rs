use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::graph::VertexGraph;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Couldn't write graph to {destination}: {source}")]
    Io {
        destination: String,
        source: io::Error,
    },
}

/// Persists the finished graph.
pub trait GraphSink: Send + Sync {
    fn persist(&self, graph: &VertexGraph) -> Result<(), SinkError>;

    /// Where the graph goes, for logs
    fn destination(&self) -> String;
}

/// Writes the vertex count, then one path per line in insertion order.
pub fn write_graph<W: Write>(graph: &VertexGraph, wtr: &mut W) -> io::Result<()> {
    writeln!(wtr, "{}", graph.len())?;
    for v in graph.iter() {
        writeln!(wtr, "{}", v.path())?;
    }
    wtr.flush()
}

#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, graph: &VertexGraph) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut wtr = BufWriter::new(fs::File::create(&self.path)?);
        write_graph(graph, &mut wtr)
    }
}

impl GraphSink for FileSink {
    fn persist(&self, graph: &VertexGraph) -> Result<(), SinkError> {
        self.write(graph).map_err(|source| SinkError::Io {
            destination: self.destination(),
            source,
        })
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}

/// Writes the graph to any writer, e.g. stdout or an in-memory buffer.
#[derive(Debug)]
pub struct WriterSink<W> {
    name: String,
    wtr: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(name: impl Into<String>, wtr: W) -> Self {
        Self {
            name: name.into(),
            wtr: Mutex::new(wtr),
        }
    }

    pub fn into_inner(self) -> W {
        match self.wtr.into_inner() {
            Ok(wtr) => wtr,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> GraphSink for WriterSink<W> {
    fn persist(&self, graph: &VertexGraph) -> Result<(), SinkError> {
        let mut wtr = match self.wtr.lock() {
            Ok(wtr) => wtr,
            Err(poisoned) => poisoned.into_inner(),
        };
        write_graph(graph, &mut *wtr).map_err(|source| SinkError::Io {
            destination: self.destination(),
            source,
        })
    }

    fn destination(&self) -> String {
        self.name.clone()
    }
}
