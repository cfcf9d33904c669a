//! Checkpoint files between generation and analysis.
//!
//! - Edge list: plain text, one `src dst mu` line per fine edge, line k
//!   holding dense id k.
//! - Star mapping: one JSON object, keys are decimal coarse ids, values are
//!   fine edge id arrays in production order (repeats kept).

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{SigmaError, SigmaResult};
use crate::lattice::{FineEdge, DIRECTIONS};
use crate::stars::StarMap;

/// Write the edge list in dense id order.
pub fn write_edges(path: &Path, edges: &[FineEdge]) -> SigmaResult<()> {
    let file = File::create(path).map_err(|e| SigmaError::io(path, e))?;
    let mut w = BufWriter::new(file);
    for e in edges {
        writeln!(w, "{} {} {}", e.u, e.v, e.mu).map_err(|err| SigmaError::io(path, err))?;
    }
    w.flush().map_err(|e| SigmaError::io(path, e))
}

/// Read an edge list written by [`write_edges`]. Blank lines are skipped.
pub fn read_edges(path: &Path) -> SigmaResult<Vec<FineEdge>> {
    let file = File::open(path).map_err(|e| SigmaError::io(path, e))?;
    let mut edges = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| SigmaError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        edges.push(parse_edge_line(&line).map_err(|reason| SigmaError::Format {
            path: path.to_path_buf(),
            line: i + 1,
            reason,
        })?);
    }
    Ok(edges)
}

fn parse_edge_line(line: &str) -> Result<FineEdge, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(format!("expected 3 fields, found {}", fields.len()));
    }
    let num = |s: &str| {
        s.parse::<usize>()
            .map_err(|e| format!("bad integer {:?}: {}", s, e))
    };
    let u = num(fields[0])?;
    let v = num(fields[1])?;
    let mu = num(fields[2])?;
    if mu >= DIRECTIONS {
        return Err(format!("direction {} out of range 0..{}", mu, DIRECTIONS));
    }
    Ok(FineEdge { u, v, mu: mu as u8 })
}

/// Write the star mapping as one JSON object.
pub fn write_stars(path: &Path, stars: &StarMap) -> SigmaResult<()> {
    let file = File::create(path).map_err(|e| SigmaError::io(path, e))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer(&mut w, stars).map_err(|source| SigmaError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    w.flush().map_err(|e| SigmaError::io(path, e))
}

/// Read a star mapping written by [`write_stars`].
pub fn read_stars(path: &Path) -> SigmaResult<StarMap> {
    let file = File::open(path).map_err(|e| SigmaError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| SigmaError::Json {
        path: path.to_path_buf(),
        source,
    })
}
