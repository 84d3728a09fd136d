//! Coupling matrix construction and its wire frame
//!
//! Rows and columns follow ascending node id. `matrix[i][j] == 1` when node
//! `i` couples into node `j`; a bidirectional edge sets both cells.
//!
//! The wire frame is ASCII, row-major, rows separated by `;` and cells by
//! `,`, wrapped in `<` `>`:
//!
//! ```text
//! <0,1,0;1,0,1;0,0,0>
//! ```

use crate::error::{OscNetError, Result};
use crate::graph::GraphStore;
use crate::types::{Edge, Node, NodeId};
use std::collections::HashMap;
use std::fmt;

pub const FRAME_START: u8 = b'<';
pub const FRAME_END: u8 = b'>';
pub const ROW_SEPARATOR: u8 = b';';
pub const CELL_SEPARATOR: u8 = b',';

/// Square 0/1 adjacency matrix
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CouplingMatrix {
    size: usize,
    cells: Vec<u8>,
}

impl CouplingMatrix {
    /// All-zero `size × size` matrix
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Build from explicit rows. Rows must form a square of 0/1 cells.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(OscNetError::MalformedFrame(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            if let Some(cell) = row.iter().find(|&&c| c > 1) {
                return Err(OscNetError::MalformedFrame(format!(
                    "row {} has cell value {}",
                    i, cell
                )));
            }
            cells.extend_from_slice(row);
        }
        Ok(Self { size, cells })
    }

    /// Matrix of a stored network
    pub fn from_store(store: &GraphStore) -> Self {
        build_matrix(store.nodes(), store.edges())
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row < self.size && col < self.size {
            Some(self.cells[row * self.size + col])
        } else {
            None
        }
    }

    fn set(&mut self, row: usize, col: usize) {
        self.cells[row * self.size + col] = 1;
    }

    pub fn row(&self, row: usize) -> Option<&[u8]> {
        if row >= self.size {
            return None;
        }
        let start = row * self.size;
        self.cells.get(start..start + self.size)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.size).map(move |i| &self.cells[i * self.size..(i + 1) * self.size])
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.rows().map(<[u8]>::to_vec).collect()
    }

    /// Number of set cells
    pub fn coupling_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == 1).count()
    }

    /// Serialize to the wire frame
    pub fn encode(&self) -> Vec<u8> {
        // "<" + N*N digits + N*N-1 separators + ">"
        let mut out = Vec::with_capacity(2 * self.cells.len() + 2);
        out.push(FRAME_START);
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                out.push(ROW_SEPARATOR);
            }
            for (j, &cell) in row.iter().enumerate() {
                if j > 0 {
                    out.push(CELL_SEPARATOR);
                }
                out.push(b'0' + cell);
            }
        }
        out.push(FRAME_END);
        out
    }

    /// Parse a wire frame. Surrounding ASCII whitespace is ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let frame = bytes.trim_ascii();
        let payload = frame
            .strip_prefix(&[FRAME_START])
            .ok_or_else(|| OscNetError::MalformedFrame("missing '<'".to_string()))?
            .strip_suffix(&[FRAME_END])
            .ok_or_else(|| OscNetError::MalformedFrame("missing '>'".to_string()))?;

        if payload.is_empty() {
            return Ok(Self::default());
        }

        let rows = payload
            .split(|&b| b == ROW_SEPARATOR)
            .map(|row| {
                row.split(|&b| b == CELL_SEPARATOR)
                    .map(|cell| match cell {
                        b"0" => Ok(0),
                        b"1" => Ok(1),
                        other => Err(OscNetError::MalformedFrame(format!(
                            "invalid cell '{}'",
                            String::from_utf8_lossy(other)
                        ))),
                    })
                    .collect::<Result<Vec<u8>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_rows(&rows)
    }
}

impl fmt::Display for CouplingMatrix {
    /// Wire frame as text
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.encode()))
    }
}

/// Node ids in matrix row order
pub fn node_order<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<NodeId> {
    let mut order: Vec<NodeId> = nodes.into_iter().map(|n| n.id).collect();
    order.sort_unstable();
    order
}

/// Build the coupling matrix of a network
///
/// Edges referencing nodes outside `nodes` are ignored.
pub fn build_matrix<'a, 'b>(
    nodes: impl IntoIterator<Item = &'a Node>,
    edges: impl IntoIterator<Item = &'b Edge>,
) -> CouplingMatrix {
    let order = node_order(nodes);
    let index: HashMap<NodeId, usize> = order.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut matrix = CouplingMatrix::zeros(order.len());
    for edge in edges {
        let (Some(&start), Some(&end)) = (index.get(&edge.start), index.get(&edge.end)) else {
            tracing::warn!("Edge {} references a node outside the matrix", edge.key());
            continue;
        };
        matrix.set(start, end);
        if edge.bidirectional {
            matrix.set(end, start);
        }
    }
    matrix
}
