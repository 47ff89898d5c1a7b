use serde::{Serialize, Deserialize};
use std::fmt;

use crate::position::Position;

/// Placeholder printed for an empty cell.
pub const EMPTY_CELL: &str = "xx";

/// A consistent view of the board taken by the reporter, including the trails
/// left since the previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Reporter cycle number, starting at 1.
    pub sequence: u64,
    pub rows: usize,
    pub cols: usize,
    /// Occupant id per cell, row-major.
    pub cells: Vec<Option<u32>>,
    /// `rows x (cols - 1)`: set when a move crossed the edge east of a cell.
    pub horizontal_traces: Vec<bool>,
    /// `(rows - 1) x cols`: set when a move crossed the edge south of a cell.
    pub vertical_traces: Vec<bool>,
    pub traveller_count: usize,
    /// Successful moves since the previous snapshot.
    pub moves: u64,
}

impl Snapshot {
    pub fn cell(&self, pos: Position) -> Option<u32> {
        if !pos.in_bounds(self.rows, self.cols) {
            return None;
        }
        self.cells.get(pos.index(self.cols)).copied().flatten()
    }

    /// Whether the edge between `(row, col)` and `(row, col + 1)` was crossed.
    pub fn horizontal_trace(&self, row: usize, col: usize) -> bool {
        if col + 1 >= self.cols {
            return false;
        }
        self.horizontal_traces
            .get(row * (self.cols - 1) + col)
            .copied()
            .unwrap_or(false)
    }

    /// Whether the edge between `(row, col)` and `(row + 1, col)` was crossed.
    pub fn vertical_trace(&self, row: usize, col: usize) -> bool {
        if row + 1 >= self.rows || col >= self.cols {
            return false;
        }
        self.vertical_traces
            .get(row * self.cols + col)
            .copied()
            .unwrap_or(false)
    }

    pub fn trace_count(&self) -> usize {
        self.horizontal_traces.iter().chain(&self.vertical_traces).filter(|&&t| t).count()
    }

    /// The grid drawing: cells separated by `|` or a blank, rows separated by a
    /// line of `-- ` or blank markers.
    pub fn render_grid(&self) -> String {
        let mut out = String::with_capacity((self.rows * 2) * (self.cols * 3 + 1));
        for row in 0..self.rows {
            for col in 0..self.cols {
                match self.cell(Position::new(row, col)) {
                    Some(id) => out.push_str(&format!("{:02}", id)),
                    None => out.push_str(EMPTY_CELL),
                }
                out.push(if self.horizontal_trace(row, col) { '|' } else { ' ' });
            }
            out.push('\n');

            if row + 1 < self.rows {
                for col in 0..self.cols {
                    out.push_str(if self.vertical_trace(row, col) { "-- " } else { "   " });
                }
            }
            out.push('\n');
        }
        out
    }

    /// The full text block: header, blank line, grid, trailing blank line.
    pub fn render_report(&self) -> String {
        format!("SNAPSHOT - {}\n\n{}\n", self.sequence, self.render_grid())
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_grid())
    }
}
