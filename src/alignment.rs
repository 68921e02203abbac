//! # Alignment
//!
//! An [`Alignment`] is one candidate solution (a "bacterium"): one row per input
//! sequence, where each row is the sequence with gap symbols inserted. After
//! [`Alignment::square`] every row has the same length.

use std::fmt;

use crate::sequence::{Sequence, SequenceSet};

/// The gap symbol.
pub const GAP: u8 = b'-';

/// Row content of the placeholder alignment a discarded slot is overwritten with.
pub const PLACEHOLDER_ROW: &[u8] = b"ATGC";

/// A fixed-size collection of alignments, one per bacterium.
pub type Population = Vec<Alignment>;

/// One candidate multiple-sequence alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    rows: Vec<Vec<u8>>,
}

impl Alignment {
    pub fn new(rows: Vec<Vec<u8>>) -> Self {
        Self { rows }
    }

    /// Builds an unaligned candidate straight from the input sequences.
    pub fn from_sequences(sequences: &[Sequence]) -> Self {
        Self {
            rows: sequences.iter().map(|s| s.residues().to_vec()).collect(),
        }
    }

    /// The minimal safe alignment: every row holds [`PLACEHOLDER_ROW`].
    pub fn placeholder(num_rows: usize) -> Self {
        Self {
            rows: vec![PLACEHOLDER_ROW.to_vec(); num_rows],
        }
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Whether all rows share one length.
    pub fn is_square(&self) -> bool {
        let width = self.width();
        self.rows.iter().all(|row| row.len() == width)
    }

    /// Inserts a gap into `row` before position `pos`. Out-of-range positions append.
    pub fn insert_gap(&mut self, row: usize, pos: usize) {
        if let Some(r) = self.rows.get_mut(row) {
            let pos = pos.min(r.len());
            r.insert(pos, GAP);
        }
    }

    /// Pads every row with trailing gaps up to `width`.
    pub fn pad_to(&mut self, width: usize) {
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, GAP);
            }
        }
    }

    /// Pads every row to the longest row.
    pub fn square(&mut self) {
        let width = self.width();
        self.pad_to(width);
    }

    /// Removes columns consisting only of gaps. Expects a square alignment.
    pub fn strip_gap_columns(&mut self) {
        let width = self.width();
        let keep: Vec<bool> = (0..width)
            .map(|col| {
                self.rows
                    .iter()
                    .any(|row| row.get(col).is_some_and(|&symbol| symbol != GAP))
            })
            .collect();

        for row in &mut self.rows {
            let mut col = 0;
            row.retain(|_| {
                let kept = keep.get(col).copied().unwrap_or(true);
                col += 1;
                kept
            });
        }
    }

    /// Iterates over the columns of a square alignment.
    pub fn columns(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        (0..self.width()).map(move |col| {
            self.rows
                .iter()
                .map(|row| row.get(col).copied().unwrap_or(GAP))
                .collect()
        })
    }

    /// Renders the alignment with one `name  row` line per sequence.
    pub fn render_with_names(&self, set: &SequenceSet) -> String {
        let width = set.names().iter().map(String::len).max().unwrap_or(0);
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let name = set.names().get(i).map(String::as_str).unwrap_or("?");
                format!("{:<width$}  {}", name, String::from_utf8_lossy(row))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", String::from_utf8_lossy(row))?;
        }
        Ok(())
    }
}

/// Seeds a population where every slot is a copy of the input sequences.
pub fn seed_population(set: &SequenceSet, size: usize) -> Population {
    let seed = Alignment::from_sequences(set.sequences());
    vec![seed; size]
}
