//! # Sequences and Sequence Sources
//!
//! A [`SequenceSource`] delivers the raw input of a run: an ordered list of
//! residue sequences and a parallel list of names. The optimization loop reads
//! its source once per run and only ever clones the sequences afterwards.
//!
//! ## Example
//!
//! ```rust
//! use bfoalign::sequence::{InMemorySource, SequenceSource};
//!
//! let source = InMemorySource::from_strs(&[("seq1", "MKV"), ("seq2", "MKAV")]);
//! let set = source.load().unwrap();
//! assert_eq!(set.len(), 2);
//! assert_eq!(set.names()[1], "seq2");
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use bio::io::fasta;

use crate::error::{AlignError, Result, ResultExt};

/// An immutable, ordered sequence of residue symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    residues: Vec<u8>,
}

impl Sequence {
    /// Creates a sequence from raw bytes. Line breaks and other whitespace are dropped,
    /// letters are upper-cased.
    pub fn new(raw: &[u8]) -> Self {
        let residues = raw
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|b| b.to_ascii_uppercase())
            .collect();
        Self { residues }
    }

    pub fn residues(&self) -> &[u8] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// The ordered collection of input sequences together with their names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSet {
    sequences: Vec<Sequence>,
    names: Vec<String>,
}

impl SequenceSet {
    /// Creates a sequence set, checking that every sequence has a name.
    pub fn new(sequences: Vec<Sequence>, names: Vec<String>) -> Result<Self> {
        if sequences.len() != names.len() {
            return Err(AlignError::SequenceSource(format!(
                "{} sequences but {} names",
                sequences.len(),
                names.len()
            )));
        }
        Ok(Self { sequences, names })
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Supplies the sequences a run aligns.
///
/// Implementations are called once per run and must hand out owned data, so
/// nothing the run does to its copy is visible back to the source.
pub trait SequenceSource {
    fn load(&self) -> Result<SequenceSet>;
}

/// Reads sequences from a FASTA file; record ids become the sequence names.
#[derive(Debug, Clone)]
pub struct FastaSource {
    path: PathBuf,
}

impl FastaSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SequenceSource for FastaSource {
    fn load(&self) -> Result<SequenceSet> {
        let file = File::open(&self.path)
            .context(format!("Failed to open FASTA file {}", self.path.display()))?;

        let mut sequences = Vec::new();
        let mut names = Vec::new();
        for record in fasta::Reader::new(file).records() {
            let record = record.map_err(|e| {
                AlignError::SequenceSource(format!("{}: {}", self.path.display(), e))
            })?;
            names.push(record.id().to_string());
            sequences.push(Sequence::new(record.seq()));
        }

        if sequences.is_empty() {
            return Err(AlignError::SequenceSource(format!(
                "{} contains no sequences",
                self.path.display()
            )));
        }
        SequenceSet::new(sequences, names)
    }
}

/// Holds sequences in memory; used for embedding and for tests.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    set: SequenceSet,
}

impl InMemorySource {
    pub fn new(set: SequenceSet) -> Self {
        Self { set }
    }

    /// Builds a source from `(name, residues)` pairs.
    pub fn from_strs(entries: &[(&str, &str)]) -> Self {
        let sequences = entries
            .iter()
            .map(|(_, residues)| Sequence::new(residues.as_bytes()))
            .collect();
        let names = entries.iter().map(|(name, _)| name.to_string()).collect();
        Self {
            set: SequenceSet { sequences, names },
        }
    }
}

impl SequenceSource for InMemorySource {
    fn load(&self) -> Result<SequenceSet> {
        if self.set.is_empty() {
            return Err(AlignError::SequenceSource(
                "No sequences available".to_string(),
            ));
        }
        Ok(self.set.clone())
    }
}
