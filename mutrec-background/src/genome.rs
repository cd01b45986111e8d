use std::io::BufRead;

use fxhash::FxHashMap;
use log::debug;

use mutrec_core::models::{ContigSizes, MutationRecord};
use mutrec_core::utils::normalize_chromosome;

use crate::errors::ReferenceError;

/// Why a mutation call was dropped while checking it against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discard {
    Mitochondrial,
    NotSnv,
    UnknownContig,
    /// Trinucleotide context holds an `N` or runs off the contig
    MaskedContext,
    ReferenceMismatch,
}

///
/// Reference genome sequences held in memory, upper-cased, with any
/// non-ACGT letter stored as `N`.
///
#[derive(Debug, Clone)]
pub struct ReferenceGenome {
    pub id: String,
    contigs: FxHashMap<String, Vec<u8>>,
}

impl ReferenceGenome {
    pub fn from_sequences<I, S>(id: &str, sequences: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let contigs = sequences
            .into_iter()
            .map(|(name, seq)| (normalize_chromosome(name.as_ref()), clean_sequence(seq)))
            .collect();
        Self {
            id: id.to_string(),
            contigs,
        }
    }

    ///
    /// Parse FASTA records. Contig names are the first word of each header,
    /// normalized like every other chromosome name.
    ///
    pub fn from_fasta<R: BufRead>(id: &str, reader: R) -> Result<Self, ReferenceError> {
        let load_error = |reason: String| ReferenceError::Load {
            id: id.to_string(),
            reason,
        };

        let mut contigs: FxHashMap<String, Vec<u8>> = FxHashMap::default();
        let mut current: Option<(String, Vec<u8>)> = None;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| load_error(format!("read failed at line {}: {}", line_num + 1, e)))?;
            let line = line.trim_end();

            if let Some(header) = line.strip_prefix('>') {
                if let Some((name, seq)) = current.take() {
                    contigs.insert(name, seq);
                }
                let name = header.split_whitespace().next().unwrap_or_default();
                if name.is_empty() {
                    return Err(load_error(format!("empty FASTA header at line {}", line_num + 1)));
                }
                current = Some((normalize_chromosome(name), Vec::new()));
            } else if !line.is_empty() {
                let Some((_, seq)) = current.as_mut() else {
                    return Err(load_error(format!(
                        "sequence data before the first header at line {}",
                        line_num + 1
                    )));
                };
                if let Some(bad) = line.bytes().find(|b| !b.is_ascii_alphabetic()) {
                    return Err(load_error(format!(
                        "invalid character {:?} at line {}",
                        bad as char,
                        line_num + 1
                    )));
                }
                seq.extend(line.bytes().map(clean_base));
            }
        }
        if let Some((name, seq)) = current.take() {
            contigs.insert(name, seq);
        }

        if contigs.is_empty() {
            return Err(load_error("no sequences found".to_string()));
        }
        if let Some((name, _)) = contigs.iter().find(|(_, seq)| seq.is_empty()) {
            return Err(load_error(format!("contig {} has no sequence", name)));
        }

        debug!("Parsed {} contigs for {}", contigs.len(), id);
        Ok(Self {
            id: id.to_string(),
            contigs,
        })
    }

    pub fn contig_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contigs.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn sequence(&self, chr: &str) -> Option<&[u8]> {
        self.contigs.get(chr).map(|s| s.as_slice())
    }

    pub fn base(&self, chr: &str, position: u32) -> Option<u8> {
        self.sequence(chr)?.get(position as usize).copied()
    }

    ///
    /// Bases at `position - 1 ..= position + 1`; `None` at the contig edges.
    ///
    pub fn triplet(&self, chr: &str, position: u32) -> Option<[u8; 3]> {
        let seq = self.sequence(chr)?;
        let pos = position as usize;
        if pos == 0 || pos + 1 >= seq.len() {
            return None;
        }
        Some([seq[pos - 1], seq[pos], seq[pos + 1]])
    }

    ///
    /// Check a mutation call against the reference sequence.
    ///
    pub fn check_record(&self, record: &MutationRecord) -> Result<(), Discard> {
        if record.chr == mutrec_core::consts::MITOCHONDRIAL_CHROMOSOME {
            return Err(Discard::Mitochondrial);
        }
        if !record.is_snv() {
            return Err(Discard::NotSnv);
        }
        if !self.contigs.contains_key(&record.chr) {
            return Err(Discard::UnknownContig);
        }
        let triplet = self
            .triplet(&record.chr, record.position)
            .filter(|t| !t.contains(&b'N'))
            .ok_or(Discard::MaskedContext)?;
        if triplet[1] != record.reference.as_bytes()[0] {
            return Err(Discard::ReferenceMismatch);
        }
        Ok(())
    }
}

impl ContigSizes for ReferenceGenome {
    fn contig_len(&self, chr: &str) -> Option<u32> {
        self.contigs.get(chr).map(|s| s.len() as u32)
    }
}

#[inline]
fn clean_base(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b @ (b'A' | b'C' | b'G' | b'T') => b,
        _ => b'N',
    }
}

fn clean_sequence(mut seq: Vec<u8>) -> Vec<u8> {
    seq.iter_mut().for_each(|b| *b = clean_base(*b));
    seq
}
