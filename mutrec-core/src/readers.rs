//! Readers for the tab-separated input tables (plain or gzip'd).
//!
//! Every table carries a header line; column order is free and unknown
//! columns are ignored.

use std::io::Read;
use std::path::Path;

use fxhash::FxHashMap;
use log::{info, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::errors::InputError;
use crate::models::{Element, GenomicInterval, MutationRecord, RegionOfInterest};
use crate::utils::{get_dynamic_reader, normalize_chromosome};

const ELEMENT_COLUMNS: &[&str] = &["CHROMOSOME", "START", "END", "ELEMENT"];
const MUTATION_COLUMNS: &[&str] = &["CHROMOSOME", "POSITION", "REF", "ALT"];

#[derive(Debug, Deserialize)]
struct ElementRow {
    #[serde(rename = "CHROMOSOME")]
    chromosome: String,
    #[serde(rename = "START")]
    start: u32,
    #[serde(rename = "END")]
    end: u32,
    #[serde(rename = "ELEMENT")]
    element: String,
    #[serde(rename = "SYMBOL", default)]
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MutationRow {
    #[serde(rename = "CHROMOSOME")]
    chromosome: String,
    #[serde(rename = "POSITION")]
    position: u32,
    #[serde(rename = "REF")]
    reference: String,
    #[serde(rename = "ALT")]
    alternate: String,
    #[serde(rename = "SAMPLE", default)]
    sample: Option<String>,
    #[serde(rename = "ELEMENT", default)]
    element: Option<String>,
}

fn read_rows<T, R>(reader: R, path: &str, required: &[&'static str]) -> Result<Vec<T>, InputError>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| InputError::RecordParseError {
            path: path.to_string(),
            record: 0,
            reason: e.to_string(),
        })?
        .clone();
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(InputError::MissingColumn {
                path: path.to_string(),
                column,
            });
        }
    }

    let mut rows = Vec::new();
    for result in csv_reader.deserialize::<T>() {
        let row = result.map_err(|e| InputError::RecordParseError {
            path: path.to_string(),
            record: e.position().map(|p| p.record()).unwrap_or_default(),
            reason: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn open(path: &Path) -> Result<(impl Read, String), InputError> {
    let display = path.display().to_string();
    let reader = get_dynamic_reader(path).map_err(|source| InputError::FileReadError {
        path: display.clone(),
        source,
    })?;
    Ok((reader, display))
}

///
/// `START` and `END` are 1-based and inclusive in the tables; intervals are
/// 0-based and half-open in memory.
///
fn row_interval(row: &ElementRow, record: usize, path: &str) -> Result<GenomicInterval, InputError> {
    if row.start == 0 {
        return Err(InputError::RecordParseError {
            path: path.to_string(),
            record: record as u64 + 1,
            reason: "START is 1-based and must be greater than 0".to_string(),
        });
    }
    Ok(GenomicInterval::new(
        normalize_chromosome(&row.chromosome),
        row.start - 1,
        row.end,
    ))
}

fn group_elements(rows: Vec<ElementRow>, path: &str) -> Result<Vec<Element>, InputError> {
    let mut elements: Vec<Element> = Vec::new();
    let mut slots: FxHashMap<String, usize> = FxHashMap::default();

    for (i, row) in rows.into_iter().enumerate() {
        let interval = row_interval(&row, i, path)?;
        match slots.get(&row.element) {
            Some(&slot) => elements[slot].intervals.push(interval),
            None => {
                slots.insert(row.element.clone(), elements.len());
                let mut element = Element::new(row.element, vec![interval]);
                element.symbol = row.symbol;
                elements.push(element);
            }
        }
    }
    Ok(elements)
}

///
/// Read genomic elements from a reader. Rows sharing an `ELEMENT` value are
/// grouped into one element, in order of first appearance. Intervals are
/// converted to 0-based but otherwise returned as written; normalization
/// happens when the element index is built. A `START` of 0 is rejected.
///
pub fn read_elements_from<R: Read>(reader: R, name: &str) -> Result<Vec<Element>, InputError> {
    let rows: Vec<ElementRow> = read_rows(reader, name, ELEMENT_COLUMNS)?;
    if rows.is_empty() {
        return Err(InputError::EmptyInput(name.to_string()));
    }
    group_elements(rows, name)
}

pub fn read_elements(path: &Path) -> Result<Vec<Element>, InputError> {
    let (reader, name) = open(path)?;
    let elements = read_elements_from(reader, &name)?;
    info!("Loaded {} elements from {}", elements.len(), name);
    Ok(elements)
}

///
/// Read mutation calls. `POSITION` is 1-based in the file and 0-based in the
/// returned records; a position of 0 is rejected.
///
pub fn read_mutations_from<R: Read>(reader: R, name: &str) -> Result<Vec<MutationRecord>, InputError> {
    let rows: Vec<MutationRow> = read_rows(reader, name, MUTATION_COLUMNS)?;

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            if row.position == 0 {
                return Err(InputError::RecordParseError {
                    path: name.to_string(),
                    record: i as u64 + 1,
                    reason: "POSITION is 1-based and must be greater than 0".to_string(),
                });
            }
            Ok(MutationRecord {
                chr: normalize_chromosome(&row.chromosome),
                position: row.position - 1,
                reference: row.reference.to_uppercase(),
                alternate: row.alternate.to_uppercase(),
                sample: row.sample,
                element: row.element,
            })
        })
        .collect()
}

pub fn read_mutations(path: &Path) -> Result<Vec<MutationRecord>, InputError> {
    let (reader, name) = open(path)?;
    let mutations = read_mutations_from(reader, &name)?;
    if mutations.is_empty() {
        warn!("No mutations found in {}", name);
    } else {
        info!("Loaded {} mutations from {}", mutations.len(), name);
    }
    Ok(mutations)
}

///
/// Read regions of interest; same layout (and coordinates) as the elements
/// table, one region per row.
///
pub fn read_regions_from<R: Read>(reader: R, name: &str) -> Result<Vec<RegionOfInterest>, InputError> {
    let rows: Vec<ElementRow> = read_rows(reader, name, ELEMENT_COLUMNS)?;
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let interval = row_interval(&row, i, name)?;
            Ok(RegionOfInterest {
                name: row.element,
                symbol: row.symbol,
                interval,
            })
        })
        .collect()
}

pub fn read_regions(path: &Path) -> Result<Vec<RegionOfInterest>, InputError> {
    let (reader, name) = open(path)?;
    let regions = read_regions_from(reader, &name)?;
    info!("Loaded {} regions of interest from {}", regions.len(), name);
    Ok(regions)
}
