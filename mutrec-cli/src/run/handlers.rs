use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use flate2::Compression;
use flate2::write::GzEncoder;
use log::{info, warn};
use serde::Serialize;

use mutrec_background::Signature;
use mutrec_core::readers::{read_elements, read_mutations, read_regions};
use mutrec_core::{RunConfig, ScoreKind};
use mutrec_sampling::{Analysis, AnalysisInput, ElementResult, RegionResult};

pub const OUTPUT_COLUMNS: [&str; 8] = [
    "ELEMENT",
    "SYMBOL",
    "STATUS",
    "MUTS",
    "OBSERVED_SCORE",
    "MEAN_SIMULATED",
    "P_VALUE",
    "Q_VALUE",
];

pub const REGION_COLUMNS: [&str; 8] = [
    "REGION",
    "HUGO_SYMBOL",
    "TOTAL_MUTS_GENE",
    "OBSERVED_REGION",
    "MEAN_SIMULATED",
    "U",
    "P_VALUE",
    "Q_VALUE",
];

pub fn run_analysis(matches: &ArgMatches) -> Result<()> {
    // get arguments from CLI
    let muts = matches
        .get_one::<String>("muts")
        .context("A path to a mutations file is required.")?;
    let elements = matches
        .get_one::<String>("elements")
        .context("A path to an elements file is required.")?;
    let output = PathBuf::from(
        matches
            .get_one::<String>("output")
            .context("An output path is required.")?,
    );

    let regions_output = matches.get_one::<String>("regions-output").map(PathBuf::from);

    if output.exists() {
        warn!("Skipping analysis: {} already exists", output.display());
        return Ok(());
    }

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => RunConfig::from_file(path).with_context(|| format!("Can't load configuration {}", path))?,
        None => RunConfig::default(),
    };
    apply_overrides(&mut config, matches)?;

    let input = AnalysisInput {
        elements: read_elements(Path::new(elements))?,
        mutations: read_mutations(Path::new(muts))?,
        regions: match matches.get_one::<String>("regions") {
            Some(path) => read_regions(Path::new(path))?,
            None => Vec::new(),
        },
        signature: match matches.get_one::<String>("signature") {
            Some(path) => Some(Signature::load(Path::new(path))?),
            None => None,
        },
    };

    let analysis = Analysis::new(config)?.with_progress(!matches.get_flag("no-progress"));
    let report = analysis.run(input)?;

    write_results(&output, &report.results)
        .with_context(|| format!("Can't write results to {}", output.display()))?;
    info!(
        "Wrote {} elements to {} (seed {})",
        report.results.len(),
        output.display(),
        report.run_seed
    );

    if let Some(path) = regions_output {
        if report.regions.is_empty() {
            warn!("Empty region results, writing only the header to {}", path.display());
        }
        write_regions(&path, &report.regions)
            .with_context(|| format!("Can't write region results to {}", path.display()))?;
        info!("Wrote {} regions to {}", report.regions.len(), path.display());
    }

    Ok(())
}

///
/// Command line values win over the configuration file.
///
pub fn apply_overrides(config: &mut RunConfig, matches: &ArgMatches) -> Result<()> {
    if let Some(genome) = matches.get_one::<String>("genome") {
        config.reference_genome = genome.clone();
    }
    if let Some(dir) = matches.get_one::<String>("genomes-dir") {
        config.genomes_dir = Some(PathBuf::from(dir));
    }
    if let Some(&cores) = matches.get_one::<usize>("cores") {
        config.cores = Some(cores);
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(seed);
    }
    if let Some(&sampling) = matches.get_one::<usize>("sampling") {
        config.sampling = sampling;
    }
    if let Some(&chunk) = matches.get_one::<usize>("sampling-chunk") {
        config.sampling_chunk = chunk;
    }
    if let Some(&muts_min) = matches.get_one::<usize>("muts-min") {
        config.muts_min = muts_min;
    }
    if let Some(score) = matches.get_one::<String>("score") {
        config.score = ScoreKind::from_str(score)?;
    }
    config.validate()?;
    Ok(())
}

fn write_table<W: Write, T: Serialize>(writer: W, rows: &[T], header: &[&str]) -> Result<W> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    if rows.is_empty() {
        wtr.write_record(header)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    wtr.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()))
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T], header: &[&str]) -> Result<()> {
    let file = File::create(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        let encoder = write_table(GzEncoder::new(file, Compression::default()), rows, header)?;
        encoder.finish()?;
    } else {
        write_table(BufWriter::new(file), rows, header)?.flush()?;
    }
    Ok(())
}

pub fn write_results(path: &Path, results: &[ElementResult]) -> Result<()> {
    write_rows(path, results, &OUTPUT_COLUMNS)
}

pub fn write_regions(path: &Path, regions: &[RegionResult]) -> Result<()> {
    write_rows(path, regions, &REGION_COLUMNS)
}
