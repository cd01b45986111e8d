pub const DEFAULT_REFERENCE_GENOME: &str = "hg38";
pub const DEFAULT_MUTS_MIN: usize = 2;
pub const DEFAULT_SAMPLING: usize = 10_000;
pub const DEFAULT_SAMPLING_CHUNK: usize = 1_000;

/// Environment variable pointing at the genome store directory
pub const GENOMES_DIR_ENV: &str = "MUTREC_GENOMES";

/// Mitochondrial mutations are never analysed
pub const MITOCHONDRIAL_CHROMOSOME: &str = "M";
