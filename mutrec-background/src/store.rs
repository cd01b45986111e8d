use std::path::{Path, PathBuf};

use log::info;

use mutrec_core::consts::GENOMES_DIR_ENV;
use mutrec_core::utils::get_dynamic_reader;

use crate::errors::ReferenceError;
use crate::genome::ReferenceGenome;

const FASTA_EXTENSIONS: &[&str] = &["fa", "fasta", "fa.gz", "fasta.gz"];

///
/// Directory of reference genome datasets, one FASTA file per identifier:
/// `<root>/<id>.fa`, `.fasta`, `.fa.gz` or `.fasta.gz`.
///
#[derive(Debug, Clone)]
pub struct GenomeStore {
    root: PathBuf,
}

impl GenomeStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    ///
    /// Resolve the store location: the configured directory, else the
    /// `MUTREC_GENOMES` environment variable, else `~/.mutrec/genomes`.
    ///
    pub fn resolve(configured: Option<&Path>) -> Self {
        if let Some(dir) = configured {
            return Self::new(dir);
        }
        if let Some(dir) = std::env::var_os(GENOMES_DIR_ENV) {
            return Self::new(dir);
        }
        let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
        Self::new(home.join(".mutrec").join("genomes"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn locate(&self, id: &str) -> Result<PathBuf, ReferenceError> {
        FASTA_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", id, ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| ReferenceError::NotFound {
                id: id.to_string(),
                store: self.root.clone(),
            })
    }

    ///
    /// Load the reference genome `id`. There are no retries: a missing or
    /// unreadable dataset is reported straight back to the caller.
    ///
    pub fn load(&self, id: &str) -> Result<ReferenceGenome, ReferenceError> {
        let path = self.locate(id)?;
        info!("Using {} as reference genome ({})", id.to_uppercase(), path.display());

        let reader = get_dynamic_reader(&path).map_err(|e| ReferenceError::Load {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        ReferenceGenome::from_fasta(id, reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mutrec_core::models::ContigSizes;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    #[rstest]
    fn test_load_plain_and_gz() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("toy.fa"), ">1\nACGTACGT\n").unwrap();

        let file = std::fs::File::create(dir.path().join("toygz.fa.gz")).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        write!(encoder, ">chr2\nTTTTCCCC\n").unwrap();
        encoder.finish().unwrap();

        let store = GenomeStore::new(dir.path());
        assert_eq!(store.load("toy").unwrap().contig_len("1"), Some(8));
        assert_eq!(store.load("toygz").unwrap().contig_len("2"), Some(8));
    }

    #[rstest]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = GenomeStore::new(dir.path());
        let err = store.load("hg38").unwrap_err();
        assert!(matches!(err, ReferenceError::NotFound { ref id, .. } if id == "hg38"));
    }

    #[rstest]
    fn test_corrupt_gz_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.fa.gz"), b"not gzip at all").unwrap();
        let err = GenomeStore::new(dir.path()).load("broken").unwrap_err();
        assert!(matches!(err, ReferenceError::Load { .. }));
    }

    #[rstest]
    fn test_resolve_prefers_configured() {
        let store = GenomeStore::resolve(Some(Path::new("/data/genomes")));
        assert_eq!(store.root(), Path::new("/data/genomes"));
    }
}
