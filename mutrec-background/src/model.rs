use log::info;

use mutrec_core::models::GenomicInterval;

use crate::genome::ReferenceGenome;
use crate::signature::Signature;
use crate::table::WeightTable;

///
/// Mutability of every analysed position: the reference sequence, the
/// substitution signature and the weight table built from both.
///
/// Built once per run, never mutated afterwards, and shared by reference
/// with every sampling worker.
///
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    genome: ReferenceGenome,
    signature: Signature,
    table: WeightTable,
}

impl BackgroundModel {
    pub fn build<'a, I>(genome: ReferenceGenome, signature: Signature, intervals: I) -> Self
    where
        I: IntoIterator<Item = &'a GenomicInterval>,
    {
        let table = WeightTable::build(&genome, &signature, intervals);
        info!(
            "Background weight table for {} covers {} positions",
            genome.id,
            table.covered_positions()
        );
        Self {
            genome,
            signature,
            table,
        }
    }

    pub fn reference_id(&self) -> &str {
        &self.genome.id
    }

    pub fn genome(&self) -> &ReferenceGenome {
        &self.genome
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Weight of a single position, answered from the table when covered and
    /// from the reference context otherwise.
    pub fn position_weight(&self, chr: &str, position: u32) -> f64 {
        match self.table.position_weight(chr, position) {
            Some(w) => w,
            None => self
                .genome
                .triplet(chr, position)
                .map(|t| self.signature.position_weight(t))
                .unwrap_or(0.0),
        }
    }

    pub fn interval_weight(&self, interval: &GenomicInterval) -> f64 {
        self.table.range_weight(&interval.chr, interval.start, interval.end)
    }

    /// Weighted position draw inside `interval`; see [`WeightTable::find_position`].
    pub fn find_position(&self, interval: &GenomicInterval, target: f64) -> Option<u32> {
        self.table
            .find_position(&interval.chr, interval.start, interval.end, target)
    }

    /// Relative weights of substituting `chr:position` by A, C, G, T.
    pub fn alternate_weights(&self, chr: &str, position: u32) -> [f64; 4] {
        self.genome
            .triplet(chr, position)
            .map(|t| self.signature.alternate_weights(t))
            .unwrap_or([0.0; 4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_model_queries() {
        let genome = ReferenceGenome::from_sequences("toy", [("1", b"AACCGGTTAA".to_vec())]);
        let iv = GenomicInterval::new("1", 2, 6);
        let model = BackgroundModel::build(genome, Signature::uniform(), [&iv]);

        assert_eq!(model.reference_id(), "toy");
        assert_eq!(model.interval_weight(&iv), 12.0);
        assert_eq!(model.position_weight("1", 3), 3.0);
        // outside the table, answered from the sequence
        assert_eq!(model.position_weight("1", 8), 3.0);
        assert_eq!(model.alternate_weights("1", 3), [1.0, 0.0, 1.0, 1.0]);
        assert_eq!(model.find_position(&iv, 11.9), Some(5));
    }
}
