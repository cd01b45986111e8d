use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use mutrec_core::utils::get_dynamic_reader;

use crate::context::{N_CHANNELS, channel_index, parse_channel, reverse_complement_channel, triplet_from_index};
use crate::errors::SignatureError;

///
/// Relative probability of each substitution channel.
///
/// Channels not given explicitly take the value of their reverse complement
/// when that one is present (96-channel pyrimidine signatures cover both
/// strands that way) and 0 otherwise.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    weights: Vec<f64>,
}

impl Signature {
    /// Every substitution equally likely.
    pub fn uniform() -> Self {
        let mut weights = vec![0.0; N_CHANNELS];
        for (idx, w) in weights.iter_mut().enumerate() {
            let triplet = triplet_from_index(idx / 4);
            let alternate = mutrec_core::models::NUCLEOTIDES[idx % 4];
            if alternate != triplet[1] {
                *w = 1.0;
            }
        }
        Self { weights }
    }

    pub fn from_channels(channels: &HashMap<String, f64>) -> Result<Self, SignatureError> {
        let mut explicit: Vec<Option<f64>> = vec![None; N_CHANNELS];

        for (label, &value) in channels {
            let (triplet, alternate) =
                parse_channel(label).ok_or_else(|| SignatureError::InvalidChannel(label.clone()))?;
            if !value.is_finite() || value < 0.0 {
                return Err(SignatureError::InvalidProbability {
                    channel: label.clone(),
                    value,
                });
            }
            if let Some(idx) = channel_index(triplet, alternate) {
                explicit[idx] = Some(value);
            }
        }

        let mut weights = vec![0.0; N_CHANNELS];
        for idx in 0..N_CHANNELS {
            let triplet = triplet_from_index(idx / 4);
            let alternate = mutrec_core::models::NUCLEOTIDES[idx % 4];
            if alternate == triplet[1] {
                continue;
            }
            weights[idx] = match explicit[idx] {
                Some(w) => w,
                None => {
                    let (rc_triplet, rc_alt) = reverse_complement_channel(triplet, alternate);
                    channel_index(rc_triplet, rc_alt)
                        .and_then(|rc| explicit[rc])
                        .unwrap_or(0.0)
                }
            };
        }

        debug!("Signature built from {} channels", channels.len());
        Ok(Self { weights })
    }

    ///
    /// Load a JSON object mapping channels (`"ACA>T"`) to probabilities.
    ///
    pub fn load(path: &Path) -> Result<Self, SignatureError> {
        let reader = get_dynamic_reader(path)?;
        let channels: HashMap<String, f64> = serde_json::from_reader(reader)?;
        info!("Loaded signature with {} channels from {}", channels.len(), path.display());
        Self::from_channels(&channels)
    }

    /// Weight of substituting the centre of `triplet` by `alternate`; 0 for
    /// contexts holding anything but A, C, G, T.
    #[inline]
    pub fn weight(&self, triplet: [u8; 3], alternate: u8) -> f64 {
        channel_index(triplet, alternate)
            .map(|idx| self.weights[idx])
            .unwrap_or(0.0)
    }

    /// Summed weight of the three possible substitutions of a position.
    #[inline]
    pub fn position_weight(&self, triplet: [u8; 3]) -> f64 {
        match crate::context::triplet_index(triplet) {
            Some(t) => self.weights[t * 4..t * 4 + 4].iter().sum(),
            None => 0.0,
        }
    }

    /// Per-alternate weights, in A, C, G, T order.
    #[inline]
    pub fn alternate_weights(&self, triplet: [u8; 3]) -> [f64; 4] {
        match crate::context::triplet_index(triplet) {
            Some(t) => [
                self.weights[t * 4],
                self.weights[t * 4 + 1],
                self.weights[t * 4 + 2],
                self.weights[t * 4 + 3],
            ],
            None => [0.0; 4],
        }
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::uniform()
    }
}
