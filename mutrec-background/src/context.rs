//! Trinucleotide contexts and substitution channels.
//!
//! A channel is a reference trinucleotide plus the alternate base of its
//! central position, written `ACA>T`. Channels are packed into an index in
//! `0..N_CHANNELS`: `triplet * 4 + alternate`.

use mutrec_core::models::NUCLEOTIDES;

pub const N_TRIPLETS: usize = 64;
pub const N_CHANNELS: usize = N_TRIPLETS * 4;

#[inline]
pub fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

#[inline]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        other => other,
    }
}

/// Index of a trinucleotide, `None` if it holds anything but A, C, G, T.
#[inline]
pub fn triplet_index(triplet: [u8; 3]) -> Option<usize> {
    Some(base_index(triplet[0])? * 16 + base_index(triplet[1])? * 4 + base_index(triplet[2])?)
}

#[inline]
pub fn channel_index(triplet: [u8; 3], alternate: u8) -> Option<usize> {
    Some(triplet_index(triplet)? * 4 + base_index(alternate)?)
}

pub fn triplet_from_index(index: usize) -> [u8; 3] {
    [
        NUCLEOTIDES[(index / 16) % 4],
        NUCLEOTIDES[(index / 4) % 4],
        NUCLEOTIDES[index % 4],
    ]
}

/// The same substitution read on the opposite strand.
pub fn reverse_complement_channel(triplet: [u8; 3], alternate: u8) -> ([u8; 3], u8) {
    (
        [complement(triplet[2]), complement(triplet[1]), complement(triplet[0])],
        complement(alternate),
    )
}

///
/// Parse a channel label such as `ACA>T`.
///
pub fn parse_channel(label: &str) -> Option<([u8; 3], u8)> {
    let bytes = label.trim().as_bytes();
    if bytes.len() != 5 || bytes[3] != b'>' {
        return None;
    }
    let triplet = [
        bytes[0].to_ascii_uppercase(),
        bytes[1].to_ascii_uppercase(),
        bytes[2].to_ascii_uppercase(),
    ];
    let alternate = bytes[4].to_ascii_uppercase();
    triplet_index(triplet)?;
    base_index(alternate)?;
    if alternate == triplet[1] {
        return None;
    }
    Some((triplet, alternate))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_triplet_index_roundtrip() {
        for i in 0..N_TRIPLETS {
            assert_eq!(triplet_index(triplet_from_index(i)), Some(i));
        }
        assert_eq!(triplet_index(*b"ANA"), None);
    }

    #[rstest]
    #[case("ACA>T", Some((*b"ACA", b'T')))]
    #[case("tcg>a", Some((*b"TCG", b'A')))]
    #[case("ACA>C", None)]
    #[case("ACA-T", None)]
    #[case("ANA>T", None)]
    #[case("AC>T", None)]
    fn test_parse_channel(#[case] label: &str, #[case] expected: Option<([u8; 3], u8)>) {
        assert_eq!(parse_channel(label), expected);
    }

    #[rstest]
    fn test_reverse_complement_channel() {
        assert_eq!(reverse_complement_channel(*b"ACG", b'T'), (*b"CGT", b'A'));
    }
}
