pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

pub fn is_nucleotide(base: u8) -> bool {
    NUCLEOTIDES.contains(&base)
}

///
/// A mutation call as read from the input table, before it has been checked
/// against the reference or assigned to an element.
///
/// `position` is already converted to 0-based.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub chr: String,
    pub position: u32,
    pub reference: String,
    pub alternate: String,
    pub sample: Option<String>,
    pub element: Option<String>,
}

impl MutationRecord {
    ///
    /// Single nucleotide substitution between two of A, C, G, T.
    ///
    pub fn is_snv(&self) -> bool {
        let (r, a) = (self.reference.as_bytes(), self.alternate.as_bytes());
        r.len() == 1 && a.len() == 1 && is_nucleotide(r[0]) && is_nucleotide(a[0]) && r[0] != a[0]
    }

    pub fn into_mutation(self, element: impl Into<String>) -> Option<Mutation> {
        if !self.is_snv() {
            return None;
        }
        Some(Mutation {
            chr: self.chr,
            position: self.position,
            reference: self.reference.as_bytes()[0],
            alternate: self.alternate.as_bytes()[0],
            sample: self.sample,
            element: element.into(),
        })
    }
}

///
/// An observed single nucleotide variant owned by exactly one element.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub chr: String,
    /// 0-based
    pub position: u32,
    pub reference: u8,
    pub alternate: u8,
    pub sample: Option<String>,
    /// Identifier of the owning element
    pub element: String,
}

///
/// A mutation placed inside an element, observed or simulated. The
/// chromosome is implied by `interval`, the index of the element interval
/// holding `position`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteMutation {
    pub interval: u32,
    pub position: u32,
    pub alternate: u8,
}
