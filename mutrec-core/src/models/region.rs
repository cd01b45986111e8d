use crate::models::interval::GenomicInterval;

///
/// A named sub-region of an element (domain, hotspot window, ...) used by
/// region-based scoring.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOfInterest {
    pub name: String,
    pub symbol: Option<String>,
    pub interval: GenomicInterval,
}

impl RegionOfInterest {
    pub fn new(name: impl Into<String>, interval: GenomicInterval) -> Self {
        Self {
            name: name.into(),
            symbol: None,
            interval,
        }
    }

    ///
    /// Label used in reports: `NAME;SYMBOL`, or just the name.
    ///
    pub fn label(&self) -> String {
        match &self.symbol {
            Some(symbol) => format!("{};{}", self.name, symbol),
            None => self.name.clone(),
        }
    }
}
