//! Running tallies of resolution outcomes

use super::Outcome;

/// One counter per outcome class, incremented once per resolved record
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassStats {
    pub matched: usize,
    pub url_unresolved: usize,
    pub file_missing: usize,
}

impl PassStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Matched => self.matched += 1,
            Outcome::UrlUnresolved => self.url_unresolved += 1,
            Outcome::FileMissing => self.file_missing += 1,
        }
    }

    /// Number of records resolved so far
    pub fn total(&self) -> usize {
        self.matched + self.url_unresolved + self.file_missing
    }

    /// Copy of the counters for reporting
    pub fn snapshot(&self) -> PassStats {
        *self
    }
}
