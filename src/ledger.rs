use crate::*;

/// Append-only store of encrypted ballots.
///
/// Written only by the election controller after a vote is accepted. Entries
/// are ordinal-indexed in acceptance order and never mutated or removed;
/// there is deliberately no API that could do either.
#[derive(Default, Clone, Debug, Serialize, Deserialize)]
pub struct VoteLedger {
    entries: Vec<EncodedBallot>,
}

impl VoteLedger {
    pub fn new() -> Self {
        VoteLedger::default()
    }

    /// Append an accepted ballot, returning its ordinal.
    pub(crate) fn append(&mut self, ballot: EncodedBallot) -> u64 {
        let ordinal = self.entries.len() as u64;
        self.entries.push(ballot);
        ordinal
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bounded read of stored ballots. An offset past the end yields an
    /// empty page; the limit caps the page size.
    pub fn page(&self, offset: u64, limit: u64) -> &[EncodedBallot] {
        let start = std::cmp::min(offset, self.len()) as usize;
        let end = std::cmp::min(offset.saturating_add(limit), self.len()) as usize;
        &self.entries[start..end]
    }
}
