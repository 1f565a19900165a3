//! Picks the closest station whose inventory covers a requested year.
//!
//! [`CoverageCandidates`] walks a ranked station list and can be resumed after a candidate
//! turned out to be unusable, so the next call continues right after the last returned rank.

use crate::types::station::RankedStation;
use std::iter::FusedIterator;

/// The first station at or after `from_index` whose coverage includes `target_year`.
///
/// Returns the station's index in `ranked` with it, or `None` once the list is exhausted.
pub fn select(
    ranked: &[RankedStation],
    target_year: i32,
    from_index: usize,
) -> Option<(usize, &RankedStation)> {
    ranked
        .iter()
        .enumerate()
        .skip(from_index)
        .find(|(_, candidate)| candidate.station.covers_year(target_year))
}

/// Iterator over the stations covering one year, closest first.
#[derive(Debug, Clone)]
pub struct CoverageCandidates<'a> {
    ranked: &'a [RankedStation],
    target_year: i32,
    next_index: usize,
}

impl<'a> CoverageCandidates<'a> {
    pub fn new(ranked: &'a [RankedStation], target_year: i32) -> Self {
        Self::resume_from(ranked, target_year, 0)
    }

    /// Starts the walk at `next_index` instead of the closest station.
    pub fn resume_from(ranked: &'a [RankedStation], target_year: i32, next_index: usize) -> Self {
        Self {
            ranked,
            target_year,
            next_index,
        }
    }

    /// Rank index the next search starts from.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn target_year(&self) -> i32 {
        self.target_year
    }
}

impl<'a> Iterator for CoverageCandidates<'a> {
    type Item = (usize, &'a RankedStation);

    fn next(&mut self) -> Option<Self::Item> {
        match select(self.ranked, self.target_year, self.next_index) {
            Some((rank_index, candidate)) => {
                self.next_index = rank_index + 1;
                Some((rank_index, candidate))
            }
            None => {
                self.next_index = self.ranked.len();
                None
            }
        }
    }
}

impl FusedIterator for CoverageCandidates<'_> {}
