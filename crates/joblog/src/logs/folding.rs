use serde::{Deserialize, Serialize};

use super::section::Sections;

/// A foldable line range of the filtered document (both ends inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FoldingRegion {
    pub start_line: usize,
    pub end_line: usize,
}

/// One region per closed section, ordered by start line.
///
/// Sections still open (the job is running or the end marker was lost)
/// are not foldable.
pub fn folding_regions(sections: &Sections) -> Vec<FoldingRegion> {
    let mut regions: Vec<FoldingRegion> = sections
        .values()
        .filter_map(|section| {
            section.end_line.map(|end_line| FoldingRegion {
                start_line: section.start_line,
                end_line,
            })
        })
        .collect();
    regions.sort();
    regions
}
