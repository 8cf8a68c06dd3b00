//! Candidate sequence for the inline compression search.
//!
//! Order: the quality sweep at the fitted size runs first, then each shrink
//! round repeats a (slightly lower) sweep at 0.8x the previous size, then a
//! single last-resort candidate at a tenth of the natural size. The order is
//! fixed, so a given input always resolves to the same candidate.

/// One (dimension, quality) point to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub width: u32,
    pub height: u32,
    /// Encoder quality, 1..=100.
    pub quality: u8,
}

/// Qualities tried at the fitted size: 85, 75, 65, 55, 45.
const INITIAL_QUALITIES: [u8; 5] = [85, 75, 65, 55, 45];
/// Qualities tried in every shrink round: 80, 70, 60, 50.
const SHRINK_QUALITIES: [u8; 4] = [80, 70, 60, 50];
const SHRINK_ROUNDS: u32 = 6;
const LAST_RESORT_QUALITY: u8 = 45;

/// Shrink a side to 80%, rounded to nearest, never below 1 px.
fn shrink(side: u32) -> u32 {
    ((side as u64 * 4 + 2) / 5).max(1) as u32
}

/// A tenth of a side, rounded to nearest, never below 1 px.
fn tenth(side: u32) -> u32 {
    ((side as u64 + 5) / 10).max(1) as u32
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Initial { step: usize },
    Shrink { round: u32, step: usize },
    LastResort,
    Done,
}

/// Lazy, finite iterator over compression candidates.
#[derive(Debug, Clone)]
pub struct CandidateSearch {
    natural: (u32, u32),
    fitted: (u32, u32),
    current: (u32, u32),
    stage: Stage,
}

impl CandidateSearch {
    /// `natural` is the decoded size, `fitted` the size after applying the
    /// maximum output dimension (never larger than `natural`).
    pub fn new(natural: (u32, u32), fitted: (u32, u32)) -> Self {
        Self {
            natural,
            fitted,
            current: fitted,
            stage: Stage::Initial { step: 0 },
        }
    }

    fn last_resort_size(&self) -> (u32, u32) {
        // Capped by the last shrink round for sources far above the maximum dimension
        (
            tenth(self.natural.0).min(self.current.0),
            tenth(self.natural.1).min(self.current.1),
        )
    }
}

impl Iterator for CandidateSearch {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            match self.stage {
                Stage::Initial { step } => {
                    if let Some(&quality) = INITIAL_QUALITIES.get(step) {
                        self.stage = Stage::Initial { step: step + 1 };
                        return Some(Candidate {
                            width: self.current.0,
                            height: self.current.1,
                            quality,
                        });
                    }
                    self.stage = Stage::Shrink { round: 0, step: 0 };
                }
                Stage::Shrink { round, step } => {
                    if round >= SHRINK_ROUNDS {
                        self.stage = Stage::LastResort;
                        continue;
                    }
                    if step == 0 {
                        let next = (shrink(self.current.0), shrink(self.current.1));
                        if next == self.current {
                            // Too small to shrink further
                            self.stage = Stage::LastResort;
                            continue;
                        }
                        self.current = next;
                    }
                    if let Some(&quality) = SHRINK_QUALITIES.get(step) {
                        self.stage = Stage::Shrink {
                            round,
                            step: step + 1,
                        };
                        return Some(Candidate {
                            width: self.current.0,
                            height: self.current.1,
                            quality,
                        });
                    }
                    self.stage = Stage::Shrink {
                        round: round + 1,
                        step: 0,
                    };
                }
                Stage::LastResort => {
                    self.stage = Stage::Done;
                    let (width, height) = self.last_resort_size();
                    if (width, height) == self.fitted {
                        // Already tried at this quality in the initial sweep
                        return None;
                    }
                    return Some(Candidate {
                        width,
                        height,
                        quality: LAST_RESORT_QUALITY,
                    });
                }
                Stage::Done => return None,
            }
        }
    }
}
