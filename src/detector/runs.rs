//! Two-level (hysteresis) bright-run detection over 1-D sample sequences.
//!
//! A run opens on the first sample above `white_level` and closes on the first
//! sample below `black_level`. Samples between the two levels never change the
//! state. A dark sample arriving while the run is no longer than `min_run`
//! discards the tentative run instead of closing it.

use serde::Serialize;

/// Half-open index span `[start, end)` of one bright run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Run {
    pub start: usize,
    pub end: usize,
}

impl Run {
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Centre of the run, rounded towards its end.
    #[inline]
    pub fn midpoint(&self) -> usize {
        self.end - self.len() / 2
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Hysteresis {
    pub white_level: u8,
    pub black_level: u8,
    /// Runs must be strictly longer than this to close.
    pub min_run: usize,
}

impl Hysteresis {
    pub fn new(white_level: u8, black_level: u8, min_run: usize) -> Self {
        Self {
            white_level,
            black_level,
            min_run,
        }
    }

    /// Iterate the closed runs of `samples`; index 0 of `samples` is `origin`.
    ///
    /// A run already bright at the first sample has no known start and is
    /// never reported, nor is a run still open at the end of the sequence.
    pub fn runs<I>(&self, samples: I, origin: usize) -> RunIter<I::IntoIter>
    where
        I: IntoIterator<Item = u8>,
    {
        RunIter {
            samples: samples.into_iter(),
            params: *self,
            index: origin,
            state: State::Unknown,
        }
    }

    /// First bright/dark edge pair in `samples`, without run-length filtering.
    ///
    /// The scan starts dark: a leading bright sample opens the span at once.
    /// Returns `None` if no sample opens a span or the span never closes.
    pub fn first_span<I>(&self, samples: I, origin: usize) -> Option<Run>
    where
        I: IntoIterator<Item = u8>,
    {
        let mut start = None;
        for (i, v) in samples.into_iter().enumerate() {
            let idx = origin + i;
            match start {
                None if v > self.white_level => start = Some(idx),
                Some(s) if v < self.black_level => return Some(Run { start: s, end: idx }),
                _ => {}
            }
        }
        None
    }
}

#[derive(Clone, Copy, Debug)]
enum State {
    Unknown,
    Dark,
    /// Bright with a known start; `None` for a run that was bright from the
    /// first sample.
    Bright(Option<usize>),
}

pub struct RunIter<I> {
    samples: I,
    params: Hysteresis,
    index: usize,
    state: State,
}

impl<I: Iterator<Item = u8>> Iterator for RunIter<I> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let p = self.params;
        for v in self.samples.by_ref() {
            let idx = self.index;
            self.index += 1;
            match self.state {
                State::Unknown => {
                    self.state = if v > p.white_level {
                        State::Bright(None)
                    } else {
                        State::Dark
                    };
                }
                State::Dark => {
                    if v > p.white_level {
                        self.state = State::Bright(Some(idx));
                    }
                }
                State::Bright(start) => {
                    if v >= p.black_level {
                        continue;
                    }
                    self.state = State::Dark;
                    match start {
                        Some(s) if idx - s > p.min_run => {
                            return Some(Run { start: s, end: idx });
                        }
                        Some(s) => {
                            log::trace!("discarding {}-sample blip at {s}", idx - s);
                        }
                        None => {}
                    }
                }
            }
        }
        None
    }
}
