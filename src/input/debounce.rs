use crate::config::DebounceConfig;
use crate::{Error, Result};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// Raw input low
    Released,
    /// Raw input high, interval not yet elapsed since release
    Armed,
    /// Reported pressed on this poll
    Fired,
    /// Still held after firing; reported released until the next release
    Held,
}

/// One physical input line
#[derive(Debug, Clone, Copy)]
struct ButtonLine {
    state: LineState,
    /// Last poll that saw the raw input low (or construction time)
    last_change: Instant,
}

impl ButtonLine {
    fn new(now: Instant) -> Self {
        Self {
            state: LineState::Released,
            last_change: now,
        }
    }

    fn step(&mut self, raw: bool, now: Instant, interval: Duration) -> bool {
        if !raw {
            self.state = LineState::Released;
            self.last_change = now;
            return false;
        }

        self.state = match self.state {
            LineState::Fired | LineState::Held => LineState::Held,
            LineState::Released | LineState::Armed => {
                if now.saturating_duration_since(self.last_change) > interval {
                    LineState::Fired
                } else {
                    LineState::Armed
                }
            }
        };
        self.state == LineState::Fired
    }
}

/// Turns noisy raw button samples into single-shot press events
///
/// A line reports `true` for exactly one poll once its raw input has been
/// high for longer than the debounce interval since it was last seen low.
/// It then reports `false` for as long as the button stays down; releasing
/// and pressing again restarts the countdown.
#[derive(Debug, Clone)]
pub struct DebouncedButtons {
    interval: Duration,
    lines: Vec<ButtonLine>,
    stable: Vec<bool>,
}

impl DebouncedButtons {
    pub fn new(lines: usize, interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            lines: vec![ButtonLine::new(now); lines],
            stable: vec![false; lines],
        }
    }

    pub fn from_config(config: &DebounceConfig, now: Instant) -> Self {
        Self::new(config.lines, config.interval, now)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Debounced states from the last poll
    pub fn states(&self) -> &[bool] {
        &self.stable
    }

    /// Feed one raw sample per line, taken at `now`
    pub fn poll(&mut self, raw: &[bool], now: Instant) -> Result<&[bool]> {
        if raw.len() != self.lines.len() {
            return Err(Error::LineCountMismatch {
                expected: self.lines.len(),
                actual: raw.len(),
            });
        }

        for ((line, stable), &sample) in self.lines.iter_mut().zip(&mut self.stable).zip(raw) {
            *stable = line.step(sample, now, self.interval);
        }

        Ok(&self.stable)
    }
}
