//! Front panel buttons and LEDs.

mod debounce;
mod sysfs;

pub use debounce::DebouncedButtons;
pub use sysfs::{Direction, GpioPin, Led, LedPin, PwmChannel, SysfsBoard};

use crate::{Error, Result};
use std::time::{Duration, Instant};

/// Trait for board front panels
///
/// Implementations only move bits; debouncing lives in [`DebouncedButtons`]
/// and works against any board.
pub trait Board {
    /// Number of button/LED lines
    fn line_count(&self) -> usize;

    /// Switch one LED on or off
    fn set_line(&mut self, index: usize, on: bool) -> Result<()>;

    /// Raw button samples, `true` meaning pressed, one per line
    fn read_raw(&mut self) -> Result<Vec<bool>>;

    /// Raw state of a single button
    fn is_pressed(&mut self, index: usize) -> Result<bool> {
        let count = self.line_count();
        self.read_raw()?
            .get(index)
            .copied()
            .ok_or(Error::LineOutOfRange { index, count })
    }
}

/// Light exactly one LED, or none
pub fn set_only_line<B: Board + ?Sized>(board: &mut B, index: Option<usize>) -> Result<()> {
    for i in 0..board.line_count() {
        board.set_line(i, false)?;
    }
    if let Some(index) = index {
        board.set_line(index, true)?;
    }
    Ok(())
}

/// Flash each LED in turn, `reps` times
pub fn wiggle_lines<B: Board + ?Sized>(board: &mut B, reps: usize, step: Duration) -> Result<()> {
    for _ in 0..reps {
        for i in 0..board.line_count() {
            board.set_line(i, true)?;
            std::thread::sleep(step);
            board.set_line(i, false)?;
        }
    }
    Ok(())
}

/// One polling cycle: read the buttons, debounce, mirror onto the LEDs
///
/// Returns the debounced states.
pub fn poll_and_mirror<B: Board + ?Sized>(
    board: &mut B,
    buttons: &mut DebouncedButtons,
    now: Instant,
) -> Result<Vec<bool>> {
    let raw = board.read_raw()?;
    let states = buttons.poll(&raw, now)?.to_vec();
    for (i, &on) in states.iter().enumerate() {
        board.set_line(i, on)?;
    }
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBoard {
        leds: Vec<bool>,
        buttons: Vec<bool>,
    }

    impl Board for FakeBoard {
        fn line_count(&self) -> usize {
            self.leds.len()
        }

        fn set_line(&mut self, index: usize, on: bool) -> Result<()> {
            let count = self.leds.len();
            let led = self
                .leds
                .get_mut(index)
                .ok_or(Error::LineOutOfRange { index, count })?;
            *led = on;
            Ok(())
        }

        fn read_raw(&mut self) -> Result<Vec<bool>> {
            Ok(self.buttons.clone())
        }
    }

    #[test]
    fn test_set_only_line() {
        let mut board = FakeBoard {
            leds: vec![true; 3],
            buttons: vec![false; 3],
        };
        set_only_line(&mut board, Some(1)).unwrap();
        assert_eq!(board.leds, vec![false, true, false]);
        set_only_line(&mut board, None).unwrap();
        assert_eq!(board.leds, vec![false; 3]);
        assert!(set_only_line(&mut board, Some(7)).is_err());
    }

    #[test]
    fn test_is_pressed() {
        let mut board = FakeBoard {
            leds: vec![false; 2],
            buttons: vec![false, true],
        };
        assert!(!board.is_pressed(0).unwrap());
        assert!(board.is_pressed(1).unwrap());
        assert!(board.is_pressed(2).is_err());
    }

    #[test]
    fn test_wiggle_leaves_leds_off() {
        let mut board = FakeBoard {
            leds: vec![true; 2],
            buttons: vec![false; 2],
        };
        wiggle_lines(&mut board, 1, Duration::ZERO).unwrap();
        assert_eq!(board.leds, vec![false, false]);
    }

    #[test]
    fn test_poll_and_mirror_pulses_led() {
        let t0 = Instant::now();
        let mut board = FakeBoard {
            leds: vec![false; 2],
            buttons: vec![false, false],
        };
        let mut buttons = DebouncedButtons::new(2, Duration::from_millis(50), t0);
        poll_and_mirror(&mut board, &mut buttons, t0).unwrap();

        board.buttons = vec![false, true];
        poll_and_mirror(&mut board, &mut buttons, t0 + Duration::from_millis(60)).unwrap();
        assert_eq!(board.leds, vec![false, true]);

        poll_and_mirror(&mut board, &mut buttons, t0 + Duration::from_millis(70)).unwrap();
        assert_eq!(board.leds, vec![false, false]);
    }
}
