//! One-second countdowns driven by the coarse session clock.

/// Countdown in whole seconds.
///
/// A stopped countdown never fires. Pausing keeps the remaining time so
/// `resume` continues where it left off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    running: bool,
    paused: bool,
}

impl Countdown {
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.running = true;
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        if self.running {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.running && self.paused
    }

    /// Counts down one second. Returns true on the tick that reaches zero;
    /// the countdown stops itself at that point.
    pub fn tick(&mut self) -> bool {
        if !self.running || self.paused {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_at_zero() {
        let mut timer = Countdown::default();
        timer.start(3);
        assert!(!timer.tick());
        assert!(!timer.tick());
        assert!(timer.tick());
        assert!(!timer.is_running());
        assert!(!timer.tick());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut timer = Countdown::default();
        timer.start(2);
        timer.pause();
        assert!(timer.is_paused());
        for _ in 0..10 {
            assert!(!timer.tick());
        }
        assert_eq!(timer.remaining(), 2);
        timer.resume();
        timer.tick();
        assert!(timer.tick());
    }

    #[test]
    fn test_stopped_never_fires() {
        let mut timer = Countdown::default();
        timer.start(1);
        timer.stop();
        assert!(!timer.tick());
        // pausing a stopped timer does nothing
        timer.pause();
        assert!(!timer.is_paused());
    }
}
