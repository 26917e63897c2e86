/// Tick-driven countdown timer
///
/// The consumer loop advances this once per tick; whole seconds elapse based
/// on the `now` it passes in, so the timer needs no thread or task of its
/// own. Starting a new timer replaces (cancels) the previous instance —
/// there is never more than one live countdown.
use std::time::{Duration, Instant};

use super::surface::PlaybackSurface;

const SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Counting down toward zero, ticking sound playing
    Counting,
    /// Reached zero; ended sound played, panel lingers before hiding
    Linger,
}

#[derive(Debug)]
pub struct CountdownTimer {
    remaining: u64,
    linger_remaining: u64,
    next_second: Instant,
    phase: Phase,
}

impl CountdownTimer {
    /// Start a countdown: shows the panel and starts the ticking sound.
    /// `seconds` must be greater than zero (the caller gates on this).
    pub fn start(
        seconds: u64,
        linger_secs: u64,
        now: Instant,
        surface: &mut dyn PlaybackSurface,
    ) -> Self {
        surface.show_timer(seconds);
        surface.play_timer_tick();

        Self {
            remaining: seconds,
            linger_remaining: linger_secs,
            next_second: now + SECOND,
            phase: Phase::Counting,
        }
    }

    /// Advance the countdown to `now`. Returns true when the timer has fully
    /// finished (linger elapsed, panel hidden) and should be dropped.
    pub fn tick(&mut self, now: Instant, surface: &mut dyn PlaybackSurface) -> bool {
        while now >= self.next_second {
            self.next_second += SECOND;

            match self.phase {
                Phase::Counting => {
                    self.remaining -= 1;
                    surface.update_timer(self.remaining);

                    if self.remaining == 0 {
                        surface.stop_timer_tick();
                        surface.play_timer_ended();
                        self.phase = Phase::Linger;

                        if self.linger_remaining == 0 {
                            surface.hide_timer();
                            return true;
                        }
                    }
                }
                Phase::Linger => {
                    self.linger_remaining -= 1;
                    if self.linger_remaining == 0 {
                        surface.hide_timer();
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Cancel the countdown: silences both timer sounds and hides the panel
    pub fn cancel(self, surface: &mut dyn PlaybackSurface) {
        surface.stop_timer_tick();
        surface.stop_timer_ended();
        surface.hide_timer();
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_counting(&self) -> bool {
        self.phase == Phase::Counting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::test_surface::RecordingSurface;

    #[test]
    fn test_countdown_sequence() {
        let mut surface = RecordingSurface::new();
        let t0 = Instant::now();
        let mut timer = CountdownTimer::start(3, 4, t0, &mut surface);

        assert_eq!(surface.timer_shown(), Some(3));
        assert_eq!(surface.play_timer_tick_count(), 1);

        // Nothing happens before the first whole second
        assert!(!timer.tick(t0 + Duration::from_millis(900), &mut surface));
        assert_eq!(timer.remaining(), 3);

        assert!(!timer.tick(t0 + Duration::from_secs(1), &mut surface));
        assert_eq!(timer.remaining(), 2);
        assert_eq!(surface.timer_updates(), vec![2]);

        assert!(!timer.tick(t0 + Duration::from_secs(3), &mut surface));
        assert_eq!(timer.remaining(), 0);
        assert_eq!(surface.timer_updates(), vec![2, 1, 0]);
        assert_eq!(surface.play_timer_ended_count(), 1);
        assert!(!timer.is_counting());

        // Panel lingers for 4 more seconds, then hides
        assert!(!timer.tick(t0 + Duration::from_secs(6), &mut surface));
        assert!(!surface.timer_hidden());
        assert!(timer.tick(t0 + Duration::from_secs(7), &mut surface));
        assert!(surface.timer_hidden());

        // Ended sound played exactly once in total
        assert_eq!(surface.play_timer_ended_count(), 1);
    }

    #[test]
    fn test_catches_up_over_missed_ticks() {
        let mut surface = RecordingSurface::new();
        let t0 = Instant::now();
        let mut timer = CountdownTimer::start(5, 1, t0, &mut surface);

        // One late tick covers several elapsed seconds
        assert!(!timer.tick(t0 + Duration::from_secs(4), &mut surface));
        assert_eq!(timer.remaining(), 1);
        assert_eq!(surface.timer_updates(), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_cancel_silences_sounds() {
        let mut surface = RecordingSurface::new();
        let t0 = Instant::now();
        let timer = CountdownTimer::start(10, 4, t0, &mut surface);

        timer.cancel(&mut surface);
        assert!(surface.timer_hidden());
        assert!(!surface.timer_tick_playing());
        assert_eq!(surface.play_timer_ended_count(), 0);
    }
}
