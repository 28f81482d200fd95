use std::time::Duration;

/// Fixed-timestep accumulator.
///
/// Real frame time goes in; a tick comes out whenever a whole timestep has accumulated. The
/// remainder is carried over to the next frame instead of being dropped, so the simulation does
/// not drift against wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationClock {
    timestep: Duration,
    accumulated: Duration,
    elapsed: Duration,
}

impl SimulationClock {
    pub fn new(timestep: Duration) -> Self {
        Self {
            timestep,
            accumulated: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Adds `dt` of real time. Returns `true` if a tick is due, in which case one timestep is
    /// consumed from the accumulator.
    ///
    /// At most one tick is reported per call; a backlog drains over the following calls.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed += dt;
        self.accumulated += dt;

        if self.accumulated >= self.timestep {
            self.accumulated -= self.timestep;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn timestep(&self) -> Duration {
        self.timestep
    }

    /// Time not yet consumed by a tick.
    #[inline]
    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Total real time fed into the clock since it was created or last reset.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.elapsed = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_once_per_timestep() {
        let mut clock = SimulationClock::new(Duration::from_millis(50));

        assert!(!clock.advance(Duration::from_millis(20)));
        assert!(!clock.advance(Duration::from_millis(20)));
        assert!(clock.advance(Duration::from_millis(20)));
        assert_eq!(clock.accumulated(), Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(60));
    }

    #[test]
    fn keeps_remainder_across_ticks() {
        let mut clock = SimulationClock::new(Duration::from_millis(50));
        let frame = Duration::from_micros(16_667);

        let ticks = (0..60).filter(|_| clock.advance(frame)).count();

        // 60 frames of ~16.7ms is ~1s, i.e. 20 ticks, with nothing lost to rounding.
        assert_eq!(ticks, 20);
        assert!(clock.accumulated() < clock.timestep());
    }

    #[test]
    fn backlog_drains_one_tick_per_call() {
        let mut clock = SimulationClock::new(Duration::from_millis(50));

        assert!(clock.advance(Duration::from_millis(120)));
        assert!(clock.advance(Duration::ZERO));
        assert!(!clock.advance(Duration::ZERO));
        assert_eq!(clock.accumulated(), Duration::from_millis(20));
    }

    #[test]
    fn reset_clears_time() {
        let mut clock = SimulationClock::new(Duration::from_millis(50));
        clock.advance(Duration::from_millis(70));
        clock.reset();

        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert_eq!(clock.accumulated(), Duration::ZERO);
    }
}
