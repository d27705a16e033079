use std::thread;
use std::time::Duration;

use super::types::{Pacing, SimConfig};

/// One clock tick: iteration index and the simulated time it starts at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Iteration index, starting at 0.
    pub iteration: usize,
    /// Simulated time (s).
    pub time_s: f64,
}

/// A simulation clock that advances simulated time in fixed steps.
///
/// Time is computed as `iteration × step` rather than accumulated, so a
/// trigger at an exact multiple of the step fires on that iteration.
///
/// # Examples
///
/// ```
/// use mppt_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(0.5, 3);
/// let mut times = Vec::new();
///
/// clock.run(|tick| times.push(tick.time_s));
/// assert_eq!(times, vec![0.0, 0.5, 1.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Next iteration to hand out.
    current: usize,
    /// Total iterations in the run.
    total: usize,
    /// Simulated seconds per iteration.
    step_s: f64,
    pacer: Pacer,
}

impl Clock {
    /// Creates a logically paced clock.
    ///
    /// # Arguments
    ///
    /// * `step_s` - Simulated seconds per iteration
    /// * `total` - The total number of iterations the clock will run
    pub fn new(step_s: f64, total: usize) -> Self {
        Self {
            current: 0,
            total,
            step_s,
            pacer: Pacer::new(Pacing::Logical, step_s),
        }
    }

    /// Creates a clock matching the run configuration, pacing included.
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            current: 0,
            total: config.total_steps(),
            step_s: config.step_s,
            pacer: Pacer::new(config.pacing, config.step_s),
        }
    }

    /// Advances the clock by one iteration.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The iteration about to run and its simulated time
    /// * `None` - If the clock has reached its total
    pub fn tick(&mut self) -> Option<Tick> {
        if self.current < self.total {
            let tick = Tick {
                iteration: self.current,
                time_s: self.current as f64 * self.step_s,
            };
            self.current += 1;
            Some(tick)
        } else {
            None
        }
    }

    /// Waits out the remainder of the step when pacing on the wall clock.
    pub fn pace(&self) {
        self.pacer.wait();
    }

    /// Runs a function for each remaining tick, pacing between ticks.
    pub fn run(&mut self, mut f: impl FnMut(Tick)) {
        while let Some(tick) = self.tick() {
            f(tick);
            self.pace();
        }
    }

    /// Whether every iteration has been handed out.
    pub fn is_finished(&self) -> bool {
        self.current >= self.total
    }

    /// Iterations handed out so far.
    pub fn elapsed(&self) -> usize {
        self.current
    }

    /// Total iterations in the run.
    pub fn total(&self) -> usize {
        self.total
    }
}

/// Inter-iteration delay: nothing in logical mode, one step of real time
/// in wall-clock mode.
#[derive(Debug, Clone, Copy)]
struct Pacer {
    delay: Option<Duration>,
}

impl Pacer {
    fn new(pacing: Pacing, step_s: f64) -> Self {
        let delay = match pacing {
            Pacing::Logical => None,
            Pacing::WallClock => Duration::try_from_secs_f64(step_s).ok(),
        };
        Self { delay }
    }

    fn wait(&self) {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
    }
}
