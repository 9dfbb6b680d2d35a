//! Temperature-profile engine
//!
//! A profile is an ordered list of ramp and hold steps that together
//! describe a target-temperature trajectory over time. The control
//! loop polls [`Profile::update`] once per iteration and tracks the
//! returned target with whatever actuation policy is installed.
//!
//! Step definitions are immutable once added; the mutable per-step
//! execution state (derived ramp slope, hold elapsed time) lives in
//! the profile and is rebuilt each time the cursor enters a step.

use heapless::Vec;

/// Maximum steps per profile
pub const MAX_STEPS: usize = 32;

/// How a ramp's slope is specified
///
/// Exactly one of the two quantities is authoritative; the other is
/// derived when the step starts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pace {
    /// Reach the target in a fixed time (seconds); slope derived at
    /// step start from the distance to travel.
    Duration(f32),
    /// Travel at a fixed slope (°C per second); time falls out of the
    /// distance to travel.
    Rate(f32),
}

/// One element of a temperature profile
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Ramp the target temperature to `target_c`
    Ramp { target_c: f32, pace: Pace },
    /// Hold the current target for `duration_s` seconds
    Hold { duration_s: f32 },
}

/// Execution state for the step the cursor is currently on
#[derive(Debug, Clone, Copy, PartialEq)]
enum StepState {
    Ramp {
        target_c: f32,
        /// Effective slope, sign forced to match the travel direction
        rate_c_per_s: f32,
    },
    Hold {
        duration_s: f32,
        elapsed_s: f32,
    },
}

/// Enter a step, deriving its execution state from the target the
/// previous step left behind.
///
/// For ramps the effective slope always points from `from_c` toward
/// the step's target, even when a caller-supplied rate has the wrong
/// sign for the required direction of travel.
fn begin_step(step: &Step, from_c: f32) -> StepState {
    match *step {
        Step::Ramp { target_c, pace } => {
            let raw = match pace {
                Pace::Duration(duration_s) => (target_c - from_c) / duration_s,
                Pace::Rate(rate) => rate,
            };
            let rate_c_per_s = if target_c - from_c < 0.0 {
                -raw.abs()
            } else {
                raw.abs()
            };
            StepState::Ramp {
                target_c,
                rate_c_per_s,
            }
        }
        Step::Hold { duration_s } => StepState::Hold {
            duration_s,
            elapsed_s: 0.0,
        },
    }
}

/// Advance a step by `dt_s` seconds from the current target.
///
/// Returns `(finished, new_target)`. A finishing ramp snaps exactly to
/// its configured target; intermediate values never overshoot it.
fn update_step(state: &mut StepState, dt_s: f32, current_c: f32) -> (bool, f32) {
    match state {
        StepState::Ramp {
            target_c,
            rate_c_per_s,
        } => {
            let next = current_c + *rate_c_per_s * dt_s;
            let reached = if *rate_c_per_s >= 0.0 {
                next >= *target_c
            } else {
                next <= *target_c
            };
            if reached {
                (true, *target_c)
            } else {
                (false, next)
            }
        }
        StepState::Hold {
            duration_s,
            elapsed_s,
        } => {
            *elapsed_s += dt_s;
            (*elapsed_s >= *duration_s, current_c)
        }
    }
}

/// A temperature profile and its execution cursor
#[derive(Debug, Clone, Default)]
pub struct Profile {
    steps: Vec<Step, MAX_STEPS>,
    /// Index of the step currently executing; past the end = finished
    cursor: usize,
    /// Target temperature produced by the last update
    target_c: f32,
    /// Monotonic timestamp of the last update (ms); `None` until armed
    last_update_ms: Option<u64>,
    /// Execution state of the step at `cursor`
    state: Option<StepState>,
}

impl Profile {
    /// Create an empty profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    ///
    /// Returns the step back if the profile is already at capacity.
    pub fn add_step(&mut self, step: Step) -> Result<(), Step> {
        self.steps.push(step)
    }

    /// Number of steps in the profile
    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    /// 1-based number of the step currently executing (for display)
    pub fn step_number(&self) -> usize {
        self.cursor + 1
    }

    /// Target temperature produced by the last update
    pub fn target_c(&self) -> f32 {
        self.target_c
    }

    /// True once the cursor has passed the last step
    pub fn finished(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// Arm the profile: reset the cursor and enter step 0 from
    /// `initial_temp_c` at monotonic time `now_ms`.
    pub fn begin(&mut self, initial_temp_c: f32, now_ms: u64) {
        self.cursor = 0;
        self.target_c = initial_temp_c;
        self.last_update_ms = Some(now_ms);
        self.state = self.steps.first().map(|s| begin_step(s, initial_temp_c));
    }

    /// Advance the trajectory to monotonic time `now_ms` and return
    /// the new target temperature.
    ///
    /// The elapsed time since the previous call drives the active
    /// step; when the step reports completion the cursor moves on and
    /// the next step is entered from the just-produced target.
    ///
    /// Calling this on a finished profile, or one that was never
    /// armed with [`Profile::begin`], is a no-op that returns the
    /// current target.
    pub fn update(&mut self, now_ms: u64) -> f32 {
        let Some(last_ms) = self.last_update_ms else {
            return self.target_c;
        };
        let Some(state) = self.state.as_mut() else {
            return self.target_c;
        };

        let dt_s = now_ms.saturating_sub(last_ms) as f32 / 1000.0;
        self.last_update_ms = Some(now_ms);

        let (finished, target_c) = update_step(state, dt_s, self.target_c);
        self.target_c = target_c;

        if finished {
            self.cursor += 1;
            self.state = self
                .steps
                .get(self.cursor)
                .map(|s| begin_step(s, self.target_c));
        }

        self.target_c
    }

    /// The `(elapsed_s, target_c)` vertices the step list implies,
    /// starting from `initial_temp_c`.
    ///
    /// Lazy and read-only: useful for previewing or plotting a profile
    /// without disturbing a run in progress.
    pub fn points(&self, initial_temp_c: f32) -> Points<'_> {
        Points {
            remaining: self.steps.iter(),
            time_s: 0.0,
            target_c: initial_temp_c,
            start_emitted: false,
        }
    }
}

/// Iterator over profile vertices, returned by [`Profile::points`]
#[derive(Debug, Clone)]
pub struct Points<'a> {
    remaining: core::slice::Iter<'a, Step>,
    time_s: f32,
    target_c: f32,
    start_emitted: bool,
}

impl Iterator for Points<'_> {
    type Item = (f32, f32);

    fn next(&mut self) -> Option<(f32, f32)> {
        if !self.start_emitted {
            self.start_emitted = true;
            return Some((0.0, self.target_c));
        }

        let step = self.remaining.next()?;
        match *step {
            Step::Ramp { target_c, pace } => {
                self.time_s += match pace {
                    Pace::Duration(duration_s) => duration_s,
                    Pace::Rate(rate) => (target_c - self.target_c).abs() / rate.abs(),
                };
                self.target_c = target_c;
            }
            Step::Hold { duration_s } => self.time_s += duration_s,
        }
        Some((self.time_s, self.target_c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp_over(target_c: f32, duration_s: f32) -> Step {
        Step::Ramp {
            target_c,
            pace: Pace::Duration(duration_s),
        }
    }

    fn ramp_at(target_c: f32, rate: f32) -> Step {
        Step::Ramp {
            target_c,
            pace: Pace::Rate(rate),
        }
    }

    fn rate_of(state: StepState) -> f32 {
        match state {
            StepState::Ramp { rate_c_per_s, .. } => rate_c_per_s,
            StepState::Hold { .. } => panic!("expected a ramp state"),
        }
    }

    #[test]
    fn test_ramp_rate_derived_from_duration() {
        // 25 -> 125 over 50 s = 2 °C/s
        let rate = rate_of(begin_step(&ramp_over(125.0, 50.0), 25.0));
        assert_eq!(rate, 2.0);

        // Downward travel derives a negative slope
        let rate = rate_of(begin_step(&ramp_over(25.0, 50.0), 125.0));
        assert_eq!(rate, -2.0);
    }

    #[test]
    fn test_ramp_rate_sign_corrected() {
        // Caller asked for +3 °C/s but the target is below the start
        let rate = rate_of(begin_step(&ramp_at(20.0, 3.0), 200.0));
        assert_eq!(rate, -3.0);

        // Caller asked for -3 °C/s but the target is above the start
        let rate = rate_of(begin_step(&ramp_at(200.0, -3.0), 20.0));
        assert_eq!(rate, 3.0);
    }

    #[test]
    fn test_ramp_snaps_to_target_without_overshoot() {
        let mut state = begin_step(&ramp_over(100.0, 10.0), 0.0);

        // 10 °C/s; after 9.5 s we are at 95, one more 1 s step would
        // land at 105 - the step must finish at exactly 100
        let (finished, t) = update_step(&mut state, 9.5, 0.0);
        assert!(!finished);
        assert_eq!(t, 95.0);

        let (finished, t) = update_step(&mut state, 1.0, t);
        assert!(finished);
        assert_eq!(t, 100.0);
    }

    #[test]
    fn test_descending_ramp_snaps_to_target() {
        let mut state = begin_step(&ramp_at(50.0, 10.0), 100.0);

        let (finished, t) = update_step(&mut state, 4.0, 100.0);
        assert!(!finished);
        assert_eq!(t, 60.0);

        let (finished, t) = update_step(&mut state, 4.0, t);
        assert!(finished);
        assert_eq!(t, 50.0);
    }

    #[test]
    fn test_hold_finishes_at_or_after_duration() {
        let mut state = begin_step(&Step::Hold { duration_s: 2.5 }, 80.0);

        let (finished, t) = update_step(&mut state, 1.0, 80.0);
        assert!(!finished);
        assert_eq!(t, 80.0);

        let (finished, _) = update_step(&mut state, 1.0, 80.0);
        assert!(!finished);

        // Third update crosses 2.5 s of accumulated time
        let (finished, t) = update_step(&mut state, 1.0, 80.0);
        assert!(finished);
        assert_eq!(t, 80.0);
    }

    #[test]
    fn test_profile_walks_steps_in_sequence() {
        let mut profile = Profile::new();
        profile.add_step(ramp_over(100.0, 10.0)).unwrap();
        profile.add_step(Step::Hold { duration_s: 5.0 }).unwrap();

        profile.begin(0.0, 0);
        assert_eq!(profile.step_number(), 1);
        assert!(!profile.finished());

        // Half way up the ramp
        assert_eq!(profile.update(5_000), 50.0);

        // Ramp completes and the hold is entered with the snapped target
        assert_eq!(profile.update(10_000), 100.0);
        assert_eq!(profile.step_number(), 2);

        // Hold keeps the target flat until its duration elapses
        assert_eq!(profile.update(12_000), 100.0);
        assert!(!profile.finished());
        assert_eq!(profile.update(15_000), 100.0);
        assert!(profile.finished());
    }

    #[test]
    fn test_update_after_finish_is_a_no_op() {
        let mut profile = Profile::new();
        profile.add_step(ramp_over(50.0, 5.0)).unwrap();

        profile.begin(0.0, 0);
        assert_eq!(profile.update(5_000), 50.0);
        assert!(profile.finished());

        // Terminal state: target stays pinned, nothing advances
        assert_eq!(profile.update(60_000), 50.0);
        assert_eq!(profile.update(120_000), 50.0);
        assert!(profile.finished());
    }

    #[test]
    fn test_update_before_begin_is_a_no_op() {
        let mut profile = Profile::new();
        profile.add_step(ramp_over(50.0, 5.0)).unwrap();

        assert_eq!(profile.update(1_000), 0.0);
        assert!(!profile.finished());
    }

    #[test]
    fn test_points_vertices() {
        let mut profile = Profile::new();
        profile.add_step(ramp_over(100.0, 10.0)).unwrap();
        profile.add_step(Step::Hold { duration_s: 5.0 }).unwrap();

        let points: std::vec::Vec<(f32, f32)> = profile.points(0.0).collect();
        assert_eq!(points, [(0.0, 0.0), (10.0, 100.0), (15.0, 100.0)]);
    }

    #[test]
    fn test_points_with_rate_paced_ramp() {
        let mut profile = Profile::new();
        // 150 °C away at 3 °C/s = 50 s, regardless of the rate's sign
        profile.add_step(ramp_at(175.0, -3.0)).unwrap();

        let points: std::vec::Vec<(f32, f32)> = profile.points(25.0).collect();
        assert_eq!(points, [(0.0, 25.0), (50.0, 175.0)]);
    }

    #[test]
    fn test_points_does_not_disturb_execution() {
        let mut profile = Profile::new();
        profile.add_step(ramp_over(100.0, 10.0)).unwrap();

        profile.begin(0.0, 0);
        profile.update(2_000);
        let _ = profile.points(0.0).count();
        assert_eq!(profile.update(4_000), 40.0);
    }

    #[test]
    fn test_empty_profile_is_immediately_finished() {
        let mut profile = Profile::new();
        profile.begin(20.0, 0);
        assert!(profile.finished());
        assert_eq!(profile.update(1_000), 20.0);
    }

    proptest! {
        /// The effective ramp slope always points from the initial
        /// target toward the step target, whichever way the step was
        /// specified.
        #[test]
        fn prop_ramp_rate_sign_matches_travel(
            target in -100.0f32..500.0,
            initial in -100.0f32..500.0,
            duration in 0.1f32..3600.0,
            rate in prop::num::f32::NORMAL.prop_map(|r| r % 50.0),
        ) {
            for step in [ramp_over(target, duration), ramp_at(target, rate)] {
                let derived = rate_of(begin_step(&step, initial));
                if target > initial {
                    prop_assert!(derived >= 0.0);
                } else if target < initial {
                    prop_assert!(derived <= 0.0);
                }
            }
        }

        /// A ramp never reports an intermediate value past its target,
        /// and the final value is exactly the target.
        #[test]
        fn prop_ramp_never_overshoots(
            target in -50.0f32..300.0,
            initial in -50.0f32..300.0,
            duration in 0.5f32..60.0,
            dt in 0.1f32..10.0,
        ) {
            prop_assume!((target - initial).abs() > 1.0);

            let mut state = begin_step(&ramp_over(target, duration), initial);
            let mut current = initial;
            let ascending = target >= initial;

            for _ in 0..1_000 {
                let (finished, next) = update_step(&mut state, dt, current);
                if ascending {
                    prop_assert!(next <= target);
                } else {
                    prop_assert!(next >= target);
                }
                current = next;
                if finished {
                    break;
                }
            }
            prop_assert_eq!(current, target);
        }
    }
}
