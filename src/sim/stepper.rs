//! Fixed timestep physics stepping
//!
//! Wall-clock time is banked in an accumulator and spent in whole
//! `STEP_TIME` slices. The world never sees a variable delta.

use crate::consts::{MAX_FRAME_TIME, POSITION_ITERATIONS, STEP_TIME, VELOCITY_ITERATIONS};

/// A world that can be integrated by one fixed step
pub trait PhysicsWorld {
    fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32);
}

/// Accumulator-driven stepper
#[derive(Debug, Clone, Default)]
pub struct PhysicsStepper {
    accumulator: f64,
    total_steps: u64,
}

impl PhysicsStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank `elapsed` (capped at `MAX_FRAME_TIME`) and run every whole step
    /// it pays for. Returns the number of steps taken.
    pub fn advance<W: PhysicsWorld + ?Sized>(&mut self, elapsed: f64, world: &mut W) -> u32 {
        // NaN and negative deltas bank nothing
        let elapsed = if elapsed.is_nan() {
            0.0
        } else {
            elapsed.clamp(0.0, MAX_FRAME_TIME)
        };
        self.accumulator += elapsed;

        let mut steps = 0;
        while self.accumulator >= STEP_TIME {
            self.accumulator -= STEP_TIME;
            world.step(STEP_TIME as f32, VELOCITY_ITERATIONS, POSITION_ITERATIONS);
            steps += 1;
        }
        self.total_steps += u64::from(steps);
        steps
    }

    /// Unconsumed simulated time, always in `[0, STEP_TIME)` between calls
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Steps taken since construction
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Drop banked time (restart/restore)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct CountingWorld {
        steps: Vec<(f32, u32, u32)>,
    }

    impl PhysicsWorld for CountingWorld {
        fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
            self.steps.push((dt, velocity_iterations, position_iterations));
        }
    }

    #[test]
    fn test_small_delta_banks_without_stepping() {
        let mut stepper = PhysicsStepper::new();
        let mut world = CountingWorld::default();

        assert_eq!(stepper.advance(STEP_TIME / 2.0, &mut world), 0);
        assert!(world.steps.is_empty());
        assert!((stepper.accumulator() - STEP_TIME / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_steps_use_fixed_constants() {
        let mut stepper = PhysicsStepper::new();
        let mut world = CountingWorld::default();

        stepper.advance(0.1, &mut world);
        assert!(!world.steps.is_empty());
        for &(dt, vel, pos) in &world.steps {
            assert_eq!(dt, STEP_TIME as f32);
            assert_eq!(vel, 6);
            assert_eq!(pos, 2);
        }
    }

    #[test]
    fn test_hitch_is_capped() {
        let mut stepper = PhysicsStepper::new();
        let mut world = CountingWorld::default();

        // A five second stall only pays for a quarter second of physics
        let steps = stepper.advance(5.0, &mut world);
        let mut reference = PhysicsStepper::new();
        let capped = reference.advance(MAX_FRAME_TIME, &mut CountingWorld::default());
        assert_eq!(steps, capped);
        assert!(steps <= 15);
        assert!(stepper.accumulator() < STEP_TIME);
    }

    #[test]
    fn test_negative_and_nan_deltas_ignored() {
        let mut stepper = PhysicsStepper::new();
        let mut world = CountingWorld::default();

        assert_eq!(stepper.advance(-1.0, &mut world), 0);
        assert_eq!(stepper.advance(f64::NAN, &mut world), 0);
        assert_eq!(stepper.accumulator(), 0.0);
    }

    #[test]
    fn test_reset_drops_banked_time() {
        let mut stepper = PhysicsStepper::new();
        let mut world = CountingWorld::default();

        stepper.advance(0.01, &mut world);
        stepper.reset();
        assert_eq!(stepper.accumulator(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_accumulator_bounded_and_steps_counted(
            deltas in proptest::collection::vec(0.0f64..0.5, 1..64)
        ) {
            let mut stepper = PhysicsStepper::new();
            let mut world = CountingWorld::default();

            for dt in deltas {
                let before = stepper.accumulator();
                let total = before + dt.min(MAX_FRAME_TIME);
                let steps = stepper.advance(dt, &mut world);

                prop_assert!(stepper.accumulator() >= 0.0);
                prop_assert!(stepper.accumulator() < STEP_TIME);

                // Exactly on a step boundary rounding may land either side
                let ratio = total / STEP_TIME;
                if (ratio - ratio.round()).abs() > 1e-9 {
                    prop_assert_eq!(steps as f64, ratio.floor());
                }
            }
            prop_assert_eq!(world.steps.len() as u64, stepper.total_steps());
        }
    }
}
