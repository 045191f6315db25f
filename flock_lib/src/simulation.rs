use tracing::warn;

use crate::world::World;

/// Longest step the world is ever advanced by, in seconds. Longer frames
/// (a stalled or backgrounded host) are slowed down instead of skipped.
pub const MAX_DT: f32 = 1. / 15.;

/// Clamps a frame's elapsed time to [`MAX_DT`].
pub fn clamp_dt(elapsed: f32) -> f32 {
    elapsed.min(MAX_DT)
}

/// Frame driven clock around a [`World`].
///
/// Timestamps are seconds on any monotonic clock.
pub struct Simulation {
    world: World,
    last_time: Option<f64>,
    ticks: u64,
}

impl Simulation {
    pub fn new(world: World) -> Self {
        Simulation {
            world,
            last_time: None,
            ticks: 0,
        }
    }

    pub fn start(&mut self, now: f64) {
        self.last_time = Some(now);
    }

    pub fn stop(&mut self) {
        self.last_time = None;
    }

    pub fn is_running(&self) -> bool {
        self.last_time.is_some()
    }

    /// Ticks the world for the time elapsed since the previous frame and
    /// returns the step used. Nothing happens while stopped or when the clock
    /// did not advance.
    pub fn frame(&mut self, now: f64) -> Option<f32> {
        let last_time = self.last_time?;

        let elapsed = (now - last_time) as f32;
        if elapsed <= 0. {
            return None;
        }
        self.last_time = Some(now);

        let dt = clamp_dt(elapsed);
        if dt < elapsed {
            warn!(elapsed, dt, "frame took too long, step clamped");
        }

        self.world.update(dt);
        self.ticks += 1;

        Some(dt)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access for input and settings changes between frames.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::{clamp_dt, Simulation, MAX_DT};
    use crate::{options::WorldSettings, rectangle::Rectangle, world::World};

    macro_rules! assert_eqf32 {
        ($x:expr, $y:expr) => {
            assert_relative_eq!($x, $y, epsilon = 1e-6_f32)
        };
    }

    fn simulation() -> Simulation {
        let settings = WorldSettings {
            number_of_boids: 10,
            ..Default::default()
        };
        Simulation::new(World::new(Rectangle::new(0., 0., 800., 600.), settings, 0))
    }

    #[rstest]
    #[case(0.01, 0.01)]
    #[case(1. / 15., 1. / 15.)]
    #[case(0.5, 1. / 15.)]
    #[case(30., 1. / 15.)]
    fn dt_is_clamped(#[case] elapsed: f32, #[case] expected: f32) {
        assert_eqf32!(clamp_dt(elapsed), expected);
    }

    #[test]
    fn stopped_simulation_does_not_tick() {
        let mut sim = simulation();
        assert!(!sim.is_running());
        assert_eq!(sim.frame(1.), None);

        sim.start(1.);
        sim.stop();
        assert_eq!(sim.frame(2.), None);
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn frames_tick_with_elapsed_time() {
        let mut sim = simulation();
        sim.start(10.);

        let dt = sim.frame(10.02).unwrap();
        assert_eqf32!(dt, 0.02);

        // a stall is slowed down, not skipped
        let dt = sim.frame(12.).unwrap();
        assert_eqf32!(dt, MAX_DT);

        assert_eq!(sim.ticks(), 2);
    }

    #[test]
    fn clock_going_nowhere_is_ignored() {
        let mut sim = simulation();
        sim.start(5.);

        assert_eq!(sim.frame(5.), None);
        assert_eq!(sim.frame(4.), None);
        assert_eq!(sim.ticks(), 0);
        assert!(sim.frame(5.01).is_some());
    }

    #[test]
    fn restart_does_not_replay_the_pause() {
        let mut sim = simulation();
        sim.start(0.);
        sim.frame(0.016);
        sim.stop();

        sim.start(100.);
        let dt = sim.frame(100.016).unwrap();
        assert_eqf32!(dt, 0.016);
    }
}
