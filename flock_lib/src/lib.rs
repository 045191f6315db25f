use birdwatcher::{Birdwatcher, BirdwatcherError, BoidData};
use options::RunOptions;
use simulation::Simulation;
use tracing::info;
use world::World;

pub mod boid;
pub mod borders;
pub mod flock;
pub mod pointer;
pub mod rectangle;
pub mod simulation;
pub mod world;

pub mod birdwatcher;
pub mod math_helpers;
pub mod options;

/// Runs `no_iter` frames of a world without any rendering, one frame every
/// `run_options.frame_interval` simulated seconds, and returns the collected
/// samples. They are also written to disk when the save options ask for it.
pub fn run_headless(
    no_iter: u64,
    run_options: &RunOptions,
) -> Result<Vec<BoidData>, BirdwatcherError> {
    run_headless_with(no_iter, run_options, |_, _| {})
}

/// Same as [`run_headless`], calling `before_frame` with the frame number
/// (starting at 1) and the world right before each frame is simulated.
pub fn run_headless_with<F>(
    no_iter: u64,
    run_options: &RunOptions,
    mut before_frame: F,
) -> Result<Vec<BoidData>, BirdwatcherError>
where
    F: FnMut(u64, &mut World),
{
    let world = World::new(
        run_options.visible_space,
        run_options.world,
        run_options.seed,
    );
    let mut simulation = Simulation::new(world);
    let mut bird_watcher = Birdwatcher::new(run_options.sample_rate);

    simulation.start(0.);
    (1..=no_iter).for_each(|frame| {
        before_frame(frame, simulation.world_mut());
        simulation.frame(frame as f64 * run_options.frame_interval);
        bird_watcher.watch(simulation.world().flock());
    });

    info!(
        ticks = simulation.ticks(),
        boids = simulation.world().boids().len(),
        "headless run finished"
    );

    bird_watcher.pop_data_save(&run_options.save_options)
}
