mod cliargs;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap_serde_derive::{clap::Parser, ClapSerde};
use flock_lib::{
    options::{RunOptions, SettingsPatch},
    run_headless_with,
    world::World,
};
use tracing::{debug, info, warn};

use cliargs::{Args, Config};

fn main() -> Result<()> {
    init_tracing();

    // Parse whole args with clap
    let mut args = Args::parse();
    let config = load_config(&mut args)?;

    let run_options = config.run_options().context("invalid configuration")?;
    let patch = match config.patch.trim() {
        "" => None,
        json => Some(
            SettingsPatch::from_json(json)
                .context("invalid --patch")?
                .with_coupled_defaults(),
        ),
    };

    info!(
        boids = run_options.world.number_of_boids,
        iterations = config.iterations,
        seed = run_options.seed,
        "starting headless flock"
    );

    let patch = patch.map(|patch| ScheduledPatch::new(config.patch_at, patch));
    if let Some(scheduled) = patch.as_ref().filter(|p| p.frame() > config.iterations) {
        warn!(
            patch_at = scheduled.frame(),
            iterations = config.iterations,
            "patch is scheduled after the last frame and will not be applied"
        );
    }

    run(config.iterations, &run_options, patch.as_ref())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Merges the config file, when there is one, under the command line arguments.
fn load_config(args: &mut Args) -> Result<Config> {
    let path = args.config_path.clone();
    if !path.exists() {
        // If there is no config file return only config parsed from clap
        return Ok(Config::from(&mut args.config));
    }

    let source = fs::read_to_string(&path)
        .with_context(|| format!("can't read config file {}", path.display()))?;
    let file_config = parse_config(&path, &source)
        .with_context(|| format!("error in configuration file {}", path.display()))?;

    Ok(Config::from(file_config).merge(&mut args.config))
}

fn parse_config(path: &Path, source: &str) -> Result<<Config as ClapSerde>::Opt> {
    let is_yaml = path
        .extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml");

    Ok(if is_yaml {
        serde_yaml::from_str(source)?
    } else {
        toml::from_str(source)?
    })
}

/// A settings patch applied once, right before its frame is simulated.
struct ScheduledPatch {
    at: u64,
    patch: SettingsPatch,
}

impl ScheduledPatch {
    /// Frames count from 1, `at == 0` is due on the first frame.
    fn new(at: u64, patch: SettingsPatch) -> Self {
        ScheduledPatch { at: at.max(1), patch }
    }

    fn frame(&self) -> u64 {
        self.at
    }

    /// Applies the patch when `frame` is its frame. Returns whether it was applied.
    fn apply_if_due(&self, frame: u64, world: &mut World) -> bool {
        if frame != self.at {
            return false;
        }

        match world.change_settings(&self.patch) {
            Ok(()) => {
                info!(frame, "settings patch applied");
                true
            }
            Err(err) => {
                warn!(%err, frame, "settings patch rejected");
                false
            }
        }
    }
}

fn run(iterations: u64, run_options: &RunOptions, patch: Option<&ScheduledPatch>) -> Result<()> {
    let progress_every = (iterations / 10).max(1);

    let data = run_headless_with(iterations, run_options, |frame, world| {
        if let Some(patch) = patch {
            patch.apply_if_due(frame, world);
        }

        if frame % progress_every == 0 {
            let searching = world.boids().iter().filter(|b| b.is_searching()).count();
            debug!(frame, searching, "progress");
        }
    })
    .context("can't save flock data")?;

    info!(samples = data.len(), "run finished");

    Ok(())
}

#[cfg(test)]
mod tests {
    use flock_lib::{
        options::{SettingsPatch, WorldSettings},
        rectangle::Rectangle,
        world::World,
    };
    use rstest::rstest;

    use super::ScheduledPatch;

    fn world() -> World {
        World::new(
            Rectangle::new(0., 0., 800., 600.),
            WorldSettings::default_for_area(800. * 600.),
            0,
        )
    }

    fn resize_to(number_of_boids: usize) -> SettingsPatch {
        SettingsPatch {
            number_of_boids: Some(number_of_boids),
            ..Default::default()
        }
    }

    #[rstest]
    #[case::zero_is_the_first_frame(0, 1)]
    #[case::first_frame(1, 1)]
    #[case::later_frame(40, 40)]
    fn patch_is_applied_on_its_frame(#[case] at: u64, #[case] due: u64) {
        let scheduled = ScheduledPatch::new(at, resize_to(3));
        let mut world = world();

        for frame in 1..due {
            assert!(!scheduled.apply_if_due(frame, &mut world));
        }
        assert_eq!(world.boids().len(), 75);

        assert!(scheduled.apply_if_due(due, &mut world));
        assert_eq!(world.boids().len(), 3);
        assert!(!scheduled.apply_if_due(due + 1, &mut world));
    }

    #[test]
    fn rejected_patch_leaves_world_untouched() {
        let patch = SettingsPatch {
            number_of_boids: Some(3),
            max_force: Some(-1.),
            ..Default::default()
        };
        let scheduled = ScheduledPatch::new(0, patch);
        let mut world = world();

        assert!(!scheduled.apply_if_due(1, &mut world));
        assert_eq!(world.boids().len(), 75);
        assert_eq!(world.settings(), WorldSettings::default_for_area(800. * 600.));
    }
}
