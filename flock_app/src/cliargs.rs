use clap_serde_derive::{
    clap::{self, Parser},
    serde::Serialize,
    ClapSerde,
};
use flock_lib::{
    math_helpers::deg_to_rad,
    options::{
        BehaviourFlags, BoidSettings, BorderSettings, RunOptions, SaveOptions, SettingsError,
        WorldSettings,
    },
    rectangle::Rectangle,
};

#[derive(Parser)]
#[derive(ClapSerde)]
#[command(version, about, long_about = None)]
/// Headless flocking simulation with idle search, exporting sampled boid states as CSV.
pub struct Args {
    /// Config file, TOML or YAML by extension
    #[arg(short, long = "config", default_value = "config.toml")]
    pub config_path: std::path::PathBuf,

    /// Rest of arguments
    #[command(flatten)]
    pub config: <Config as ClapSerde>::Opt,
}

#[derive(ClapSerde, Serialize)]
/// Programatic configuration
///
/// Uses defaults, which can be overwritten by specifying a filepath for the `-c` or `--config` arg option
pub struct Config {
    #[default(0)]
    #[arg(short = 'n', long)]
    /// number of boids, 0 derives it from the visible area
    pub no_boids: usize,

    #[default(600)]
    #[arg(short = 'i', long)]
    /// number of frames to simulate
    pub iterations: u64,

    #[default(60.)]
    #[arg(long)]
    /// simulated frames per second
    pub fps: f64,

    #[default(0)]
    #[arg(long)]
    pub seed: u64,

    #[default(4)]
    #[arg(short = 'r', long)]
    /// sample every n-th frame
    pub sample_rate: u64,

    #[default(true)]
    #[arg(short = 's', long)]
    pub save: bool,

    #[default(false)]
    #[arg(short = 't', long)]
    pub save_timestamp: bool,

    #[default("./".to_owned())]
    #[arg(long)]
    /// directory the CSV is written to
    pub save_path: String,

    #[default(1350)]
    #[arg(short = 'x', long)]
    pub init_width: u32,

    #[default(900)]
    #[arg(short = 'y', long)]
    pub init_height: u32,

    #[default(500.)]
    #[arg(long = "max_speed")]
    pub max_speed: f32,
    #[default(500.)]
    #[arg(long = "max_force")]
    pub max_force: f32,
    #[default(20.)]
    #[arg(long)]
    pub radius: f32,
    #[default(100.)]
    #[arg(long = "view_dist")]
    pub view_distance: f32,
    #[default(360.)]
    #[arg(long = "fov")]
    /// angle of view in degrees
    pub angle_of_view: f32,

    #[default(2.)]
    #[arg(long = "sep_coef")]
    pub separation_factor: f32,
    #[default(2.)]
    #[arg(long = "ali_coef")]
    pub alignment_factor: f32,
    #[default(1.)]
    #[arg(long = "coh_coef")]
    pub cohesion_factor: f32,

    #[default(40.)]
    #[arg(long = "sep_dist")]
    pub desired_separation_distance: f32,
    #[default(250.)]
    #[arg(long = "flock_speed")]
    pub desired_flock_speed: f32,
    #[default(15.)]
    #[arg(long = "reach")]
    pub search_target_reach_radius: f32,
    #[default(10.)]
    #[arg(long = "search_time")]
    /// seconds before an unreached search target is abandoned
    pub max_search_time: f32,

    #[default(1000.)]
    #[arg(long = "border_force")]
    pub borders_max_force: f32,
    #[default(150.)]
    #[arg(long = "border_dist")]
    pub borders_effect_distance: f32,

    #[default(true)]
    #[arg(long = "fov_on")]
    pub field_of_view_on: bool,
    #[default(true)]
    #[arg(long = "stalemate_on")]
    pub stalemate_breaking_on: bool,

    #[default(String::new())]
    #[arg(long)]
    /// JSON settings patch, e.g. '{"maxSpeed": 300}'
    pub patch: String,
    #[default(1)]
    #[arg(long = "patch_at")]
    /// frame the patch is applied before, counting from 1 (0 also means the first frame)
    pub patch_at: u64,
}

impl Config {
    /// Builds the run options, rejecting settings the world could not run with.
    pub fn run_options(&self) -> Result<RunOptions, SettingsError> {
        if !self.fps.is_finite() {
            return Err(SettingsError::NotFinite { key: "fps", value: self.fps as f32 });
        }
        if self.fps <= 0. {
            return Err(SettingsError::NotPositive { key: "fps", value: self.fps as f32 });
        }

        let visible_space =
            Rectangle::new(0., 0., self.init_width as f32, self.init_height as f32);
        let default_world = WorldSettings::default_for_area(visible_space.area());

        let world = WorldSettings {
            number_of_boids: match self.no_boids {
                0 => default_world.number_of_boids,
                n => n,
            },
            boids: BoidSettings {
                max_speed: self.max_speed,
                max_force: self.max_force,
                radius: self.radius,
                view_distance: self.view_distance,
                angle_of_view: deg_to_rad(self.angle_of_view),
                separation_factor: self.separation_factor,
                alignment_factor: self.alignment_factor,
                cohesion_factor: self.cohesion_factor,
                desired_separation_distance: self.desired_separation_distance,
                desired_flock_speed: self.desired_flock_speed,
                search_target_reach_radius: self.search_target_reach_radius,
                max_search_time: self.max_search_time,
                ..default_world.boids
            },
            borders: BorderSettings {
                max_force: self.borders_max_force,
                effect_distance: self.borders_effect_distance,
            },
            flags: BehaviourFlags {
                field_of_view: self.field_of_view_on,
                stalemate_breaking: self.stalemate_breaking_on,
                // nothing drives a pointer in a headless run
                pointer_avoidance: false,
            },
        };
        world.validate()?;

        Ok(RunOptions {
            visible_space,
            world,
            seed: self.seed,
            frame_interval: 1. / self.fps,
            sample_rate: self.sample_rate,
            save_options: SaveOptions {
                save_locations: self.save,
                save_locations_path: self.save_path.clone().into(),
                save_locations_timestamp: self.save_timestamp,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use clap_serde_derive::ClapSerde;
    use flock_lib::options::{SettingsError, WorldSettings};
    use rstest::rstest;

    use super::Config;

    fn from_toml(source: &str) -> Config {
        Config::from(toml::from_str::<<Config as ClapSerde>::Opt>(source).unwrap())
    }

    #[test]
    fn defaults_match_library_defaults() {
        let options = from_toml("").run_options().unwrap();
        let defaults = WorldSettings::default();

        assert_eq!(options.world.number_of_boids, defaults.number_of_boids);
        assert_eq!(options.world.borders, defaults.borders);
        assert!((options.world.boids.angle_of_view - defaults.boids.angle_of_view).abs() < 1e-5);
        assert_eq!(options.world.boids.max_speed, defaults.boids.max_speed);
        assert_eq!(options.world.boids.pointer_force_factor, defaults.boids.pointer_force_factor);
    }

    #[test]
    fn file_values_are_used() {
        let config = from_toml("no_boids = 12\nseed = 3\nangle_of_view = 180.0\nsave_path = \"out/\"");
        let options = config.run_options().unwrap();

        assert_eq!(options.world.number_of_boids, 12);
        assert_eq!(options.seed, 3);
        assert_eq!(options.save_options.save_locations_path, std::path::PathBuf::from("out/"));
    }

    #[rstest]
    #[case::negative_max_force("max_force = -5.0")]
    #[case::wide_angle_of_view("angle_of_view = 720.0")]
    #[case::negative_radius("radius = -3.0")]
    #[case::infinite_speed("max_speed = inf")]
    #[case::no_frames_per_second("fps = 0.0")]
    #[case::negative_frames_per_second("fps = -30.0")]
    fn invalid_values_are_rejected(#[case] source: &str) {
        assert!(from_toml(source).run_options().is_err());
    }

    #[test]
    fn first_invalid_value_is_reported() {
        let config = from_toml("max_force = -5.0\nangle_of_view = 720.0\nradius = -3.0\nno_boids = 4");

        assert!(matches!(
            config.run_options(),
            Err(SettingsError::NotPositive { key: "maxForce", .. })
        ));
        assert!(matches!(
            from_toml("angle_of_view = 720.0").run_options(),
            Err(SettingsError::AngleOfView(_))
        ));
    }

    #[test]
    fn yaml_config_parses() {
        let opt: <Config as ClapSerde>::Opt =
            serde_yaml::from_str("iterations: 30\nsample_rate: 2\n").unwrap();
        let config = Config::from(opt);

        assert_eq!(config.iterations, 30);
        assert_eq!(config.sample_rate, 2);
    }
}
