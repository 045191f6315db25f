use std::{f32::consts::PI, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rectangle::Rectangle;

/// Side length of the square of visible space reserved for one boid when the
/// population is derived from the visible area.
pub const AREA_PER_BOID_SIDE: f32 = 80.;
pub const MAX_DEFAULT_BOIDS: usize = 500;

/// Per boid tuning, shared by the whole flock and tunable between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoidSettings {
    /// units per second
    pub max_speed: f32,
    /// cap on the self applied force, units per second squared
    pub max_force: f32,
    pub radius: f32,
    /// how far past its own radius a boid perceives others
    pub view_distance: f32,
    /// full view cone in radians, [0, 2π]
    pub angle_of_view: f32,

    pub separation_factor: f32,
    pub alignment_factor: f32,
    pub cohesion_factor: f32,

    pub desired_separation_distance: f32,
    pub desired_flock_speed: f32,

    pub search_target_reach_radius: f32,
    /// seconds
    pub max_search_time: f32,

    pub pointer_force_factor: f32,
}

impl Default for BoidSettings {
    fn default() -> Self {
        let max_speed = 500.;
        let max_force = 1. * max_speed;
        let radius = 20.;

        BoidSettings {
            max_speed,
            max_force,
            radius,
            view_distance: 100.,
            angle_of_view: 2. * PI,
            separation_factor: 2.,
            alignment_factor: 2.,
            cohesion_factor: 1.,
            desired_separation_distance: 2. * radius,
            desired_flock_speed: max_speed / 2.,
            search_target_reach_radius: 15.,
            max_search_time: 10.,
            pointer_force_factor: 1_000_000.,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderSettings {
    pub max_force: f32,
    pub effect_distance: f32,
}

impl Default for BorderSettings {
    fn default() -> Self {
        BorderSettings {
            max_force: 2. * BoidSettings::default().max_force,
            effect_distance: 150.,
        }
    }
}

/// Optional behaviours layered on top of plain flocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviourFlags {
    /// restrict perception to the view cone instead of a full circle
    pub field_of_view: bool,
    /// perturb symmetric head-on standoffs between two boids
    pub stalemate_breaking: bool,
    /// flee from a pressed pointer
    pub pointer_avoidance: bool,
}

impl Default for BehaviourFlags {
    fn default() -> Self {
        BehaviourFlags {
            field_of_view: true,
            stalemate_breaking: true,
            pointer_avoidance: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSettings {
    pub number_of_boids: usize,
    pub boids: BoidSettings,
    pub borders: BorderSettings,
    pub flags: BehaviourFlags,
}

impl WorldSettings {
    /// Default tuning with a population proportional to the visible area,
    /// capped at [`MAX_DEFAULT_BOIDS`].
    pub fn default_for_area(area: f32) -> Self {
        let number_of_boids =
            ((area.max(0.) / AREA_PER_BOID_SIDE.powi(2)).round() as usize).min(MAX_DEFAULT_BOIDS);

        WorldSettings {
            number_of_boids,
            boids: Default::default(),
            borders: Default::default(),
            flags: Default::default(),
        }
    }

    /// Checks every value against the same rules as a [`SettingsPatch`].
    pub fn validate(&self) -> Result<(), SettingsError> {
        SettingsPatch::from(self).validate()
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings::default_for_area(1350. * 900.)
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings patch could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{key} must be a finite number, got {value}")]
    NotFinite { key: &'static str, value: f32 },
    #[error("{key} must be positive, got {value}")]
    NotPositive { key: &'static str, value: f32 },
    #[error("{key} must not be negative, got {value}")]
    Negative { key: &'static str, value: f32 },
    #[error("angleOfView must be within [0, 2π], got {0}")]
    AngleOfView(f32),
}

/// A partial settings change. Every recognised key is optional, unknown keys
/// are rejected when parsing.
///
/// ```json
/// {"maxSpeed": 300, "bordersEffectDistance": 80, "fieldOfViewOn": false}
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    pub number_of_boids: Option<usize>,

    pub max_speed: Option<f32>,
    pub max_force: Option<f32>,
    pub radius: Option<f32>,
    pub view_distance: Option<f32>,
    pub angle_of_view: Option<f32>,
    pub separation_factor: Option<f32>,
    pub alignment_factor: Option<f32>,
    pub cohesion_factor: Option<f32>,
    pub desired_separation_distance: Option<f32>,
    pub desired_flock_speed: Option<f32>,
    pub search_target_reach_radius: Option<f32>,
    pub max_search_time: Option<f32>,
    pub pointer_force_factor: Option<f32>,

    pub borders_max_force: Option<f32>,
    pub borders_effect_distance: Option<f32>,

    pub field_of_view_on: Option<bool>,
    pub stalemate_breaking_on: Option<bool>,
    pub pointer_avoidance_on: Option<bool>,
}

impl SettingsPatch {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }

    /// Fills in the settings that are tuned together with the ones present in
    /// the patch, unless the patch sets them explicitly:
    ///
    /// - radius drives the desired separation distance (2 radii)
    /// - max speed drives max force (1:1), desired flock speed (1/2) and
    ///   border force (2 × max force)
    /// - max force drives border force (2 × max force)
    pub fn with_coupled_defaults(mut self) -> Self {
        if let Some(radius) = self.radius {
            self.desired_separation_distance
                .get_or_insert(2. * radius);
        }

        if let Some(max_speed) = self.max_speed {
            self.max_force.get_or_insert(max_speed);
            self.desired_flock_speed.get_or_insert(max_speed / 2.);
        }

        if let Some(max_force) = self.max_force {
            self.borders_max_force.get_or_insert(2. * max_force);
        }

        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        positive("maxForce", self.max_force)?;

        non_negative("maxSpeed", self.max_speed)?;
        non_negative("radius", self.radius)?;
        non_negative("viewDistance", self.view_distance)?;
        non_negative("desiredSeparationDistance", self.desired_separation_distance)?;
        non_negative("desiredFlockSpeed", self.desired_flock_speed)?;
        non_negative("searchTargetReachRadius", self.search_target_reach_radius)?;
        non_negative("maxSearchTime", self.max_search_time)?;
        non_negative("bordersMaxForce", self.borders_max_force)?;
        non_negative("bordersEffectDistance", self.borders_effect_distance)?;

        finite("separationFactor", self.separation_factor)?;
        finite("alignmentFactor", self.alignment_factor)?;
        finite("cohesionFactor", self.cohesion_factor)?;
        finite("pointerForceFactor", self.pointer_force_factor)?;

        if let Some(angle) = self.angle_of_view {
            if !angle.is_finite() || !(0. ..=2. * PI).contains(&angle) {
                return Err(SettingsError::AngleOfView(angle));
            }
        }

        Ok(())
    }

    pub fn apply_to_boids(&self, boids: &mut BoidSettings) {
        let BoidSettings {
            max_speed,
            max_force,
            radius,
            view_distance,
            angle_of_view,
            separation_factor,
            alignment_factor,
            cohesion_factor,
            desired_separation_distance,
            desired_flock_speed,
            search_target_reach_radius,
            max_search_time,
            pointer_force_factor,
        } = boids;

        overwrite(max_speed, self.max_speed);
        overwrite(max_force, self.max_force);
        overwrite(radius, self.radius);
        overwrite(view_distance, self.view_distance);
        overwrite(angle_of_view, self.angle_of_view);
        overwrite(separation_factor, self.separation_factor);
        overwrite(alignment_factor, self.alignment_factor);
        overwrite(cohesion_factor, self.cohesion_factor);
        overwrite(desired_separation_distance, self.desired_separation_distance);
        overwrite(desired_flock_speed, self.desired_flock_speed);
        overwrite(search_target_reach_radius, self.search_target_reach_radius);
        overwrite(max_search_time, self.max_search_time);
        overwrite(pointer_force_factor, self.pointer_force_factor);
    }

    pub fn apply_to_borders(&self, borders: &mut BorderSettings) {
        overwrite(&mut borders.max_force, self.borders_max_force);
        overwrite(&mut borders.effect_distance, self.borders_effect_distance);
    }

    pub fn apply_to_flags(&self, flags: &mut BehaviourFlags) {
        overwrite(&mut flags.field_of_view, self.field_of_view_on);
        overwrite(&mut flags.stalemate_breaking, self.stalemate_breaking_on);
        overwrite(&mut flags.pointer_avoidance, self.pointer_avoidance_on);
    }
}

impl From<&WorldSettings> for SettingsPatch {
    /// A patch setting every key to the value in `settings`.
    fn from(settings: &WorldSettings) -> Self {
        let WorldSettings {
            number_of_boids,
            boids,
            borders,
            flags,
        } = *settings;

        SettingsPatch {
            number_of_boids: Some(number_of_boids),
            max_speed: Some(boids.max_speed),
            max_force: Some(boids.max_force),
            radius: Some(boids.radius),
            view_distance: Some(boids.view_distance),
            angle_of_view: Some(boids.angle_of_view),
            separation_factor: Some(boids.separation_factor),
            alignment_factor: Some(boids.alignment_factor),
            cohesion_factor: Some(boids.cohesion_factor),
            desired_separation_distance: Some(boids.desired_separation_distance),
            desired_flock_speed: Some(boids.desired_flock_speed),
            search_target_reach_radius: Some(boids.search_target_reach_radius),
            max_search_time: Some(boids.max_search_time),
            pointer_force_factor: Some(boids.pointer_force_factor),
            borders_max_force: Some(borders.max_force),
            borders_effect_distance: Some(borders.effect_distance),
            field_of_view_on: Some(flags.field_of_view),
            stalemate_breaking_on: Some(flags.stalemate_breaking),
            pointer_avoidance_on: Some(flags.pointer_avoidance),
        }
    }
}

/// Merges `patch` into a copy of `current`. Keys absent from the patch keep
/// their current value, an invalid patch leaves nothing applied.
pub fn apply_settings_patch(
    current: &WorldSettings,
    patch: &SettingsPatch,
) -> Result<WorldSettings, SettingsError> {
    patch.validate()?;

    let mut next = *current;
    overwrite(&mut next.number_of_boids, patch.number_of_boids);
    patch.apply_to_boids(&mut next.boids);
    patch.apply_to_borders(&mut next.borders);
    patch.apply_to_flags(&mut next.flags);

    Ok(next)
}

#[inline]
fn overwrite<T: Copy>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn finite(key: &'static str, value: Option<f32>) -> Result<(), SettingsError> {
    match value {
        Some(value) if !value.is_finite() => Err(SettingsError::NotFinite { key, value }),
        _ => Ok(()),
    }
}

fn non_negative(key: &'static str, value: Option<f32>) -> Result<(), SettingsError> {
    finite(key, value)?;
    match value {
        Some(value) if value < 0. => Err(SettingsError::Negative { key, value }),
        _ => Ok(()),
    }
}

fn positive(key: &'static str, value: Option<f32>) -> Result<(), SettingsError> {
    finite(key, value)?;
    match value {
        Some(value) if value <= 0. => Err(SettingsError::NotPositive { key, value }),
        _ => Ok(()),
    }
}

/// Where and whether the birdwatcher writes its CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOptions {
    pub save_locations: bool,
    /// directory the file is written to
    pub save_locations_path: PathBuf,
    /// suffix the file name with a timestamp instead of overwriting
    pub save_locations_timestamp: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            save_locations: false,
            save_locations_path: PathBuf::from("./"),
            save_locations_timestamp: true,
        }
    }
}

/// Everything a headless run needs besides the number of iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    pub visible_space: Rectangle,
    pub world: WorldSettings,
    pub seed: u64,
    /// simulated seconds between two frames
    pub frame_interval: f64,
    /// birdwatcher samples every n-th tick
    pub sample_rate: u64,
    pub save_options: SaveOptions,
}

impl RunOptions {
    pub fn for_space(visible_space: Rectangle) -> Self {
        RunOptions {
            visible_space,
            world: WorldSettings::default_for_area(visible_space.area()),
            seed: 0,
            frame_interval: 1. / 60.,
            sample_rate: 1,
            save_options: Default::default(),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions::for_space(Rectangle::new(0., 0., 1350., 900.))
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::{apply_settings_patch, SettingsError, SettingsPatch, WorldSettings};

    macro_rules! assert_eqf32 {
        ($x:expr, $y:expr) => {
            assert_relative_eq!($x, $y, epsilon = 1e-3_f32)
        };
    }

    #[test]
    fn default_population_follows_area() {
        assert_eq!(WorldSettings::default_for_area(800. * 800.).number_of_boids, 100);
        assert_eq!(WorldSettings::default_for_area(0.).number_of_boids, 0);
        assert_eq!(WorldSettings::default_for_area(1e9).number_of_boids, 500);
    }

    #[test]
    fn partial_patch_keeps_unrelated_settings() {
        let current = WorldSettings::default();
        let patch = SettingsPatch::from_json(r#"{"cohesionFactor": 3.5}"#).unwrap();

        let next = apply_settings_patch(&current, &patch).unwrap();

        assert_eqf32!(next.boids.cohesion_factor, 3.5);
        assert_eq!(next.boids.max_speed, current.boids.max_speed);
        assert_eq!(next.borders, current.borders);
        assert_eq!(next.flags, current.flags);
        assert_eq!(next.number_of_boids, current.number_of_boids);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res = SettingsPatch::from_json(r#"{"maxSpeed": 10, "colour": "red"}"#);
        assert!(matches!(res, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn flags_and_borders_are_patchable() {
        let patch = SettingsPatch::from_json(
            r#"{"fieldOfViewOn": false, "bordersEffectDistance": 80, "numberOfBoids": 12}"#,
        )
        .unwrap();

        let next = apply_settings_patch(&WorldSettings::default(), &patch).unwrap();

        assert!(!next.flags.field_of_view);
        assert!(next.flags.stalemate_breaking);
        assert_eqf32!(next.borders.effect_distance, 80.);
        assert_eq!(next.number_of_boids, 12);
    }

    #[rstest]
    #[case(r#"{"maxForce": 0}"#)]
    #[case(r#"{"maxForce": -1}"#)]
    #[case(r#"{"radius": -1}"#)]
    #[case(r#"{"maxSearchTime": -0.5}"#)]
    #[case(r#"{"angleOfView": 7}"#)]
    #[case(r#"{"bordersEffectDistance": -10}"#)]
    fn invalid_values_are_rejected(#[case] json: &str) {
        let current = WorldSettings::default();
        let patch = SettingsPatch::from_json(json).unwrap();

        assert!(apply_settings_patch(&current, &patch).is_err());
    }

    #[test]
    fn coupled_defaults_follow_max_speed() {
        let patch = SettingsPatch {
            max_speed: Some(300.),
            ..Default::default()
        }
        .with_coupled_defaults();

        assert_eq!(patch.max_force, Some(300.));
        assert_eq!(patch.desired_flock_speed, Some(150.));
        assert_eq!(patch.borders_max_force, Some(600.));
    }

    #[test]
    fn coupled_defaults_respect_explicit_values() {
        let patch = SettingsPatch {
            radius: Some(10.),
            desired_separation_distance: Some(50.),
            max_force: Some(100.),
            ..Default::default()
        }
        .with_coupled_defaults();

        assert_eq!(patch.desired_separation_distance, Some(50.));
        assert_eq!(patch.borders_max_force, Some(200.));
    }

    #[test]
    fn default_settings_are_valid() {
        assert!(WorldSettings::default().validate().is_ok());
        assert_eq!(
            apply_settings_patch(
                &WorldSettings::default_for_area(0.),
                &SettingsPatch::from(&WorldSettings::default())
            )
            .unwrap(),
            WorldSettings::default()
        );
    }

    #[test]
    fn whole_settings_are_validated() {
        let mut settings = WorldSettings::default();
        settings.boids.max_force = -5.;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::NotPositive { key: "maxForce", .. })
        ));

        let mut settings = WorldSettings::default();
        settings.boids.angle_of_view = 4. * PI;
        assert!(matches!(settings.validate(), Err(SettingsError::AngleOfView(_))));
    }

    #[test]
    fn empty_patch() {
        assert!(SettingsPatch::from_json("{}").unwrap().is_empty());
        assert!(!SettingsPatch::from_json(r#"{"radius": 4}"#).unwrap().is_empty());
    }
}
