use glam::Vec2;
use tracing::info;

use crate::{
    boid::Boid,
    borders::RectBorders,
    flock::Flock,
    options::{apply_settings_patch, SettingsError, SettingsPatch, WorldSettings},
    pointer::Pointer,
    rectangle::Rectangle,
};

/// The flock together with everything it reacts to.
pub struct World {
    flock: Flock,
    borders: RectBorders,
    pointer: Pointer,
    settings: WorldSettings,
}

impl World {
    /// Creates the world and populates it with `settings.number_of_boids`
    /// boids inside the free zone of `visible_space`.
    pub fn new(visible_space: Rectangle, settings: WorldSettings, seed: u64) -> Self {
        let borders = RectBorders::new(visible_space, settings.borders);
        let mut flock = Flock::new(settings.boids, settings.flags, seed);
        flock.set_number_of_boids(settings.number_of_boids, &borders.free_zone());

        World {
            flock,
            borders,
            pointer: Pointer::default(),
            settings,
        }
    }

    /// Advances the world by `dt` seconds, expected in `(0, MAX_DT]`.
    pub fn update(&mut self, dt: f32) {
        self.flock.update(dt, &self.borders, Some(&self.pointer));
    }

    /// Resizes the bordered space. Boids keep their positions and are pushed
    /// back in by the borders.
    pub fn set_visible_space(&mut self, visible_space: Rectangle) {
        self.borders.set_bounds(visible_space);
    }

    pub fn set_pointer_position(&mut self, position: Option<Vec2>) {
        self.pointer.position = position;
    }

    pub fn set_pointer_pressed(&mut self, is_pressed: bool) {
        self.pointer.is_pressed = is_pressed;
    }

    /// Applies a partial settings change between ticks. An invalid patch is
    /// rejected as a whole.
    pub fn change_settings(&mut self, patch: &SettingsPatch) -> Result<(), SettingsError> {
        let next = apply_settings_patch(&self.settings, patch)?;

        self.flock.set_settings(next.boids, next.flags);
        self.borders.change_settings(next.borders);
        if patch.number_of_boids.is_some() {
            self.flock
                .set_number_of_boids(next.number_of_boids, &self.borders.free_zone());
        }

        info!(?patch, "settings changed");
        self.settings = next;
        Ok(())
    }

    pub fn settings(&self) -> WorldSettings {
        self.settings
    }

    pub fn visible_space(&self) -> &Rectangle {
        self.borders.bounds()
    }

    pub fn flock(&self) -> &Flock {
        &self.flock
    }

    pub fn boids(&self) -> &[Boid] {
        self.flock.boids()
    }

    pub fn borders(&self) -> &RectBorders {
        &self.borders
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::World;
    use crate::{
        options::{SettingsError, SettingsPatch, WorldSettings},
        rectangle::Rectangle,
    };

    const DT: f32 = 1. / 15.;

    fn space() -> Rectangle {
        Rectangle::new(0., 0., 1000., 800.)
    }

    #[test]
    fn populates_free_zone() {
        let world = World::new(space(), WorldSettings::default_for_area(space().area()), 1);
        let zone = world.borders().free_zone();

        assert_eq!(world.boids().len(), 125);
        assert!(world.boids().iter().all(|b| zone.contains(b.position())));
    }

    #[test]
    fn boids_stay_finite() {
        let mut world = World::new(space(), WorldSettings::default_for_area(space().area()), 2);
        world.set_pointer_position(Some(Vec2::new(500., 400.)));
        world.set_pointer_pressed(true);

        for _ in 0..300 {
            world.update(DT);
        }

        assert!(world
            .boids()
            .iter()
            .all(|b| b.position().is_finite() && b.velocity().is_finite()));
    }

    #[test]
    fn patch_routes_every_part() {
        let mut world = World::new(space(), WorldSettings::default(), 3);
        let patch = SettingsPatch::from_json(
            r#"{"numberOfBoids": 7, "radius": 5, "bordersEffectDistance": 50, "stalemateBreakingOn": false}"#,
        )
        .unwrap();

        world.change_settings(&patch).unwrap();

        let settings = world.settings();
        assert_eq!(world.boids().len(), 7);
        assert_eq!(settings.number_of_boids, 7);
        assert_eq!(world.flock().settings().radius, 5.);
        assert_eq!(world.borders().settings().effect_distance, 50.);
        assert!(!world.flock().flags().stalemate_breaking);
    }

    #[test]
    fn rejected_patch_changes_nothing() {
        let mut world = World::new(space(), WorldSettings::default(), 3);
        let before = world.settings();
        let patch = SettingsPatch {
            number_of_boids: Some(3),
            view_distance: Some(-1.),
            ..Default::default()
        };

        let result = world.change_settings(&patch);

        assert!(matches!(result, Err(SettingsError::Negative { key: "viewDistance", .. })));
        assert_eq!(world.settings(), before);
        assert_eq!(world.boids().len(), before.number_of_boids);
    }

    #[test]
    fn resize_moves_the_borders() {
        let mut world = World::new(space(), WorldSettings::default(), 3);
        world.set_visible_space(Rectangle::new(0., 0., 400., 400.));

        assert_eq!(*world.visible_space(), Rectangle::new(0., 0., 400., 400.));
        assert_eq!(world.borders().free_zone(), Rectangle::new(150., 150., 100., 100.));
    }
}
