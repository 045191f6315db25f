use glam::Vec2;

use crate::{
    math_helpers::{clamp, map_range},
    options::BorderSettings,
    rectangle::Rectangle,
};

/// Which edge of the bordered space a [`Border`] guards. Also selects the
/// distance function used against the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Top,
    Right,
    Bottom,
}

impl Side {
    /// Direction the repulsion pushes in, pointing into the bordered space.
    pub fn unit_normal(&self) -> Vec2 {
        match self {
            Side::Left => Vec2::new(1., 0.),
            Side::Top => Vec2::new(0., 1.),
            Side::Right => Vec2::new(-1., 0.),
            Side::Bottom => Vec2::new(0., -1.),
        }
    }

    /// Signed distance from the boid's leading edge to this side, negative
    /// once the boid penetrates it.
    pub fn distance(&self, bounds: &Rectangle, position: Vec2, radius: f32) -> f32 {
        match self {
            Side::Left => (position.x - radius) - bounds.x,
            Side::Top => (position.y - radius) - bounds.y,
            Side::Right => bounds.right() - (position.x + radius),
            Side::Bottom => bounds.bottom() - (position.y + radius),
        }
    }
}

/// A single planar boundary producing a repulsive field.
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    side: Side,
    unit_normal: Vec2,
    pub max_force: f32,
    pub effect_distance: f32,
}

impl Border {
    pub fn new(side: Side, max_force: f32, effect_distance: f32) -> Self {
        Border {
            side,
            unit_normal: side.unit_normal(),
            max_force,
            effect_distance,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Force pushing away from this border, linear falloff from `max_force`
    /// at contact to nothing at `effect_distance`.
    pub fn calc_normal_force(&self, bounds: &Rectangle, position: Vec2, radius: f32) -> Vec2 {
        let distance = self.side.distance(bounds, position, radius);

        let magnitude = if self.effect_distance <= 0. {
            if distance <= 0. {
                self.max_force
            } else {
                0.
            }
        } else {
            let clamped = clamp(distance, 0., self.effect_distance);
            map_range(clamped, 0., self.effect_distance, self.max_force, 0.)
        };

        self.unit_normal * magnitude
    }
}

/// Four borders containing a rectangle.
///
/// The borders do not capture the rectangle, they are evaluated against the
/// bounds owned here, so [`RectBorders::set_bounds`] takes effect for all four
/// at once.
#[derive(Debug, Clone)]
pub struct RectBorders {
    bounds: Rectangle,
    settings: BorderSettings,
    borders: [Border; 4],
}

impl RectBorders {
    pub fn new(bounds: Rectangle, settings: BorderSettings) -> Self {
        let BorderSettings {
            max_force,
            effect_distance,
        } = settings;

        RectBorders {
            bounds,
            settings,
            borders: [
                Border::new(Side::Left, max_force, effect_distance),
                Border::new(Side::Top, max_force, effect_distance),
                Border::new(Side::Right, max_force, effect_distance),
                Border::new(Side::Bottom, max_force, effect_distance),
            ],
        }
    }

    pub fn bounds(&self) -> &Rectangle {
        &self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rectangle) {
        self.bounds = bounds;
    }

    pub fn settings(&self) -> BorderSettings {
        self.settings
    }

    pub fn borders(&self) -> &[Border; 4] {
        &self.borders
    }

    /// Region where no border pushes yet, used for spawning and search targets.
    pub fn free_zone(&self) -> Rectangle {
        self.bounds.with_padding(self.settings.effect_distance)
    }

    pub fn calc_force(&self, position: Vec2, radius: f32) -> Vec2 {
        self.borders
            .iter()
            .map(|border| border.calc_normal_force(&self.bounds, position, radius))
            .fold(Vec2::ZERO, |sum, force| sum + force)
    }

    pub fn change_settings(&mut self, settings: BorderSettings) {
        self.settings = settings;
        self.borders.iter_mut().for_each(|border| {
            border.max_force = settings.max_force;
            border.effect_distance = settings.effect_distance;
        });
    }
}
