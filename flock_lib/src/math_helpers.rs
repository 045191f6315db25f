use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use crate::rectangle::Rectangle;

/// Maps `value` from the range `[in_min, in_max]` onto `[out_min, out_max]`, linear and unclamped.
#[inline]
pub fn map_range(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    (value - in_min) * ((out_max - out_min) / (in_max - in_min)) + out_min
}

#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

pub fn deg_to_rad(deg: f32) -> f32 {
    deg * PI / 180.
}

/// Wraps an angle difference into [-π, π]
#[inline]
pub fn wrap_angle(mut angle: f32) -> f32 {
    if angle > PI {
        angle -= 2. * PI;
    }
    if angle < -PI {
        angle += 2. * PI;
    }
    angle
}

/// Vector policies on top of glam's `Vec2`.
///
/// glam's own `normalize` produces NaN for the zero vector, everything here
/// falls back to the zero vector instead.
pub trait VectorExt: Sized {
    /// Rescales to magnitude `m`, the zero vector stays zero.
    fn with_magnitude(self, m: f32) -> Self;
    fn unit(self) -> Self;
    /// Returns `self` when `|self| <= m`, otherwise `unit(self) * m`.
    fn limit_magnitude(self, m: f32) -> Self;
    /// atan2 of the vector, 0 for the zero vector
    fn heading(self) -> f32;

    fn magnitude_lt(self, m: f32) -> bool;
    fn magnitude_lte(self, m: f32) -> bool;

    fn distance_lt(self, other: Self, distance: f32) -> bool;
    fn distance_lte(self, other: Self, distance: f32) -> bool;
    fn distance_gt(self, other: Self, distance: f32) -> bool;
    fn distance_gte(self, other: Self, distance: f32) -> bool;

    fn from_heading(angle: f32) -> Self;
    fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Self;
    fn random_with_magnitude<R: Rng + ?Sized>(rng: &mut R, m: f32) -> Self;
    /// Uniform point inside `rect`. Degenerate (negative sized) extents collapse onto the center.
    fn random_in_rect<R: Rng + ?Sized>(rng: &mut R, rect: &Rectangle) -> Self;

    fn sum_of(vectors: impl IntoIterator<Item = Self>) -> Self;
    fn average_of(vectors: &[Self]) -> Self;
}

impl VectorExt for Vec2 {
    #[inline]
    fn with_magnitude(self, m: f32) -> Self {
        let length = self.length();
        if length == 0. {
            Vec2::ZERO
        } else {
            self * (m / length)
        }
    }

    #[inline]
    fn unit(self) -> Self {
        self.with_magnitude(1.)
    }

    #[inline]
    fn limit_magnitude(self, m: f32) -> Self {
        if self.magnitude_lte(m) {
            self
        } else {
            self.with_magnitude(m)
        }
    }

    #[inline]
    fn heading(self) -> f32 {
        self.y.atan2(self.x)
    }

    #[inline]
    fn magnitude_lt(self, m: f32) -> bool {
        self.length_squared() < m * m
    }

    #[inline]
    fn magnitude_lte(self, m: f32) -> bool {
        self.length_squared() <= m * m
    }

    #[inline]
    fn distance_lt(self, other: Self, distance: f32) -> bool {
        (self - other).magnitude_lt(distance)
    }

    #[inline]
    fn distance_lte(self, other: Self, distance: f32) -> bool {
        (self - other).magnitude_lte(distance)
    }

    #[inline]
    fn distance_gt(self, other: Self, distance: f32) -> bool {
        !self.distance_lte(other, distance)
    }

    #[inline]
    fn distance_gte(self, other: Self, distance: f32) -> bool {
        !self.distance_lt(other, distance)
    }

    fn from_heading(angle: f32) -> Self {
        Vec2::new(angle.cos(), angle.sin())
    }

    fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Vec2::from_heading(rng.gen::<f32>() * 2. * PI)
    }

    fn random_with_magnitude<R: Rng + ?Sized>(rng: &mut R, m: f32) -> Self {
        Vec2::random_unit(rng) * m
    }

    fn random_in_rect<R: Rng + ?Sized>(rng: &mut R, rect: &Rectangle) -> Self {
        let center = rect.center();
        // always draw both so the rng stream does not depend on the geometry
        let (u, v) = (rng.gen::<f32>(), rng.gen::<f32>());
        let x = if rect.width > 0. { rect.x + u * rect.width } else { center.x };
        let y = if rect.height > 0. { rect.y + v * rect.height } else { center.y };
        Vec2::new(x, y)
    }

    fn sum_of(vectors: impl IntoIterator<Item = Self>) -> Self {
        vectors.into_iter().fold(Vec2::ZERO, |sum, v| sum + v)
    }

    fn average_of(vectors: &[Self]) -> Self {
        if vectors.is_empty() {
            return Vec2::ZERO;
        }
        Vec2::sum_of(vectors.iter().copied()) / vectors.len() as f32
    }
}
