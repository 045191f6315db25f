use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis aligned rectangle, `(x, y)` is the corner with the smallest coordinates.
///
/// Padding may produce a negative width/height, that is an accepted state and
/// consumers such as random placement fall back to the center.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center_and_size(center: Vec2, width: f32, height: f32) -> Self {
        Rectangle::new(center.x - width / 2., center.y - height / 2., width, height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2., self.y + self.height / 2.)
    }

    pub fn with_size(&self, width: f32, height: f32) -> Self {
        Rectangle::new(self.x, self.y, width, height)
    }

    /// Shrinks the rectangle by `padding` on every side, keeping the center.
    pub fn with_padding(&self, padding: f32) -> Self {
        Rectangle::from_center_and_size(
            self.center(),
            self.width - 2. * padding,
            self.height - 2. * padding,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Area, degenerate rectangles have none.
    pub fn area(&self) -> f32 {
        self.width.max(0.) * self.height.max(0.)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0. || self.height <= 0.
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Vec2;

    use super::Rectangle;

    macro_rules! assert_eqf32 {
        ($x:expr, $y:expr) => {
            assert_relative_eq!($x, $y, epsilon = 1e-3_f32)
        };
    }

    #[test]
    fn center_of_offset_rect() {
        let c = Rectangle::new(10., 20., 100., 50.).center();
        assert_eqf32!(c.x, 60.);
        assert_eqf32!(c.y, 45.);
    }

    #[test]
    fn padding_shrinks_symmetrically() {
        let rect = Rectangle::new(0., 0., 500., 300.);
        let padded = rect.with_padding(150.);

        assert_eq!(padded, Rectangle::new(150., 150., 200., 0.));
        assert_eq!(padded.center(), rect.center());
    }

    #[test]
    fn excessive_padding_is_degenerate_not_an_error() {
        let padded = Rectangle::new(0., 0., 100., 100.).with_padding(80.);

        assert_eqf32!(padded.width, -60.);
        assert_eqf32!(padded.height, -60.);
        assert!(padded.is_degenerate());
        assert_eqf32!(padded.area(), 0.);
        assert_eq!(padded.center(), Vec2::new(50., 50.));
    }

    #[test]
    fn contains_edges() {
        let rect = Rectangle::new(0., 0., 10., 10.);
        assert!(rect.contains(Vec2::new(0., 10.)));
        assert!(!rect.contains(Vec2::new(10.1, 5.)));
    }

    #[test]
    fn with_size_keeps_corner() {
        let rect = Rectangle::new(3., 4., 1., 1.).with_size(7., 8.);
        assert_eq!(rect, Rectangle::new(3., 4., 7., 8.));
    }
}
