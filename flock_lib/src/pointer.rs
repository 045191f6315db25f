use glam::Vec2;

/// Last known pointer state as reported by the input layer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer {
    /// `None` while the pointer is outside the visible space
    pub position: Option<Vec2>,
    pub is_pressed: bool,
}

impl Pointer {
    pub fn new(position: Option<Vec2>, is_pressed: bool) -> Self {
        Pointer {
            position,
            is_pressed,
        }
    }

    /// Position of a pressed pointer, the only state boids react to.
    pub fn active_position(&self) -> Option<Vec2> {
        if self.is_pressed {
            self.position
        } else {
            None
        }
    }
}
