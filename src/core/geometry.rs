//! Positions and rectangles in cell space.

/// 3-component vector. `x`/`y` are fractional cell coordinates, `z` orders
/// draw calls: a cell is only overwritten by an equal or higher `z`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Position on layer 0
    pub const fn xy(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Component-wise sum of `x`/`y`; keeps the depth of `self`.
    pub fn add(self, other: Vector) -> Vector {
        Vector {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z,
        }
    }

    /// Component-wise product.
    pub fn mul(self, other: Vector) -> Vector {
        Vector {
            x: self.x * other.x,
            y: self.y * other.y,
            z: self.z * other.z,
        }
    }

    /// Snap `x`/`y` to the nearest cell, half away from zero.
    pub fn round(self) -> Vector {
        Vector {
            x: self.x.round(),
            y: self.y.round(),
            z: self.z,
        }
    }

    /// Integer cell coordinates after rounding.
    pub fn cell(self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

/// Rectangle defined by its top-left position and size. The position's `z`
/// is the depth of every cell the rectangle draws.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub pos: Vector,
    pub size: Vector,
}

impl Rect {
    pub const fn new(pos: Vector, size: Vector) -> Self {
        Self { pos, size }
    }

    /// Rounded top-left corner.
    pub fn min(&self) -> (i64, i64) {
        self.pos.cell()
    }

    /// Rounded bottom-right corner (inclusive).
    pub fn max(&self) -> (i64, i64) {
        self.pos.add(self.size).cell()
    }

    pub fn depth(&self) -> f32 {
        self.pos.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_depth() {
        let a = Vector::new(1.0, 2.0, 5.0);
        let b = Vector::new(0.5, 0.5, 9.0);
        assert_eq!(a.add(b), Vector::new(1.5, 2.5, 5.0));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(Vector::xy(1.4, 2.5).cell(), (1, 3));
        assert_eq!(Vector::xy(-0.4, 0.6).cell(), (0, 1));
    }

    #[test]
    fn test_rect_corners() {
        let rect = Rect::new(Vector::new(1.2, 0.8, 3.0), Vector::xy(4.0, 2.0));
        assert_eq!(rect.min(), (1, 1));
        assert_eq!(rect.max(), (5, 3));
        assert_eq!(rect.depth(), 3.0);
    }
}
