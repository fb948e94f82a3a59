//! Positions, rotations and scales of guide placeholders.

/// A three-component vector (x, y, z).
pub type Vec3 = [f64; 3];

pub const ZERO: Vec3 = [0.0; 3];
pub const ONE: Vec3 = [1.0; 3];

/// A local transform: translation, euler rotation in degrees, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: ZERO,
        rotation: ZERO,
        scale: ONE,
    };

    /// Creates an identity transform moved to `position`.
    pub fn from_position(position: Vec3) -> Self {
        Transform {
            position,
            ..Transform::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Transform::IDENTITY
    }

    /// Returns true if every component is finite.
    pub fn is_finite(&self) -> bool {
        is_finite(&self.position) && is_finite(&self.rotation) && is_finite(&self.scale)
    }
}

/// Returns true if every component of `v` is finite.
pub fn is_finite(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Reflects a position across the YZ plane.
pub fn mirror_x(v: Vec3) -> Vec3 {
    [-v[0], v[1], v[2]]
}
