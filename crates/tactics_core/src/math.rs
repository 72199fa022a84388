//! Fixed-point math utilities for deterministic simulation.
//!
//! Movement animation, activation countdowns and ability charging all run on
//! fixed-point time so two hosts fed the same ticks end in the same state.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Step from `self` towards `target` by at most `max_delta`.
    ///
    /// Lands exactly on `target` once the remaining distance is within
    /// `max_delta`, so repeated calls always terminate.
    #[must_use]
    pub fn move_towards(self, target: Self, max_delta: Fixed) -> Self {
        if max_delta <= Fixed::ZERO {
            return self;
        }

        let diff = target - self;
        let len_sq = diff.dot(diff);
        if len_sq == Fixed::ZERO || len_sq <= max_delta.saturating_mul(max_delta) {
            return target;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return target;
        }

        Self::new(
            self.x + diff.x / len * max_delta,
            self.y + diff.y / len * max_delta,
        )
    }
}

/// Computes the square root of a fixed-point number using binary search.
pub(crate) fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..32 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    #[test]
    fn test_vec2_distance_squared() {
        // 3² + 4² = 25
        assert_eq!(vec2(3, 0).distance_squared(vec2(0, 4)), Fixed::from_num(25));
    }

    #[test]
    fn test_move_towards_partial_step() {
        let next = vec2(0, 0).move_towards(vec2(10, 0), Fixed::from_num(4));
        let epsilon = Fixed::from_num(1) / Fixed::from_num(10000);
        assert!((next.x - Fixed::from_num(4)).abs() < epsilon);
        assert_eq!(next.y, Fixed::ZERO);
    }

    #[test]
    fn test_move_towards_snaps_to_target() {
        let target = vec2(3, 4);
        assert_eq!(vec2(0, 0).move_towards(target, Fixed::from_num(5)), target);
        assert_eq!(vec2(0, 0).move_towards(target, Fixed::from_num(50)), target);
    }

    #[test]
    fn test_move_towards_zero_delta_stays() {
        let start = vec2(1, 1);
        assert_eq!(start.move_towards(vec2(9, 9), Fixed::ZERO), start);
    }

    #[test]
    fn test_fixed_sqrt() {
        let root = fixed_sqrt(Fixed::from_num(49));
        let epsilon = Fixed::from_num(1) / Fixed::from_num(10000);
        assert!((root - Fixed::from_num(7)).abs() < epsilon);
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
    }
}
