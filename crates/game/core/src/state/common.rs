use std::fmt;

/// Unique identifier for any creature or item tracked in the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl EntityId {
    /// Reserved identifier for engine-originated work (damage-over-time, hooks).
    pub const SYSTEM: Self = Self(u32::MAX);

    /// Returns true if this entity represents the engine itself.
    #[inline]
    pub const fn is_system(self) -> bool {
        self.0 == Self::SYSTEM.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of an effect instance. Allocated monotonically, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectId(pub u32);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Discrete grid position expressed in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance in tiles.
    ///
    /// Range bands, aura radii and movement all use this metric, so a diagonal
    /// step costs the same as an orthogonal one.
    pub fn distance(self, other: Position) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }

    /// Straight-line distance, used for cone and line geometry and projectile timing.
    pub fn euclidean(self, other: Position) -> f32 {
        let dx = (other.x - self.x) as f32;
        let dy = (other.y - self.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Single king-move step from `self` toward `goal`.
    pub fn step_toward(self, goal: Position) -> Position {
        Position::new(
            self.x + (goal.x - self.x).signum(),
            self.y + (goal.y - self.y).signum(),
        )
    }

    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        const OFFSETS: [(i32, i32); 8] = [
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        OFFSETS
            .into_iter()
            .map(move |(dx, dy)| Position::new(self.x + dx, self.y + dy))
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Current/maximum pair used for hit points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceMeter {
    pub current: i32,
    pub maximum: i32,
}

impl ResourceMeter {
    pub const fn new(current: i32, maximum: i32) -> Self {
        Self { current, maximum }
    }

    pub const fn full(maximum: i32) -> Self {
        Self::new(maximum, maximum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chebyshev_distance_treats_diagonals_as_one() {
        assert_eq!(Position::new(0, 0).distance(Position::new(3, 3)), 3);
        assert_eq!(Position::new(0, 0).distance(Position::new(-4, 1)), 4);
        assert_eq!(Position::new(2, 2).distance(Position::new(2, 2)), 0);
    }

    #[test]
    fn step_toward_moves_one_tile() {
        let from = Position::new(0, 0);
        assert_eq!(from.step_toward(Position::new(5, -2)), Position::new(1, -1));
        assert_eq!(from.step_toward(from), from);
    }
}
