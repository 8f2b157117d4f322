use std::fmt;

use super::{SelectionMode, SlotRef, TargeterShape, TargetingSpec};
use crate::state::{EntityId, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargeterId(pub u32);

impl fmt::Display for TargeterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "targeter#{}", self.0)
    }
}

/// A target-selection session opened by a slot activation.
///
/// `eligible` is computed once when the targeter opens: creatures of an
/// accepted relationship that pass the ability's validator and can be reached.
/// The session lives until it resolves or is cancelled.
#[derive(Clone, Debug, PartialEq)]
pub struct Targeter {
    pub id: TargeterId,
    pub slot: SlotRef,
    pub caster: EntityId,
    pub origin: Position,
    pub spec: TargetingSpec,
    pub max_range: u32,
    pub eligible: Vec<EntityId>,
    pub selected: Vec<EntityId>,
    pub point: Option<Position>,
    /// Refunded on cancel.
    pub ap_spent: u32,
}

impl Targeter {
    pub fn is_eligible(&self, id: EntityId) -> bool {
        self.eligible.contains(&id)
    }

    /// Picks needed before a list targeter resolves on its own.
    pub fn required(&self) -> usize {
        match self.spec.mode {
            SelectionMode::Single => 1,
            SelectionMode::Multi { max } => usize::from(max.max(1)),
            SelectionMode::UniqueRequired { count } => usize::from(count.max(1)),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.selected.len() >= self.required()
    }

    pub fn in_range(&self, position: Position) -> bool {
        let distance = self.origin.distance(position);
        distance >= self.spec.min_range && distance <= self.max_range
    }

    /// Whether an area can be aimed at `point`.
    pub fn accepts_point(&self, point: Position) -> bool {
        match self.spec.shape {
            TargeterShape::Circle { .. } => self.in_range(point),
            TargeterShape::Cone { .. } | TargeterShape::Line { .. } => point != self.origin,
            TargeterShape::SelfOnly | TargeterShape::List => false,
        }
    }

    /// Whether `position` lies inside the area aimed at `point`.
    pub fn covers(&self, point: Position, position: Position) -> bool {
        match self.spec.shape {
            TargeterShape::Circle { radius } => point.distance(position) <= radius,
            TargeterShape::Cone {
                length,
                half_angle_deg,
            } => in_cone(self.origin, point, position, length, half_angle_deg),
            TargeterShape::Line { length } => on_line(self.origin, point, position, length),
            TargeterShape::SelfOnly | TargeterShape::List => false,
        }
    }
}

/// What a resolver receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetSelection {
    pub targeter: Option<TargeterId>,
    pub slot: SlotRef,
    pub caster: EntityId,
    pub targets: Vec<EntityId>,
    pub point: Option<Position>,
}

fn offset(from: Position, to: Position) -> (f32, f32) {
    ((to.x - from.x) as f32, (to.y - from.y) as f32)
}

fn in_cone(origin: Position, toward: Position, position: Position, length: u32, half_angle_deg: f32) -> bool {
    if position == origin || toward == origin || origin.distance(position) > length {
        return false;
    }
    let (dx, dy) = offset(origin, toward);
    let (px, py) = offset(origin, position);
    let cos = (dx * px + dy * py) / ((dx * dx + dy * dy).sqrt() * (px * px + py * py).sqrt());
    let angle = cos.clamp(-1.0, 1.0).acos().to_degrees();
    angle <= half_angle_deg + 1e-3
}

fn on_line(origin: Position, toward: Position, position: Position, length: u32) -> bool {
    if position == origin || toward == origin {
        return false;
    }
    let (dx, dy) = offset(origin, toward);
    let norm = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = (dx / norm, dy / norm);
    let (px, py) = offset(origin, position);
    let along = px * ux + py * uy;
    let across = (px * uy - py * ux).abs();
    along > 0.0 && along <= length as f32 + 0.5 && across <= 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::RelationshipMask;

    fn targeter(shape: TargeterShape, max_range: u32) -> Targeter {
        Targeter {
            id: TargeterId(1),
            slot: SlotRef::new(EntityId(0), 0),
            caster: EntityId(0),
            origin: Position::ORIGIN,
            spec: TargetingSpec::area(shape, RelationshipMask::HOSTILE),
            max_range,
            eligible: Vec::new(),
            selected: Vec::new(),
            point: None,
            ap_spent: 0,
        }
    }

    #[test]
    fn circle_is_chebyshev_around_point() {
        let t = targeter(TargeterShape::Circle { radius: 1 }, 6);
        let point = Position::new(4, 4);
        assert!(t.accepts_point(point));
        assert!(t.covers(point, Position::new(5, 5)));
        assert!(!t.covers(point, Position::new(6, 4)));
        assert!(!t.accepts_point(Position::new(7, 0)));
    }

    #[test]
    fn cone_respects_angle_and_length() {
        let t = targeter(
            TargeterShape::Cone {
                length: 3,
                half_angle_deg: 30.0,
            },
            0,
        );
        let east = Position::new(1, 0);
        assert!(t.covers(east, Position::new(3, 0)));
        assert!(t.covers(east, Position::new(3, 1)));
        assert!(!t.covers(east, Position::new(1, 1)));
        assert!(!t.covers(east, Position::new(4, 0)));
        assert!(!t.covers(east, Position::new(-1, 0)));
        assert!(!t.covers(east, Position::ORIGIN));
    }

    #[test]
    fn line_is_one_tile_wide() {
        let t = targeter(TargeterShape::Line { length: 5 }, 0);
        let toward = Position::new(0, 2);
        assert!(t.covers(toward, Position::new(0, 5)));
        assert!(!t.covers(toward, Position::new(1, 3)));
        assert!(!t.covers(toward, Position::new(0, 6)));
        assert!(!t.covers(toward, Position::new(0, -1)));
    }

    #[test]
    fn diagonal_line_follows_diagonal() {
        let t = targeter(TargeterShape::Line { length: 4 }, 0);
        let toward = Position::new(1, 1);
        assert!(t.covers(toward, Position::new(3, 3)));
        assert!(!t.covers(toward, Position::new(3, 1)));
    }

    #[test]
    fn selection_modes_set_required_count() {
        let mut t = targeter(TargeterShape::List, 2);
        assert_eq!(t.required(), 1);
        t.spec.mode = SelectionMode::Multi { max: 3 };
        assert_eq!(t.required(), 3);
        t.spec.mode = SelectionMode::UniqueRequired { count: 2 };
        assert_eq!(t.required(), 2);
    }
}
