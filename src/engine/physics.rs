//! Collision primitives shared by the games.
//!
//! Everything here works on one fixed step at a time; velocities are in
//! logical pixels per step and gravity in pixels per step squared.

use crate::engine::geometry::{Circle, Point, Rect, Segment, Vector};

/// Which sides of a box are solid (or, as a return value, which were hit)
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Walls {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Walls {
    pub const ALL: Walls = Walls {
        left: true,
        right: true,
        top: true,
        bottom: true,
    };

    /// Breakout/pinball style box: the floor is where balls are lost
    pub const OPEN_BOTTOM: Walls = Walls {
        left: true,
        right: true,
        top: true,
        bottom: false,
    };

    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

/// Semi-implicit Euler: gravity feeds velocity, velocity feeds position.
pub fn integrate(position: &mut Point, velocity: &mut Vector, gravity: f32) {
    velocity.y += gravity;
    *position += *velocity;
}

/// Mirror `velocity` about the surface with unit `normal`
pub fn reflect(velocity: Vector, normal: Vector) -> Vector {
    velocity - normal * (2.0 * velocity.dot(normal))
}

pub fn reflect_and_dampen(velocity: Vector, normal: Vector, damping: f32) -> Vector {
    reflect(velocity, normal) * damping
}

/// Keeps `circle` inside `bounds` against the solid `walls`, flipping and
/// damping the matching velocity component. Returns the walls that were hit.
pub fn bounce_inside(
    circle: &mut Circle,
    velocity: &mut Vector,
    bounds: &Rect,
    walls: Walls,
    damping: f32,
) -> Walls {
    let mut hit = Walls::default();
    let r = circle.radius;

    if walls.left && circle.center.x - r < bounds.left() {
        circle.center.x = bounds.left() + r;
        velocity.x = velocity.x.abs() * damping;
        hit.left = true;
    } else if walls.right && circle.center.x + r > bounds.right() {
        circle.center.x = bounds.right() - r;
        velocity.x = -velocity.x.abs() * damping;
        hit.right = true;
    }

    if walls.top && circle.center.y - r < bounds.top() {
        circle.center.y = bounds.top() + r;
        velocity.y = velocity.y.abs() * damping;
        hit.top = true;
    } else if walls.bottom && circle.center.y + r > bounds.bottom() {
        circle.center.y = bounds.bottom() - r;
        velocity.y = -velocity.y.abs() * damping;
        hit.bottom = true;
    }

    hit
}

/// Surface normal pointing from `rect` towards the circle, if they touch.
/// When the center is already inside the box the axis with the smallest
/// penetration wins.
pub fn circle_rect_normal(circle: &Circle, rect: &Rect) -> Option<Vector> {
    if !circle.intersects_rect(rect) {
        return None;
    }
    let closest = circle.closest_point(rect);
    let offset = circle.center - closest;
    if offset.length() > 0.0 {
        return Some(offset.normalized());
    }

    let c = circle.center;
    let candidates = [
        (c.x - rect.left(), Vector::new(-1.0, 0.0)),
        (rect.right() - c.x, Vector::new(1.0, 0.0)),
        (c.y - rect.top(), Vector::new(0.0, -1.0)),
        (rect.bottom() - c.y, Vector::new(0.0, 1.0)),
    ];
    candidates
        .iter()
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, normal)| *normal)
}

/// Pushes the circle out of `rect` and reflects it if it was moving into
/// the surface. Returns true on contact.
pub fn resolve_circle_rect(
    circle: &mut Circle,
    velocity: &mut Vector,
    rect: &Rect,
    damping: f32,
) -> bool {
    let Some(normal) = circle_rect_normal(circle, rect) else {
        return false;
    };
    let closest = circle.closest_point(rect);
    let depth = circle.radius - circle.center.distance_to(closest);
    if depth > 0.0 {
        circle.center += normal * depth;
    }
    if velocity.dot(normal) < 0.0 {
        *velocity = reflect_and_dampen(*velocity, normal, damping);
    }
    true
}

/// Same as `resolve_circle_rect` for a segment, with an extra `impulse`
/// added along the normal (flippers kick the ball).
pub fn resolve_circle_segment(
    circle: &mut Circle,
    velocity: &mut Vector,
    segment: &Segment,
    damping: f32,
    impulse: f32,
) -> bool {
    let closest = segment.closest_point(circle.center);
    let offset = circle.center - closest;
    let distance = offset.length();
    if distance >= circle.radius || distance == 0.0 {
        return false;
    }
    let normal = offset.normalized();
    circle.center += normal * (circle.radius - distance);
    if velocity.dot(normal) < 0.0 {
        *velocity = reflect_and_dampen(*velocity, normal, damping);
    }
    *velocity += normal * impulse;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gravity_accumulates_into_position() {
        let mut p = Point::new(0.0, 0.0);
        let mut v = Vector::ZERO;
        integrate(&mut p, &mut v, 0.5);
        integrate(&mut p, &mut v, 0.5);
        assert_relative_eq!(v.y, 1.0);
        assert_relative_eq!(p.y, 1.5);
    }

    #[test]
    fn reflect_flips_normal_component_only() {
        let v = reflect(Vector::new(3.0, 4.0), Vector::new(0.0, -1.0));
        assert_relative_eq!(v.x, 3.0);
        assert_relative_eq!(v.y, -4.0);
    }

    #[test]
    fn bounce_dampens_and_clamps_inside() {
        let bounds = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let mut ball = Circle::new(Point::new(98.0, 50.0), 5.0);
        let mut v = Vector::new(4.0, 0.0);
        let hit = bounce_inside(&mut ball, &mut v, &bounds, Walls::ALL, 0.5);
        assert!(hit.right);
        assert_relative_eq!(ball.center.x, 95.0);
        assert_relative_eq!(v.x, -2.0);
    }

    #[test]
    fn open_bottom_lets_ball_fall_through() {
        let bounds = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let mut ball = Circle::new(Point::new(50.0, 104.0), 5.0);
        let mut v = Vector::new(0.0, 3.0);
        let hit = bounce_inside(&mut ball, &mut v, &bounds, Walls::OPEN_BOTTOM, 1.0);
        assert!(!hit.any());
        assert_relative_eq!(v.y, 3.0);
    }

    #[test]
    fn ball_landing_on_box_bounces_up() {
        let rect = Rect::from_xywh(0.0, 10.0, 20.0, 5.0);
        let mut ball = Circle::new(Point::new(10.0, 7.0), 4.0);
        let mut v = Vector::new(1.0, 2.0);
        assert!(resolve_circle_rect(&mut ball, &mut v, &rect, 1.0));
        assert!(v.y < 0.0);
        assert_relative_eq!(ball.center.y, 6.0);
    }

    #[test]
    fn segment_contact_adds_impulse() {
        let seg = Segment::new(Point::new(0.0, 10.0), Point::new(20.0, 10.0));
        let mut ball = Circle::new(Point::new(10.0, 8.0), 3.0);
        let mut v = Vector::new(0.0, 2.0);
        assert!(resolve_circle_segment(&mut ball, &mut v, &seg, 1.0, 1.0));
        assert_relative_eq!(v.y, -3.0);
    }
}
