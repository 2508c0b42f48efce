use std::ops::{Add, AddAssign, Mul, Sub};

/// Logical-space coordinate. Origin is the top left corner of the scene,
/// y grows downwards.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        (*self - other).length()
    }
}

/// Velocity or displacement. Same layout as `Point`, kept as its own type so
/// a position can't be added to a position by accident.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vector { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: Vector) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Unit vector, or zero when the length is zero.
    pub fn normalized(&self) -> Vector {
        let len = self.length();
        if len == 0.0 {
            Vector::ZERO
        } else {
            Vector::new(self.x / len, self.y / len)
        }
    }
}

impl Add<Vector> for Point {
    type Output = Point;
    fn add(self, v: Vector) -> Point {
        Point::new(self.x + v.x, self.y + v.y)
    }
}

impl AddAssign<Vector> for Point {
    fn add_assign(&mut self, v: Vector) {
        self.x += v.x;
        self.y += v.y;
    }
}

impl Sub for Point {
    type Output = Vector;
    fn sub(self, other: Point) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y)
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, other: Vector) -> Vector {
        Vector::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, other: Vector) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, other: Vector) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;
    fn mul(self, k: f32) -> Vector {
        Vector::new(self.x * k, self.y * k)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Size { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

/// Axis aligned box: top left `position` + `size`
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            position: Point { x, y },
            size: Size { width, height },
        }
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn left(&self) -> f32 {
        self.position.x
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.width
    }

    pub fn top(&self) -> f32 {
        self.position.y
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.size.width * 0.5,
            self.position.y + self.size.height * 0.5,
        )
    }

    /// AABB overlap. Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    pub fn translated(&self, offset: Vector) -> Rect {
        Rect::new(self.position + offset, self.size)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f32,
}

impl Circle {
    pub const fn new(center: Point, radius: f32) -> Self {
        Circle { center, radius }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_xywh(
            self.center.x - self.radius,
            self.center.y - self.radius,
            self.radius * 2.0,
            self.radius * 2.0,
        )
    }

    /// Point of `rect` closest to the circle center.
    pub fn closest_point(&self, rect: &Rect) -> Point {
        Point::new(
            self.center.x.clamp(rect.left(), rect.right()),
            self.center.y.clamp(rect.top(), rect.bottom()),
        )
    }

    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        self.center.distance_to(self.closest_point(rect)) < self.radius
    }

    pub fn intersects_circle(&self, other: &Circle) -> bool {
        self.center.distance_to(other.center) < self.radius + other.radius
    }
}

/// Straight segment, used for flippers and slanted walls.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Segment { start, end }
    }

    pub fn closest_point(&self, point: Point) -> Point {
        let along = self.end - self.start;
        let len_sq = along.dot(along);
        if len_sq == 0.0 {
            return self.start;
        }
        let t = ((point - self.start).dot(along) / len_sq).clamp(0.0, 1.0);
        self.start + along * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rects_overlap_only_when_areas_share_space() {
        let a = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::from_xywh(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::from_xywh(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::from_xywh(0.0, 20.0, 10.0, 10.0)));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::from_xywh(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(!r.contains(Point::new(10.0, 5.0)));
    }

    #[test]
    fn circle_hits_rect_corner_by_distance() {
        let rect = Rect::from_xywh(10.0, 10.0, 10.0, 10.0);
        assert!(Circle::new(Point::new(7.0, 7.0), 5.0).intersects_rect(&rect));
        assert!(!Circle::new(Point::new(5.0, 5.0), 5.0).intersects_rect(&rect));
    }

    #[test]
    fn closest_point_on_segment_clamps_to_ends() {
        let seg = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let p = seg.closest_point(Point::new(4.0, 3.0));
        assert_relative_eq!(p.x, 4.0);
        assert_relative_eq!(p.y, 0.0);
        assert_eq!(seg.closest_point(Point::new(-5.0, 1.0)), seg.start);
        assert_eq!(seg.closest_point(Point::new(15.0, 1.0)), seg.end);
    }
}
