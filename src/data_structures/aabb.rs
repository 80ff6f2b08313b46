use cgmath::{Matrix4, Point3, Transform, Vector3};

/// Axis-aligned bounding box.
///
/// Defaults to the inverted empty box (`min` at `+MAX`, `max` at `-MAX`) so
/// that merging any point or box into it yields that point or box.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
    pub center: Vector3<f32>,
    pub scale: f32,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vector3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Vector3::new(-f32::MAX, -f32::MAX, -f32::MAX),
            center: Vector3::new(0.0, 0.0, 0.0),
            scale: 1.0,
        }
    }
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        let mut aabb = Self {
            min,
            max,
            ..Self::default()
        };
        aabb.refit();
        aabb
    }

    /// True when no point has ever been merged into this box.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Returns the box transformed by `m`.
    ///
    /// The eight extremal corners of the current box are mapped through the
    /// matrix and refitted into a new axis-aligned box, so the result stays
    /// conservative under rotation. Used for placement and culling, not for
    /// collision response.
    pub fn transformed(&self, m: &Matrix4<f32>) -> Self {
        let mut out = Self::default();
        for corner in self.corners() {
            let p = m.transform_point(Point3::new(corner.x, corner.y, corner.z));
            out.merge_point(Vector3::new(p.x, p.y, p.z));
        }
        out
    }

    /// Grows this box to contain `other`.
    pub fn merge(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.merge_point(other.min);
        self.merge_point(other.max);
    }

    pub fn merge_point(&mut self, p: Vector3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
        self.refit();
    }

    fn corners(&self) -> [Vector3<f32>; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vector3::new(lo.x, lo.y, lo.z),
            Vector3::new(hi.x, lo.y, lo.z),
            Vector3::new(lo.x, hi.y, lo.z),
            Vector3::new(hi.x, hi.y, lo.z),
            Vector3::new(lo.x, lo.y, hi.z),
            Vector3::new(hi.x, lo.y, hi.z),
            Vector3::new(lo.x, hi.y, hi.z),
            Vector3::new(hi.x, hi.y, hi.z),
        ]
    }

    fn refit(&mut self) {
        self.center = (self.min + self.max) * 0.5;
        let extent = self.max - self.min;
        self.scale = extent.x.max(extent.y).max(extent.z);
    }
}
