//! Bounding boxes and spheres over indexed point sets.

use glam::Vec3;

/// Points to index. Only the entries listed in `indices` take part; lookup
/// results refer to positions within `indices`, not to `positions`.
#[derive(Debug, Clone, Default)]
pub struct PositionData {
    pub positions: Vec<Vec3>,
    /// Optional per-point radius, parallel to `positions`.
    pub radius: Option<Vec<f32>>,
    pub indices: Vec<usize>,
}

impl PositionData {
    /// Index every point.
    pub fn new(positions: Vec<Vec3>) -> Self {
        let indices = (0..positions.len()).collect();
        Self {
            positions,
            radius: None,
            indices,
        }
    }

    pub fn with_radius(mut self, radius: Vec<f32>) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_indices(mut self, indices: Vec<usize>) -> Self {
        self.indices = indices;
        self
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of the `i`-th indexed point.
    pub fn position(&self, i: usize) -> Vec3 {
        self.positions[self.indices[i]]
    }

    /// Radius of the `i`-th indexed point, 0 without radii.
    pub fn radius_of(&self, i: usize) -> f32 {
        self.radius
            .as_ref()
            .map_or(0.0, |r| r[self.indices[i]])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3D {
    pub min: Vec3,
    pub max: Vec3,
}

impl Box3D {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn expand(&self, delta: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(delta),
            max: self.max + Vec3::splat(delta),
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

impl Default for Box3D {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sphere3D {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere3D {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// True if the spheres overlap after growing both by `margin` in total.
    pub fn overlaps(&self, other: &Sphere3D, margin: f32) -> bool {
        let r = self.radius + other.radius + margin;
        self.center.distance_squared(other.center) <= r * r
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Boundary {
    pub bbox: Box3D,
    pub sphere: Sphere3D,
}

/// Axis-aligned box and enclosing sphere of the indexed points, grown by
/// their radii when present. An empty set gives a zero box at the origin.
pub fn get_boundary(data: &PositionData) -> Boundary {
    if data.is_empty() {
        return Boundary::default();
    }

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    let mut centroid = Vec3::ZERO;
    for i in 0..data.len() {
        let p = data.position(i);
        let r = data.radius_of(i);
        min = min.min(p - Vec3::splat(r));
        max = max.max(p + Vec3::splat(r));
        centroid += p;
    }
    centroid /= data.len() as f32;

    let mut radius_sq = 0.0f32;
    for i in 0..data.len() {
        let d = data.position(i).distance(centroid) + data.radius_of(i);
        radius_sq = radius_sq.max(d * d);
    }

    Boundary {
        bbox: Box3D::new(min, max),
        sphere: Sphere3D::new(centroid, radius_sq.sqrt()),
    }
}
