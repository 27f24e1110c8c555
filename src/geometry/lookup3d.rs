//! Uniform bucket grid for 3D range and nearest-neighbour queries.
//!
//! Points are sorted into cubic cells sized so that a cell holds about
//! [`ELEMENTS_PER_CELL`] points on average. A query visits only the cells
//! overlapping the query sphere.

use glam::Vec3;

use super::boundary::{get_boundary, Boundary, PositionData};

const ELEMENTS_PER_CELL: f32 = 32.0;
const MIN_CELL_SIZE: f32 = 0.1;
const MAX_CELLS: usize = 1 << 22;

/// Hits of a query. `indices` are positions within the lookup's
/// [`PositionData::indices`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResult {
    pub count: usize,
    pub indices: Vec<usize>,
    pub squared_distances: Vec<f32>,
}

impl LookupResult {
    fn push(&mut self, index: usize, squared_distance: f32) {
        self.indices.push(index);
        self.squared_distances.push(squared_distance);
        self.count += 1;
    }

    /// Reorder hits by ascending distance.
    pub fn sort_by_distance(&mut self) {
        let mut order: Vec<usize> = (0..self.count).collect();
        order.sort_by(|&a, &b| self.squared_distances[a].total_cmp(&self.squared_distances[b]));
        self.indices = order.iter().map(|&i| self.indices[i]).collect();
        self.squared_distances = order.iter().map(|&i| self.squared_distances[i]).collect();
    }

    fn truncate(&mut self, k: usize) {
        self.indices.truncate(k);
        self.squared_distances.truncate(k);
        self.count = self.indices.len();
    }
}

#[derive(Debug, Clone)]
pub struct GridLookup3D {
    data: PositionData,
    boundary: Boundary,
    origin: Vec3,
    cell_size: f32,
    dims: [usize; 3],
    /// CSR layout: items of cell `c` are `cell_items[cell_offsets[c]..cell_offsets[c + 1]]`.
    cell_offsets: Vec<usize>,
    cell_items: Vec<usize>,
    max_radius: f32,
}

fn cell_size_for(size: Vec3, count: usize) -> f32 {
    if count == 0 {
        return 1.0;
    }
    let s = size.max(Vec3::splat(MIN_CELL_SIZE));
    let volume = s.x * s.y * s.z;
    (volume * ELEMENTS_PER_CELL / count as f32)
        .cbrt()
        .max(MIN_CELL_SIZE)
}

fn dims_for(size: Vec3, cell: f32) -> [usize; 3] {
    let d = |extent: f32| (extent / cell).floor() as usize + 1;
    [d(size.x), d(size.y), d(size.z)]
}

impl GridLookup3D {
    pub fn new(data: PositionData) -> Self {
        let boundary = get_boundary(&data);
        let n = data.len();
        let max_radius = (0..n).map(|i| data.radius_of(i)).fold(0.0f32, f32::max);

        let origin = boundary.bbox.min;
        let size = boundary.bbox.size();
        let mut cell_size = cell_size_for(size, n);
        let mut dims = dims_for(size, cell_size);
        while dims.iter().product::<usize>() > MAX_CELLS {
            cell_size *= 2.0;
            dims = dims_for(size, cell_size);
        }

        let mut lookup = Self {
            data,
            boundary,
            origin,
            cell_size,
            dims,
            cell_offsets: Vec::new(),
            cell_items: Vec::new(),
            max_radius,
        };
        lookup.fill_cells();
        log::trace!(
            "grid lookup: {n} points, cell {:.2}, dims {:?}",
            lookup.cell_size,
            lookup.dims
        );
        lookup
    }

    fn fill_cells(&mut self) {
        let cell_count: usize = self.dims.iter().product();
        let n = self.data.len();
        let cells: Vec<usize> = (0..n)
            .map(|i| self.cell_index(self.cell_of(self.data.position(i))))
            .collect();

        let mut offsets = vec![0usize; cell_count + 1];
        for &c in &cells {
            offsets[c + 1] += 1;
        }
        for c in 0..cell_count {
            offsets[c + 1] += offsets[c];
        }
        let mut fill = offsets.clone();
        let mut items = vec![0usize; n];
        for (i, &c) in cells.iter().enumerate() {
            items[fill[c]] = i;
            fill[c] += 1;
        }
        self.cell_offsets = offsets;
        self.cell_items = items;
    }

    fn cell_of(&self, p: Vec3) -> [usize; 3] {
        let rel = (p - self.origin) / self.cell_size;
        let clamp = |v: f32, dim: usize| (v.floor().max(0.0) as usize).min(dim - 1);
        [
            clamp(rel.x, self.dims[0]),
            clamp(rel.y, self.dims[1]),
            clamp(rel.z, self.dims[2]),
        ]
    }

    fn cell_index(&self, [x, y, z]: [usize; 3]) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    /// Cell range overlapping the cube around `p`, or `None` if it misses
    /// the grid entirely.
    fn cell_range(&self, p: Vec3, reach: f32) -> Option<([usize; 3], [usize; 3])> {
        let lo = ((p - Vec3::splat(reach) - self.origin) / self.cell_size).floor();
        let hi = ((p + Vec3::splat(reach) - self.origin) / self.cell_size).floor();
        let mut min = [0usize; 3];
        let mut max = [0usize; 3];
        for axis in 0..3 {
            let dim = self.dims[axis] as f32;
            if hi[axis] < 0.0 || lo[axis] >= dim {
                return None;
            }
            min[axis] = lo[axis].max(0.0) as usize;
            max[axis] = (hi[axis].min(dim - 1.0)) as usize;
        }
        Some((min, max))
    }

    /// Visit hits; stops early when `on_hit` returns false.
    fn query(&self, p: Vec3, radius: f32, mut on_hit: impl FnMut(usize, f32) -> bool) {
        if self.data.is_empty() {
            return;
        }
        let Some((min, max)) = self.cell_range(p, radius + self.max_radius) else {
            return;
        };
        let radius_aware = self.data.radius.is_some();
        for z in min[2]..=max[2] {
            for y in min[1]..=max[1] {
                for x in min[0]..=max[0] {
                    let c = self.cell_index([x, y, z]);
                    for &i in &self.cell_items[self.cell_offsets[c]..self.cell_offsets[c + 1]] {
                        let d2 = self.data.position(i).distance_squared(p);
                        let r = if radius_aware {
                            radius + self.data.radius_of(i)
                        } else {
                            radius
                        };
                        if d2 <= r * r && !on_hit(i, d2) {
                            return;
                        }
                    }
                }
            }
        }
    }

    /// All points within `radius` of `(x, y, z)`. With per-point radii a
    /// point is a hit when its distance is at most `radius + r_i`.
    pub fn find(&self, x: f32, y: f32, z: f32, radius: f32) -> LookupResult {
        let mut result = LookupResult::default();
        self.query(Vec3::new(x, y, z), radius, |i, d2| {
            result.push(i, d2);
            true
        });
        result
    }

    /// Whether any point lies within `radius`.
    pub fn check(&self, x: f32, y: f32, z: f32, radius: f32) -> bool {
        let mut found = false;
        self.query(Vec3::new(x, y, z), radius, |_, _| {
            found = true;
            false
        });
        found
    }

    /// The `k` closest points, nearest first.
    pub fn nearest(&self, x: f32, y: f32, z: f32, k: usize) -> LookupResult {
        if k == 0 || self.data.is_empty() {
            return LookupResult::default();
        }
        let p = Vec3::new(x, y, z);
        let bbox = &self.boundary.bbox;
        let covers_all = p.distance(bbox.center()) + bbox.size().length() * 0.5;
        let mut radius = self.cell_size;
        loop {
            let mut result = self.find(x, y, z, radius);
            result.sort_by_distance();
            let complete = result.count >= k && result.squared_distances[k - 1] <= radius * radius;
            if complete || radius > covers_all + self.max_radius {
                result.truncate(k);
                return result;
            }
            radius *= 2.0;
        }
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn data(&self) -> &PositionData {
        &self.data
    }
}
