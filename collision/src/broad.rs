use rapier3d::parry::utils::hashmap::HashMap;

use crate::types::Bounds2;

/// Integer cell coordinate `(floor(x / cell_size), floor(z / cell_size))`.
pub type CellKey = (i32, i32);

/// Colliders covering more cells than this are kept out of the cells and tested on every
/// query that overlaps their bounds.
pub const MAX_CELLS_PER_COLLIDER: i64 = 4096;

/// Uniform spatial hash over the XZ plane for broad-phase queries over immutable statics.
///
/// Notes:
/// - Each collider index is stored in every cell its XZ bounds overlap, so a query only
///   has to visit the cells under the query rectangle.
/// - Cells are created lazily; empty space costs nothing.
/// - Colliders covering more than `MAX_CELLS_PER_COLLIDER` cells go to a separate oversized list
///   instead, so insertion cost stays bounded.
/// - Indices refer to the registry's collider list, not to anything stored here.
pub struct SpatialGrid {
    inv_cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    oversized: Vec<(usize, Bounds2)>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0, "grid cell size must be positive");
        Self {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::default(),
            oversized: Vec::new(),
        }
    }

    /// Number of non-empty cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of colliders kept in the oversized list.
    #[inline]
    pub fn oversized_count(&self) -> usize {
        self.oversized.len()
    }

    /// Cell containing the world point `(x, z)`.
    #[inline]
    pub fn cell_key(&self, x: f32, z: f32) -> CellKey {
        (
            (x * self.inv_cell_size).floor() as i32,
            (z * self.inv_cell_size).floor() as i32,
        )
    }

    /// Inclusive cell range covered by `bounds`.
    #[inline]
    fn cell_range(&self, bounds: &Bounds2) -> (CellKey, CellKey) {
        (
            self.cell_key(bounds.min_x, bounds.min_z),
            self.cell_key(bounds.max_x, bounds.max_z),
        )
    }

    /// Insert `index` into every cell overlapped by `bounds`.
    pub fn insert(&mut self, index: usize, bounds: &Bounds2) {
        let ((x0, z0), (x1, z1)) = self.cell_range(bounds);
        if span(x0, z0, x1, z1) > MAX_CELLS_PER_COLLIDER {
            self.oversized.push((index, *bounds));
            return;
        }
        for gx in x0..=x1 {
            for gz in z0..=z1 {
                self.cells.entry((gx, gz)).or_default().push(index);
            }
        }
    }

    /// Collect the de-duplicated indices stored in cells overlapping `bounds`.
    ///
    /// Results are sorted ascending, so callers iterate candidates in registration order
    /// and ties resolve deterministically.
    pub fn query_into(&self, bounds: &Bounds2, out: &mut Vec<usize>) {
        out.clear();
        out.extend(
            self.oversized
                .iter()
                .filter(|(_, b)| overlaps(b, bounds))
                .map(|&(index, _)| index),
        );

        let ((x0, z0), (x1, z1)) = self.cell_range(bounds);
        if span(x0, z0, x1, z1) > self.cells.len() as i64 {
            // Huge query rectangle: scanning occupied cells is cheaper than walking the range.
            for (&(gx, gz), ids) in self.cells.iter() {
                if gx >= x0 && gx <= x1 && gz >= z0 && gz <= z1 {
                    out.extend_from_slice(ids);
                }
            }
        } else {
            for gx in x0..=x1 {
                for gz in z0..=z1 {
                    if let Some(ids) = self.cells.get(&(gx, gz)) {
                        out.extend_from_slice(ids);
                    }
                }
            }
        }

        out.sort_unstable();
        out.dedup();
    }

    /// Allocating variant of [`SpatialGrid::query_into`].
    pub fn query(&self, bounds: &Bounds2) -> Vec<usize> {
        let mut out = Vec::new();
        self.query_into(bounds, &mut out);
        out
    }
}

/// Number of cells in an inclusive cell range, saturating for ranges near the `i32` limits.
#[inline]
fn span(x0: i32, z0: i32, x1: i32, z1: i32) -> i64 {
    let w = (i64::from(x1) - i64::from(x0) + 1).max(0);
    let d = (i64::from(z1) - i64::from(z0) + 1).max(0);
    w.saturating_mul(d)
}

#[inline]
fn overlaps(a: &Bounds2, b: &Bounds2) -> bool {
    a.min_x <= b.max_x && a.max_x >= b.min_x && a.min_z <= b.max_z && a.max_z >= b.min_z
}
