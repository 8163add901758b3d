use std::collections::HashMap;

use crate::geometry::Rect;
use crate::group::GroupId;
use crate::piece::PieceId;

/// Uniform-grid broad phase keyed by bounding boxes.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size.is_finite() && cell_size > 0.0 {
                cell_size
            } else {
                1.0
            },
            cells: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    fn cell_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let inv = 1.0 / self.cell_size;
        (
            (rect.min.0 * inv).floor() as i32,
            (rect.min.1 * inv).floor() as i32,
            (rect.max.0 * inv).floor() as i32,
            (rect.max.1 * inv).floor() as i32,
        )
    }

    pub fn insert(&mut self, index: usize, rect: &Rect) {
        let (x0, y0, x1, y1) = self.cell_range(rect);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    /// Collects every index whose cells intersect `rect`, sorted and deduplicated.
    pub fn query(&self, rect: &Rect, out: &mut Vec<usize>) {
        out.clear();
        let (x0, y0, x1, y1) = self.cell_range(rect);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ContactEntry {
    pub piece: PieceId,
    pub bounds: Rect,
    pub group: Option<GroupId>,
}

/// Per-piece list of currently touching pieces, rebuilt from scratch every step.
/// Members of the same group never touch each other.
#[derive(Clone, Debug)]
pub struct ContactSet {
    grid: SpatialGrid,
    touching: Vec<Vec<PieceId>>,
    scratch: Vec<usize>,
}

impl ContactSet {
    pub fn new(piece_count: usize, cell_size: f32) -> Self {
        Self {
            grid: SpatialGrid::new(cell_size),
            touching: vec![Vec::new(); piece_count],
            scratch: Vec::new(),
        }
    }

    pub fn rebuild(&mut self, entries: &[ContactEntry], skin: f32) {
        self.grid.clear();
        for list in &mut self.touching {
            list.clear();
        }
        if self.touching.len() < entries.len() {
            self.touching.resize(entries.len(), Vec::new());
        }
        for (index, entry) in entries.iter().enumerate() {
            self.grid.insert(index, &entry.bounds.expand(skin));
        }
        for (index, entry) in entries.iter().enumerate() {
            let reach = entry.bounds.expand(skin);
            self.grid.query(&reach, &mut self.scratch);
            for &other_index in &self.scratch {
                if other_index == index {
                    continue;
                }
                let other = &entries[other_index];
                if entry.group.is_some() && entry.group == other.group {
                    continue;
                }
                if reach.overlaps(&other.bounds) {
                    self.touching[entry.piece.index()].push(other.piece);
                }
            }
        }
        for list in &mut self.touching {
            list.sort_unstable();
        }
    }

    pub fn touching(&self, piece: PieceId) -> &[PieceId] {
        self.touching
            .get(piece.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn are_touching(&self, a: PieceId, b: PieceId) -> bool {
        self.touching(a).binary_search(&b).is_ok()
    }
}
