use crate::contact::SpatialGrid;
use crate::geometry::{Pose, Rect};
use crate::piece::{PieceId, SolutionPose};

/// Scan directions, in the order neighbors are recorded: up, down, right, left.
pub const ORTHO_DIRS: [(f32, f32); 4] = [(0.0, 1.0), (0.0, -1.0), (1.0, 0.0), (-1.0, 0.0)];

/// Snapshot of the solved layout used to discover each piece's neighbors.
pub struct NeighborhoodScan {
    poses: Vec<Pose>,
    sizes: Vec<(f32, f32)>,
    bounds: Vec<Rect>,
    grid: SpatialGrid,
}

impl NeighborhoodScan {
    pub fn new(poses: Vec<Pose>, sizes: Vec<(f32, f32)>) -> Self {
        let bounds: Vec<Rect> = poses
            .iter()
            .zip(&sizes)
            .map(|(pose, size)| Rect::around_pose(*pose, *size))
            .collect();
        let cell_size = sizes
            .iter()
            .map(|size| size.0.max(size.1))
            .fold(0.0f32, f32::max);
        let mut grid = SpatialGrid::new(cell_size);
        for (index, rect) in bounds.iter().enumerate() {
            grid.insert(index, rect);
        }
        Self {
            poses,
            sizes,
            bounds,
            grid,
        }
    }

    /// First piece hit in `dir` by a ray from the centre of `index` reaching as
    /// far as the piece's bounds diagonal.
    pub fn first_hit(&self, index: usize, dir: (f32, f32), scratch: &mut Vec<usize>) -> Option<usize> {
        let origin = self.poses.get(index)?.position;
        let size = self.sizes[index];
        let reach = size.0.hypot(size.1);
        let end = (origin.0 + dir.0 * reach, origin.1 + dir.1 * reach);
        let sweep = Rect::new(
            (origin.0.min(end.0), origin.1.min(end.1)),
            (origin.0.max(end.0), origin.1.max(end.1)),
        );
        self.grid.query(&sweep, scratch);
        let mut best: Option<(f32, usize)> = None;
        for &candidate in scratch.iter() {
            if candidate == index {
                continue;
            }
            let Some(distance) = self.bounds[candidate].ray_entry(origin, dir, reach) else {
                continue;
            };
            match best {
                Some((best_distance, _)) if distance >= best_distance => {}
                _ => best = Some((distance, candidate)),
            }
        }
        best.map(|(_, candidate)| candidate)
    }

    pub fn solution_poses(&self, index: usize) -> Vec<SolutionPose> {
        let mut scratch = Vec::new();
        let mut neighbors: Vec<usize> = Vec::with_capacity(ORTHO_DIRS.len());
        for dir in ORTHO_DIRS {
            if let Some(hit) = self.first_hit(index, dir, &mut scratch) {
                if !neighbors.contains(&hit) {
                    neighbors.push(hit);
                }
            }
        }
        let Some(own) = self.poses.get(index) else {
            return Vec::new();
        };
        neighbors
            .into_iter()
            .map(|neighbor| SolutionPose {
                piece: PieceId(index),
                neighbor: PieceId(neighbor),
                local_offset: self.poses[neighbor].inverse_transform_point(own.position),
            })
            .collect()
    }
}
