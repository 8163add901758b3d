use crate::piece::PieceSpec;

pub const OVERLAP_MAX: f32 = 0.5;

/// Pixel-space bounding box of one piece in a colour-key map, max exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelBounds {
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Solved rectangular arrangement, row-major from the bottom-left piece. The
/// bounds grow by `overlap` (a ratio of the cell, clamped to `OVERLAP_MAX`) on
/// every side, so neighbouring bounds overlap the way tabbed pieces do.
pub fn grid(cols: usize, rows: usize, piece_width: f32, piece_height: f32, overlap: f32) -> Vec<PieceSpec> {
    let overlap = overlap.clamp(0.0, OVERLAP_MAX);
    let size = (
        piece_width * (1.0 + overlap * 2.0),
        piece_height * (1.0 + overlap * 2.0),
    );
    let mut specs = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            let center = (
                (col as f32 + 0.5) * piece_width,
                (row as f32 + 0.5) * piece_height,
            );
            specs.push(PieceSpec::new(size, center));
        }
    }
    specs
}

/// Converts per-piece pixel bounds of a colour-key map into world-space specs.
/// Every piece shares one scale, picked so the largest piece extent maps to one
/// world unit. Zero-area boxes are skipped.
pub fn from_pixel_bounds(
    map_width: u32,
    map_height: u32,
    bounds: &[PixelBounds],
    origin: (f32, f32),
) -> Vec<PieceSpec> {
    if map_width == 0 || map_height == 0 {
        return Vec::new();
    }
    let map_w = map_width as f32;
    let map_h = map_height as f32;
    let tiling = bounds
        .iter()
        .filter(|b| !b.is_empty())
        .map(|b| (b.width() as f32 / map_w).max(b.height() as f32 / map_h))
        .fold(0.0f32, f32::max);
    if tiling <= 0.0 {
        return Vec::new();
    }
    let scale = 1.0 / (map_w * tiling);
    bounds
        .iter()
        .filter(|b| !b.is_empty())
        .map(|b| {
            let center = (
                origin.0 + (b.min_x + b.max_x) as f32 * 0.5 * scale,
                origin.1 + (b.min_y + b.max_y) as f32 * 0.5 * scale,
            );
            let size = (b.width() as f32 * scale, b.height() as f32 * scale);
            PieceSpec::new(size, center)
        })
        .collect()
}
