use crate::geometry::Rect;

pub fn splitmix32(mut value: u32) -> u32 {
    value = value.wrapping_add(0x9E37_79B9);
    let mut z = value;
    z = (z ^ (z >> 16)).wrapping_mul(0x85EB_CA6B);
    z = (z ^ (z >> 13)).wrapping_mul(0xC2B2_AE35);
    z ^ (z >> 16)
}

/// Uniform in `[0, 1)`, fully determined by `seed` and `salt`.
pub fn rand_unit(seed: u32, salt: u32) -> f32 {
    let top = splitmix32(seed ^ salt) >> 8;
    top as f32 / ((1u32 << 24) as f32)
}

pub fn rand_range(seed: u32, salt: u32, min: f32, max: f32) -> f32 {
    min + (max - min) * rand_unit(seed, salt)
}

/// Piece centres spread over `area`, shrunk by half a piece so every piece
/// lies inside it.
pub fn positions(seed: u32, total: usize, area: Rect, piece_size: (f32, f32)) -> Vec<(f32, f32)> {
    let inner = area.expand(-0.5 * piece_size.0.max(piece_size.1));
    let (min, max) = if inner.width() >= 0.0 && inner.height() >= 0.0 {
        (inner.min, inner.max)
    } else {
        let center = area.center();
        (center, center)
    };
    (0..total)
        .map(|id| {
            let salt = (id as u32) << 1;
            (
                rand_range(seed, salt, min.0, max.0),
                rand_range(seed, salt + 1, min.1, max.1),
            )
        })
        .collect()
}

/// Rotations drawn from the multiples of `increment` below 360.
pub fn quarter_turns(seed: u32, total: usize, increment: f32) -> Vec<f32> {
    let steps = if increment > 0.0 {
        ((360.0 / increment).round() as u32).max(1)
    } else {
        1
    };
    (0..total)
        .map(|id| {
            let salt = 0xC001_u32.wrapping_add(id as u32);
            let step = ((rand_unit(seed, salt) * steps as f32) as u32).min(steps - 1);
            step as f32 * increment.max(0.0)
        })
        .collect()
}
