use serde::{Deserialize, Serialize};

pub fn normalize_angle(mut angle: f32) -> f32 {
    angle %= 360.0;
    if angle < 0.0 {
        angle += 360.0;
    }
    angle
}

pub fn angle_delta(target: f32, current: f32) -> f32 {
    let mut diff = normalize_angle(target - current);
    if diff > 180.0 {
        diff -= 360.0;
    }
    diff
}

pub fn angle_matches(a: f32, b: f32, tolerance: f32) -> bool {
    angle_delta(a, b).abs() <= tolerance
}

pub fn rotate_vec(x: f32, y: f32, angle_deg: f32) -> (f32, f32) {
    let theta = angle_deg.to_radians();
    let (sin, cos) = theta.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

pub fn rotate_point(point: (f32, f32), origin: (f32, f32), angle_deg: f32) -> (f32, f32) {
    let (rx, ry) = rotate_vec(point.0 - origin.0, point.1 - origin.1, angle_deg);
    (origin.0 + rx, origin.1 + ry)
}

/// Steps `current` toward `target` by at most `max_step`, never overshooting.
pub fn move_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_step {
        target
    } else {
        current + max_step.copysign(diff)
    }
}

pub fn round_to_step(angle: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return angle;
    }
    (angle / step).round() * step
}

/// A 2D placement: position in the plane and rotation about the perpendicular axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub position: (f32, f32),
    pub rotation: f32,
}

impl Pose {
    pub fn new(position: (f32, f32), rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Maps a point expressed in this pose's local frame into world space.
    pub fn transform_point(&self, local: (f32, f32)) -> (f32, f32) {
        let (rx, ry) = rotate_vec(local.0, local.1, self.rotation);
        (self.position.0 + rx, self.position.1 + ry)
    }

    /// Maps a world-space point into this pose's local frame.
    pub fn inverse_transform_point(&self, world: (f32, f32)) -> (f32, f32) {
        rotate_vec(
            world.0 - self.position.0,
            world.1 - self.position.1,
            -self.rotation,
        )
    }

    /// Composes a child pose given relative to this one.
    pub fn compose(&self, local: Pose) -> Pose {
        Pose {
            position: self.transform_point(local.position),
            rotation: self.rotation + local.rotation,
        }
    }

    /// Expresses a world pose relative to this one; inverse of [`Pose::compose`].
    pub fn relative(&self, world: Pose) -> Pose {
        Pose {
            position: self.inverse_transform_point(world.position),
            rotation: world.rotation - self.rotation,
        }
    }
}

/// Axis-aligned rectangle, `min` inclusive corner to `max` corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: (f32, f32),
    pub max: (f32, f32),
}

impl Rect {
    pub fn new(min: (f32, f32), max: (f32, f32)) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: (f32, f32), size: (f32, f32)) -> Self {
        let half = (size.0 * 0.5, size.1 * 0.5);
        Self {
            min: (center.0 - half.0, center.1 - half.1),
            max: (center.0 + half.0, center.1 + half.1),
        }
    }

    /// Bounding box of a `size` rectangle centred on `pose` and rotated with it.
    pub fn around_pose(pose: Pose, size: (f32, f32)) -> Self {
        let (sin, cos) = pose.rotation.to_radians().sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        let extent = (
            size.0 * cos + size.1 * sin,
            size.0 * sin + size.1 * cos,
        );
        Self::from_center(pose.position, extent)
    }

    pub fn width(&self) -> f32 {
        self.max.0 - self.min.0
    }

    pub fn height(&self) -> f32 {
        self.max.1 - self.min.1
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min.0 + self.max.0) * 0.5,
            (self.min.1 + self.max.1) * 0.5,
        )
    }

    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: (self.min.0 - margin, self.min.1 - margin),
            max: (self.max.0 + margin, self.max.1 + margin),
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.0 <= other.max.0
            && other.min.0 <= self.max.0
            && self.min.1 <= other.max.1
            && other.min.1 <= self.max.1
    }

    pub fn contains(&self, point: (f32, f32)) -> bool {
        point.0 >= self.min.0
            && point.0 <= self.max.0
            && point.1 >= self.min.1
            && point.1 <= self.max.1
    }

    pub fn clamp(&self, point: (f32, f32)) -> (f32, f32) {
        (
            point.0.clamp(self.min.0, self.max.0.max(self.min.0)),
            point.1.clamp(self.min.1, self.max.1.max(self.min.1)),
        )
    }

    /// Distance along `dir` (unit length) from `origin` to where the ray enters
    /// this rectangle, if it does so within `max_distance`. A ray starting inside
    /// the rectangle reports 0.
    pub fn ray_entry(&self, origin: (f32, f32), dir: (f32, f32), max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = max_distance;
        for (o, d, lo, hi) in [
            (origin.0, dir.0, self.min.0, self.max.0),
            (origin.1, dir.1, self.min.1, self.max.1),
        ] {
            if d == 0.0 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let mut t0 = (lo - o) * inv;
            let mut t1 = (hi - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}
