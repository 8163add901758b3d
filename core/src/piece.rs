use std::fmt;

use crate::geometry::Pose;
use crate::group::GroupId;
use crate::motion::Motion;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub usize);

impl PieceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for PieceId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// What the piece generator hands over for each piece: its logical bounds and
/// where it sits in the solved layout (always at identity rotation).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceSpec {
    pub size: (f32, f32),
    pub solved_position: (f32, f32),
}

impl PieceSpec {
    pub fn new(size: (f32, f32), solved_position: (f32, f32)) -> Self {
        Self {
            size,
            solved_position,
        }
    }
}

/// A piece's expected placement relative to one neighbor in the solved layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolutionPose {
    pub piece: PieceId,
    pub neighbor: PieceId,
    /// Position of `piece` in `neighbor`'s local frame when solved.
    pub local_offset: (f32, f32),
}

impl SolutionPose {
    /// Whether `current_offset` (the piece expressed in the neighbor's frame)
    /// and the two world rotations are within `tolerance` of solved.
    pub fn matches(
        &self,
        current_offset: (f32, f32),
        piece_rotation: f32,
        neighbor_rotation: f32,
        tolerance: f32,
    ) -> bool {
        (self.local_offset.0 - current_offset.0).abs() <= tolerance
            && (self.local_offset.1 - current_offset.1).abs() <= tolerance
            && crate::geometry::angle_matches(piece_rotation, neighbor_rotation, tolerance)
    }
}

#[derive(Clone, Debug)]
pub struct Piece {
    pub(crate) id: PieceId,
    pub(crate) size: (f32, f32),
    /// World pose while ungrouped; pose relative to the group frame once grouped.
    pub(crate) pose: Pose,
    pub(crate) motion: Motion,
    pub(crate) solution_poses: Option<Vec<SolutionPose>>,
    pub(crate) group: Option<GroupId>,
}

impl Piece {
    pub(crate) fn new(id: PieceId, spec: PieceSpec) -> Self {
        Self {
            id,
            size: spec.size,
            pose: Pose::new(spec.solved_position, 0.0),
            motion: Motion::new(0.0),
            solution_poses: None,
            group: None,
        }
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn size(&self) -> (f32, f32) {
        self.size
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn solution_poses(&self) -> &[SolutionPose] {
        self.solution_poses.as_deref().unwrap_or(&[])
    }

    pub fn has_neighborhood(&self) -> bool {
        self.solution_poses.is_some()
    }
}
