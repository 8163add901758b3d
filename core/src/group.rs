use std::fmt;

use crate::geometry::Pose;
use crate::motion::Motion;
use crate::piece::PieceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {}", self.0)
    }
}

/// A rigid cluster of interlocked pieces. Members store their pose relative
/// to `pose`, so moving or turning the group moves every member.
#[derive(Clone, Debug)]
pub struct Group {
    pub(crate) id: GroupId,
    pub(crate) pose: Pose,
    pub(crate) motion: Motion,
    pub(crate) members: Vec<PieceId>,
}

impl Group {
    pub(crate) fn new(id: GroupId, pose: Pose, depth: f32, unstacked_depth: f32) -> Self {
        let mut motion = Motion::new(depth);
        motion.unstacked_depth = unstacked_depth;
        Self {
            id,
            pose,
            motion,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn depth(&self) -> f32 {
        self.motion.depth
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn members(&self) -> &[PieceId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, piece: PieceId) -> bool {
        self.members.contains(&piece)
    }

    /// Returns false if the piece was already a member.
    pub(crate) fn insert(&mut self, piece: PieceId) -> bool {
        if self.contains(piece) {
            return false;
        }
        self.members.push(piece);
        true
    }
}
