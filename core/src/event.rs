use crate::group::GroupId;
use crate::piece::PieceId;
use crate::table::Body;

/// Notable changes on the table, drained with `Table::take_events`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TableEvent {
    GroupCreated {
        group: GroupId,
    },
    Interlocked {
        piece: PieceId,
        neighbor: PieceId,
        group: GroupId,
    },
    GroupsMerged {
        into: GroupId,
        from: GroupId,
    },
    RotationSettled {
        body: Body,
        rotation: f32,
    },
    /// Emitted once, when the last two bodies join.
    Completed,
}
