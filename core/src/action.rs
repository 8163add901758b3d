use crate::piece::PieceId;

/// A pointer event already translated into world space, addressed to the
/// piece under the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Press { piece: PieceId, point: (f32, f32) },
    Drag { piece: PieceId, point: (f32, f32) },
    Release { piece: PieceId, point: (f32, f32) },
}

