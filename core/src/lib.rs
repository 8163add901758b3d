pub mod action;
pub mod config;
pub mod contact;
pub mod error;
pub mod event;
pub mod geometry;
pub mod group;
pub mod layout;
pub mod motion;
pub mod neighborhood;
pub mod piece;
pub mod scramble;
pub mod table;

pub use action::Gesture;
pub use config::TableConfig;
pub use error::{ConfigError, TableError};
pub use event::TableEvent;
pub use geometry::{Pose, Rect};
pub use group::{Group, GroupId};
pub use motion::{Motion, MotionState, ReleaseOutcome};
pub use piece::{Piece, PieceId, PieceSpec, SolutionPose};
pub use table::{Body, Table};
