//! Node error types.

use agora_proto::{RoomDesc, WireError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    /// A lookup by name, index or id matched nothing.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A room-name lookup matched more than one room; the candidates let
    /// the shell disambiguate.
    #[error("{} rooms are named '{name}'", .candidates.len())]
    SameRoomName {
        name: String,
        candidates: Vec<RoomDesc>,
    },

    /// Tried to create a room with no other member.
    #[error("a room needs at least one other member")]
    EmptyRoom,

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The node has shut down and no longer accepts commands.
    #[error("node is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, NodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_room_name_reports_count() {
        let group = "239.1.1.1:9001".parse().unwrap();
        let err = NodeError::SameRoomName {
            name: "lounge".into(),
            candidates: vec![
                RoomDesc::new("lounge", group, vec![]),
                RoomDesc::new("lounge", group, vec![]),
            ],
        };
        assert_eq!(err.to_string(), "2 rooms are named 'lounge'");
    }
}
