// Local validation failures. Nothing has been sent to the backend when one of
// these is returned.

use chrono::NaiveDate;
use thiserror::Error;

use crate::api::{ApiError, ReservationMode};
use crate::calendar::{RoomId, RoomState};
use crate::flow::FlowStage;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionError {
    #[error("Nothing is selected")]
    EmptySelection,

    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error("Room {room_id} is already reserved on {date}; cancel the reservation instead")]
    AlreadyReserved { room_id: RoomId, date: NaiveDate },

    #[error("Room {room_id} holds {capacity} guests but {assigned} were assigned")]
    CapacityExceeded {
        room_id: RoomId,
        capacity: u32,
        assigned: usize,
    },

    #[error("Room {0} has no occupants assigned")]
    MissingOccupants(RoomId),

    #[error("Room {0} is not part of the selection")]
    RoomNotSelected(RoomId),

    #[error("Selected reservations span rooms {0:?}; cancel one room at a time")]
    CrossRoomCancellation(Vec<RoomId>),

    #[error("No reserved cells are selected")]
    NoReservedCells,

    #[error("Room {room_id} on {date} is {state:?} and cannot be selected")]
    NotSelectable {
        room_id: RoomId,
        date: NaiveDate,
        state: RoomState,
    },

    #[error("Room {room_id} on {date} is outside the loaded window")]
    OutsideWindow { room_id: RoomId, date: NaiveDate },

    #[error("Operation not allowed while in stage {0:?}")]
    WrongStage(FlowStage),

    #[error("No titular guest has been set")]
    MissingTitular,

    #[error("Operation requires {0:?} mode")]
    ModeMismatch(ReservationMode),
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
