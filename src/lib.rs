// Front-desk reservation engine: availability matrix, contiguous range
// grouping and the reserve / occupy submission flow against the REST backend.

pub mod api;
pub mod backend;
pub mod calendar;
pub mod client;
pub mod error;
pub mod flow;
pub mod memory;
pub mod ranges;
pub mod selection;
pub mod submission;

// Re-export key types for convenience
pub use api::{ApiError, FrontDeskApi, ReservationMode};
pub use backend::{Guest, ReservationReceipt, ReservationRequest, RoomStatus};
pub use calendar::{AvailabilityMatrix, DayCell, RoomId, RoomInfo, RoomState};
pub use client::{ClientConfig, ClientError, ClientStats, HttpFrontDeskClient, RetryConfig};
pub use error::{FlowError, PreconditionError};
pub use flow::{FlowStage, ReservationFlow, TitularLookup};
pub use memory::InMemoryFrontDesk;
pub use ranges::{group_into_ranges, group_room_dates, ContiguousRange};
pub use selection::{SelectedCell, Selection};
pub use submission::{
    CancellationResult, FailedDate, FailedRange, OccupantRoster, RangeSubmitter,
    SubmissionResult, SucceededRange,
};
