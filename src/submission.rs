// Range submission and cancellation
// One backend request per contiguous range (or per cancelled night), all in
// flight at once, each bounded by its own timeout. Every outcome is kept.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::api::{ApiError, FrontDeskApi, ReservationMode};
use crate::backend::{Guest, ReservationReceipt, ReservationRequest};
use crate::calendar::{RoomId, RoomState};
use crate::error::PreconditionError;
use crate::ranges::{group_into_ranges, ContiguousRange};
use crate::selection::Selection;

// Occupants per room, required in OCCUPY mode.
pub type OccupantRoster = BTreeMap<RoomId, Vec<Guest>>;

#[derive(Debug, Clone, PartialEq)]
pub struct SucceededRange {
    pub range: ContiguousRange,
    pub receipt: ReservationReceipt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedRange {
    pub range: ContiguousRange,
    pub error: ApiError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub mode: ReservationMode,
    pub succeeded: Vec<SucceededRange>,
    pub failed: Vec<FailedRange>,
}

impl SubmissionResult {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn failed_ranges(&self) -> Vec<ContiguousRange> {
        self.failed.iter().map(|f| f.range).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedDate {
    pub date: NaiveDate,
    pub error: ApiError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancellationResult {
    pub room_id: RoomId,
    pub cleared: Vec<NaiveDate>,
    pub failed: Vec<FailedDate>,
}

impl CancellationResult {
    // Succeeds once any night was cleared. Failed nights stay listed.
    pub fn is_success(&self) -> bool {
        !self.cleared.is_empty()
    }

    pub fn cleared_count(&self) -> usize {
        self.cleared.len()
    }
}

pub struct RangeSubmitter<A> {
    api: A,
    request_timeout: Duration,
}

impl<A: FrontDeskApi> RangeSubmitter<A> {
    pub fn new(api: A, request_timeout: Duration) -> Self {
        Self {
            api,
            request_timeout,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Checks everything that can be checked without the backend.
    ///
    /// RESERVE refuses cells that are already reserved, those go through
    /// cancellation. OCCUPY needs a roster for every selected room, no larger
    /// than the room's capacity.
    pub fn validate(
        selection: &Selection,
        titular: &Guest,
        mode: ReservationMode,
        roster: &OccupantRoster,
    ) -> Result<(), PreconditionError> {
        if selection.is_empty() {
            return Err(PreconditionError::EmptySelection);
        }
        if titular.dni.trim().is_empty() {
            return Err(PreconditionError::MissingTitular);
        }

        match mode {
            ReservationMode::Reserve => {
                if let Some(cell) = selection
                    .cells()
                    .into_iter()
                    .find(|cell| cell.original_state == RoomState::Reserved)
                {
                    return Err(PreconditionError::AlreadyReserved {
                        room_id: cell.room_id,
                        date: cell.date,
                    });
                }
            }
            ReservationMode::Occupy => {
                for room_id in selection.room_ids() {
                    let occupants = roster.get(&room_id).map_or(0, |o| o.len());
                    if occupants == 0 {
                        return Err(PreconditionError::MissingOccupants(room_id));
                    }
                    let capacity = selection.capacity_of(room_id).unwrap_or(0);
                    if occupants > capacity as usize {
                        return Err(PreconditionError::CapacityExceeded {
                            room_id,
                            capacity,
                            assigned: occupants,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    pub async fn submit_ranges(
        &self,
        selection: &Selection,
        titular: &Guest,
        mode: ReservationMode,
        roster: &OccupantRoster,
    ) -> Result<SubmissionResult, PreconditionError> {
        Self::validate(selection, titular, mode, roster)?;

        let ranges: Vec<ContiguousRange> = group_into_ranges(selection.iter())
            .into_values()
            .flatten()
            .collect();
        info!(
            ?mode,
            cells = selection.len(),
            ranges = ranges.len(),
            "submitting reservation ranges"
        );

        let outcomes = join_all(ranges.into_iter().map(|range| async move {
            let occupants = match mode {
                ReservationMode::Reserve => None,
                ReservationMode::Occupy => roster.get(&range.room_id).map(|o| o.as_slice()),
            };
            let request = ReservationRequest::for_range(&range, titular, occupants);
            debug!(%range, "sending range request");
            let outcome = self.bounded(self.api.create_range(mode, &request)).await;
            (range, outcome)
        }))
        .await;

        let mut result = SubmissionResult {
            mode,
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for (range, outcome) in outcomes {
            match outcome {
                Ok(receipt) => result.succeeded.push(SucceededRange { range, receipt }),
                Err(error) => {
                    warn!(%range, %error, "range request failed");
                    result.failed.push(FailedRange { range, error });
                }
            }
        }

        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "range submission finished"
        );
        Ok(result)
    }

    pub async fn cancel_selected_reservations(
        &self,
        selection: &Selection,
    ) -> Result<CancellationResult, PreconditionError> {
        let reserved = selection.reserved_cells();
        if reserved.is_empty() {
            return Err(PreconditionError::NoReservedCells);
        }

        let rooms: BTreeSet<RoomId> = reserved.iter().map(|cell| cell.room_id).collect();
        if rooms.len() > 1 {
            return Err(PreconditionError::CrossRoomCancellation(
                rooms.into_iter().collect(),
            ));
        }
        let room_id = reserved[0].room_id;
        info!(room_id, nights = reserved.len(), "cancelling reserved nights");

        let outcomes = join_all(reserved.iter().map(|cell| {
            let date = cell.date;
            async move {
                let outcome = self.bounded(self.api.cancel_date(room_id, date)).await;
                (date, outcome)
            }
        }))
        .await;

        let mut result = CancellationResult {
            room_id,
            cleared: Vec::new(),
            failed: Vec::new(),
        };
        for (date, outcome) in outcomes {
            match outcome {
                Ok(()) => result.cleared.push(date),
                Err(error) => {
                    warn!(room_id, %date, %error, "night cancellation failed");
                    result.failed.push(FailedDate { date, error });
                }
            }
        }

        Ok(result)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ApiError::Timeout(self.request_timeout.as_millis() as u64)),
        }
    }
}
