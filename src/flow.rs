// Reservation flow
// One state machine for both the reserve-or-cancel screen and the occupy
// screen: pick a window, pick cells, fill in the titular, submit. The mode
// decides which backend endpoint the ranges go to and whether a roster is
// needed.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::api::{FrontDeskApi, ReservationMode};
use crate::backend::Guest;
use crate::calendar::{AvailabilityMatrix, RoomId};
use crate::error::{FlowError, PreconditionError};
use crate::selection::Selection;
use crate::submission::{CancellationResult, OccupantRoster, RangeSubmitter, SubmissionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    SelectDates,
    SelectCells,
    FillTitular,
    Submitted,
}

// Outcome of looking a titular up by document number.
#[derive(Debug, Clone, PartialEq)]
pub enum TitularLookup {
    Existing(Guest),
    // Unknown guest: a blank record carrying only the document number.
    New(Guest),
}

#[derive(Debug)]
pub struct ReservationFlow {
    mode: ReservationMode,
    stage: FlowStage,
    window: Option<(NaiveDate, NaiveDate)>,
    matrix: Option<AvailabilityMatrix>,
    selection: Selection,
    titular: Option<Guest>,
    roster: OccupantRoster,
}

impl ReservationFlow {
    pub fn new(mode: ReservationMode) -> Self {
        Self {
            mode,
            stage: FlowStage::SelectDates,
            window: None,
            matrix: None,
            selection: Selection::new(),
            titular: None,
            roster: OccupantRoster::new(),
        }
    }

    pub fn mode(&self) -> ReservationMode {
        self.mode
    }

    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    pub fn matrix(&self) -> Option<&AvailabilityMatrix> {
        self.matrix.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn titular(&self) -> Option<&Guest> {
        self.titular.as_ref()
    }

    pub fn roster(&self) -> &OccupantRoster {
        &self.roster
    }

    fn expect_stage(&self, allowed: &[FlowStage]) -> Result<(), PreconditionError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(PreconditionError::WrongStage(self.stage))
        }
    }

    fn expect_mode(&self, mode: ReservationMode) -> Result<(), PreconditionError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(PreconditionError::ModeMismatch(mode))
        }
    }

    pub async fn load_window<A>(
        &mut self,
        api: &A,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(), FlowError>
    where
        A: FrontDeskApi + ?Sized,
    {
        self.expect_stage(&[
            FlowStage::SelectDates,
            FlowStage::SelectCells,
            FlowStage::Submitted,
        ])?;

        let matrix = AvailabilityMatrix::fetch(api, from, to).await?;
        self.window = Some((from, to));
        self.matrix = Some(matrix);
        self.selection.clear();
        self.titular = None;
        self.roster.clear();
        self.stage = FlowStage::SelectCells;
        info!(mode = ?self.mode, %from, %to, "availability window loaded");
        Ok(())
    }

    // Re-fetch the current window, e.g. after a failed refresh.
    pub async fn reload<A>(&mut self, api: &A) -> Result<(), FlowError>
    where
        A: FrontDeskApi + ?Sized,
    {
        let (from, to) = self
            .window
            .ok_or(PreconditionError::WrongStage(self.stage))?;
        self.load_window(api, from, to).await
    }

    pub fn toggle(&mut self, room_id: RoomId, date: NaiveDate) -> Result<bool, PreconditionError> {
        self.expect_stage(&[FlowStage::SelectCells])?;
        let matrix = self
            .matrix
            .as_ref()
            .ok_or(PreconditionError::OutsideWindow { room_id, date })?;
        self.selection.toggle(matrix, room_id, date)
    }

    pub fn proceed_to_titular(&mut self) -> Result<(), PreconditionError> {
        self.expect_stage(&[FlowStage::SelectCells])?;
        if self.selection.is_empty() {
            return Err(PreconditionError::EmptySelection);
        }
        self.stage = FlowStage::FillTitular;
        Ok(())
    }

    // Go back to editing the selection; titular and roster are kept.
    pub fn back_to_selection(&mut self) -> Result<(), PreconditionError> {
        self.expect_stage(&[FlowStage::FillTitular])?;
        self.stage = FlowStage::SelectCells;
        Ok(())
    }

    // An unknown document number clears any titular from an earlier lookup;
    // the new guest must be completed through `set_titular`.
    pub async fn lookup_titular<A>(
        &mut self,
        api: &A,
        dni: &str,
    ) -> Result<TitularLookup, FlowError>
    where
        A: FrontDeskApi + ?Sized,
    {
        self.expect_stage(&[FlowStage::FillTitular])?;
        let dni = dni.trim();
        if dni.is_empty() {
            return Err(PreconditionError::MissingTitular.into());
        }

        match api.find_guest_by_dni(dni).await? {
            Some(guest) => {
                self.titular = Some(guest.clone());
                Ok(TitularLookup::Existing(guest))
            }
            None => {
                self.titular = None;
                Ok(TitularLookup::New(Guest {
                    dni: dni.to_string(),
                    ..Default::default()
                }))
            }
        }
    }

    pub fn set_titular(&mut self, guest: Guest) -> Result<(), PreconditionError> {
        self.expect_stage(&[FlowStage::FillTitular])?;
        if guest.dni.trim().is_empty() {
            return Err(PreconditionError::MissingTitular);
        }
        self.titular = Some(guest);
        Ok(())
    }

    pub fn assign_occupants(
        &mut self,
        room_id: RoomId,
        occupants: Vec<Guest>,
    ) -> Result<(), PreconditionError> {
        self.expect_mode(ReservationMode::Occupy)?;
        self.expect_stage(&[FlowStage::FillTitular])?;
        if !self.selection.room_ids().contains(&room_id) {
            return Err(PreconditionError::RoomNotSelected(room_id));
        }
        self.roster.insert(room_id, occupants);
        Ok(())
    }

    pub async fn submit<A: FrontDeskApi>(
        &mut self,
        submitter: &RangeSubmitter<A>,
    ) -> Result<SubmissionResult, FlowError> {
        self.expect_stage(&[FlowStage::FillTitular])?;
        let titular = self
            .titular
            .as_ref()
            .ok_or(PreconditionError::MissingTitular)?;

        let result = submitter
            .submit_ranges(&self.selection, titular, self.mode, &self.roster)
            .await?;

        self.titular = None;
        self.roster.clear();
        self.refresh(submitter.api()).await;
        self.stage = FlowStage::Submitted;
        Ok(result)
    }

    pub async fn cancel_selected<A: FrontDeskApi>(
        &mut self,
        submitter: &RangeSubmitter<A>,
    ) -> Result<CancellationResult, FlowError> {
        self.expect_mode(ReservationMode::Reserve)?;
        self.expect_stage(&[FlowStage::SelectCells])?;

        let result = submitter
            .cancel_selected_reservations(&self.selection)
            .await?;
        self.refresh(submitter.api()).await;
        Ok(result)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    // Drops the selection and reloads the whole window.
    async fn refresh<A: FrontDeskApi + ?Sized>(&mut self, api: &A) {
        self.selection.clear();
        let Some((from, to)) = self.window else {
            return;
        };

        match AvailabilityMatrix::fetch(api, from, to).await {
            Ok(matrix) => self.matrix = Some(matrix),
            Err(error) => {
                warn!(%error, "could not refresh availability after write");
                self.matrix = None;
            }
        }
    }
}
