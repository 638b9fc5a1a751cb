// Availability matrix: the per-room, per-day occupancy snapshot returned by
// the backend for one queried window.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::FrontDeskApi;
use crate::backend::RoomStatus;
use crate::error::{FlowError, PreconditionError};

pub type RoomId = i64;

// Occupancy state of a room on a given day. The backend speaks Spanish on the
// wire; the English names are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RoomState {
    #[serde(rename = "DISPONIBLE", alias = "AVAILABLE")]
    Available,
    #[serde(rename = "RESERVADA", alias = "RESERVED")]
    Reserved,
    #[serde(rename = "OCUPADA", alias = "OCCUPIED")]
    Occupied,
    #[serde(rename = "MANTENIMIENTO", alias = "MAINTENANCE")]
    Maintenance,
    #[serde(rename = "LIMPIEZA", alias = "CLEANING")]
    Cleaning,
}

impl RoomState {
    /// Whether a front-desk user may pick this cell. Occupied rooms and rooms
    /// under maintenance are never selectable.
    pub fn is_selectable(self) -> bool {
        !matches!(self, RoomState::Occupied | RoomState::Maintenance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub state: RoomState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub id: RoomId,
    pub number: u32,
    pub room_type: String,
    pub capacity: u32,
}

#[derive(Debug, Clone)]
pub struct AvailabilityMatrix {
    from: NaiveDate,
    to: NaiveDate,
    rooms: BTreeMap<RoomId, RoomInfo>,
    cells: HashMap<(RoomId, NaiveDate), DayCell>,
}

impl AvailabilityMatrix {
    // Query the backend for every room's state between `from` and `to`
    // (both inclusive).
    pub async fn fetch<A>(api: &A, from: NaiveDate, to: NaiveDate) -> Result<Self, FlowError>
    where
        A: FrontDeskApi + ?Sized,
    {
        // The last day needs a check-out date after it.
        if from > to || to.succ_opt().is_none() {
            return Err(PreconditionError::InvalidDateRange { from, to }.into());
        }

        let statuses = api.room_states(from, to).await?;
        debug!(rooms = statuses.len(), %from, %to, "loaded room states");
        Ok(Self::from_statuses(from, to, statuses))
    }

    pub fn from_statuses(from: NaiveDate, to: NaiveDate, statuses: Vec<RoomStatus>) -> Self {
        let mut rooms = BTreeMap::new();
        let mut cells = HashMap::new();

        for status in statuses {
            for day in &status.days {
                if day.date < from || day.date > to {
                    debug!(room_id = status.id, date = %day.date, "ignoring day outside window");
                    continue;
                }
                cells.insert(
                    (status.id, day.date),
                    DayCell {
                        room_id: status.id,
                        date: day.date,
                        state: day.state,
                    },
                );
            }

            rooms.insert(
                status.id,
                RoomInfo {
                    id: status.id,
                    number: status.number,
                    room_type: status.room_type,
                    capacity: status.capacity,
                },
            );
        }

        Self {
            from,
            to,
            rooms,
            cells,
        }
    }

    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        (self.from, self.to)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |date| *date <= to)
    }

    // Rooms ordered by id.
    pub fn rooms(&self) -> impl Iterator<Item = &RoomInfo> {
        self.rooms.values()
    }

    pub fn room(&self, room_id: RoomId) -> Option<&RoomInfo> {
        self.rooms.get(&room_id)
    }

    pub fn cell(&self, room_id: RoomId, date: NaiveDate) -> Option<&DayCell> {
        self.cells.get(&(room_id, date))
    }

    pub fn state(&self, room_id: RoomId, date: NaiveDate) -> Option<RoomState> {
        self.cell(room_id, date).map(|cell| cell.state)
    }

    pub fn count_in_state(&self, state: RoomState) -> usize {
        self.cells.values().filter(|cell| cell.state == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DayStatus;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn status(id: RoomId, days: &[(&str, RoomState)]) -> RoomStatus {
        RoomStatus {
            id,
            number: 100 + id as u32,
            room_type: "DOBLE".to_string(),
            capacity: 2,
            days: days
                .iter()
                .map(|(d, state)| DayStatus {
                    date: date(d),
                    state: *state,
                })
                .collect(),
        }
    }

    #[test]
    fn test_state_parses_wire_and_english_names() {
        let states: Vec<RoomState> =
            serde_json::from_str(r#"["DISPONIBLE", "OCUPADA", "CLEANING", "RESERVED"]"#).unwrap();
        assert_eq!(
            states,
            vec![
                RoomState::Available,
                RoomState::Occupied,
                RoomState::Cleaning,
                RoomState::Reserved
            ]
        );
        assert_eq!(
            serde_json::to_string(&RoomState::Maintenance).unwrap(),
            "\"MANTENIMIENTO\""
        );
    }

    #[test]
    fn test_selectable_states() {
        assert!(RoomState::Available.is_selectable());
        assert!(RoomState::Reserved.is_selectable());
        assert!(RoomState::Cleaning.is_selectable());
        assert!(!RoomState::Occupied.is_selectable());
        assert!(!RoomState::Maintenance.is_selectable());
    }

    #[test]
    fn test_matrix_indexes_cells_and_drops_days_outside_window() {
        let matrix = AvailabilityMatrix::from_statuses(
            date("2024-05-01"),
            date("2024-05-02"),
            vec![
                status(
                    2,
                    &[
                        ("2024-05-01", RoomState::Reserved),
                        ("2024-05-02", RoomState::Available),
                        ("2024-05-03", RoomState::Occupied),
                    ],
                ),
                status(1, &[("2024-05-01", RoomState::Maintenance)]),
            ],
        );

        assert_eq!(
            matrix.state(2, date("2024-05-01")),
            Some(RoomState::Reserved)
        );
        assert_eq!(matrix.state(2, date("2024-05-03")), None);
        assert_eq!(matrix.state(1, date("2024-05-02")), None);
        assert_eq!(matrix.room(2).map(|r| r.number), Some(102));

        let ids: Vec<RoomId> = matrix.rooms().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let dates: Vec<NaiveDate> = matrix.dates().collect();
        assert_eq!(dates, vec![date("2024-05-01"), date("2024-05-02")]);
        assert_eq!(matrix.count_in_state(RoomState::Occupied), 0);
        assert_eq!(matrix.count_in_state(RoomState::Maintenance), 1);
    }

    #[tokio::test]
    async fn test_fetch_rejects_window_ending_on_last_date() {
        let backend = crate::memory::InMemoryFrontDesk::new();
        let before_max = NaiveDate::MAX.pred_opt().unwrap();

        let err = AvailabilityMatrix::fetch(&backend, before_max, NaiveDate::MAX)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::Precondition(PreconditionError::InvalidDateRange { .. })
        ));
        assert_eq!(backend.request_count(), 0);
    }
}
