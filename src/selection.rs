// Selected cells, indexed by (room, date) so toggling is a single lookup.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::calendar::{AvailabilityMatrix, RoomId, RoomState};
use crate::error::PreconditionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCell {
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub room_type: String,
    pub room_number: u32,
    pub capacity: u32,
    pub original_state: RoomState,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    cells: HashMap<(RoomId, NaiveDate), SelectedCell>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the membership of a matrix cell. Returns `true` when the cell is
    /// selected after the call.
    ///
    /// Deselecting always succeeds. Selecting fails for cells missing from
    /// the matrix and for occupied or maintenance cells.
    pub fn toggle(
        &mut self,
        matrix: &AvailabilityMatrix,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<bool, PreconditionError> {
        if self.cells.remove(&(room_id, date)).is_some() {
            return Ok(false);
        }

        let (cell, room) = match (matrix.cell(room_id, date), matrix.room(room_id)) {
            (Some(cell), Some(room)) => (cell, room),
            _ => return Err(PreconditionError::OutsideWindow { room_id, date }),
        };

        if !cell.state.is_selectable() {
            return Err(PreconditionError::NotSelectable {
                room_id,
                date,
                state: cell.state,
            });
        }

        self.insert(SelectedCell {
            room_id,
            date,
            room_type: room.room_type.clone(),
            room_number: room.number,
            capacity: room.capacity,
            original_state: cell.state,
        });
        Ok(true)
    }

    pub fn insert(&mut self, cell: SelectedCell) {
        self.cells.insert((cell.room_id, cell.date), cell);
    }

    pub fn contains(&self, room_id: RoomId, date: NaiveDate) -> bool {
        self.cells.contains_key(&(room_id, date))
    }

    pub fn get(&self, room_id: RoomId, date: NaiveDate) -> Option<&SelectedCell> {
        self.cells.get(&(room_id, date))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    // Unordered; use `cells()` when order matters.
    pub fn iter(&self) -> impl Iterator<Item = &SelectedCell> {
        self.cells.values()
    }

    // Ordered by room, then date.
    pub fn cells(&self) -> Vec<&SelectedCell> {
        let mut cells: Vec<&SelectedCell> = self.cells.values().collect();
        cells.sort_by_key(|cell| (cell.room_id, cell.date));
        cells
    }

    pub fn reserved_cells(&self) -> Vec<&SelectedCell> {
        self.cells()
            .into_iter()
            .filter(|cell| cell.original_state == RoomState::Reserved)
            .collect()
    }

    pub fn room_ids(&self) -> BTreeSet<RoomId> {
        self.cells.values().map(|cell| cell.room_id).collect()
    }

    pub fn capacity_of(&self, room_id: RoomId) -> Option<u32> {
        self.cells
            .values()
            .find(|cell| cell.room_id == room_id)
            .map(|cell| cell.capacity)
    }
}
