// In-process front-desk backend
// Keeps room states in memory and applies reservations the way the real
// backend does. Rooms can be told to fail or to answer slowly, which is what
// the submission and flow tests rely on.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::api::{ApiError, FrontDeskApi, ReservationMode};
use crate::backend::{DayStatus, Guest, ReservationReceipt, ReservationRequest, RoomStatus};
use crate::calendar::{RoomId, RoomInfo, RoomState};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedReservation {
    pub id: i64,
    pub mode: ReservationMode,
    pub request: ReservationRequest,
}

pub struct InMemoryFrontDesk {
    rooms: DashMap<RoomId, RoomInfo>,
    states: DashMap<(RoomId, NaiveDate), RoomState>,
    guests: DashMap<String, Guest>,
    failing_rooms: DashMap<RoomId, String>,
    slow_rooms: DashMap<RoomId, u64>,
    request_count: AtomicUsize,
    next_id: AtomicI64,
    reservations: Mutex<Vec<RecordedReservation>>,
}

impl Default for InMemoryFrontDesk {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFrontDesk {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            states: DashMap::new(),
            guests: DashMap::new(),
            failing_rooms: DashMap::new(),
            slow_rooms: DashMap::new(),
            request_count: AtomicUsize::new(0),
            next_id: AtomicI64::new(1),
            reservations: Mutex::new(Vec::new()),
        }
    }

    pub fn add_room(&self, room: RoomInfo) {
        self.rooms.insert(room.id, room);
    }

    // Days never set read as available.
    pub fn set_state(&self, room_id: RoomId, date: NaiveDate, state: RoomState) {
        self.states.insert((room_id, date), state);
    }

    pub fn state(&self, room_id: RoomId, date: NaiveDate) -> RoomState {
        self.states
            .get(&(room_id, date))
            .map(|entry| *entry.value())
            .unwrap_or(RoomState::Available)
    }

    pub fn add_guest(&self, guest: Guest) {
        self.guests.insert(guest.dni.clone(), guest);
    }

    // Every mutation touching this room answers with a 500 and `message`.
    pub fn fail_room(&self, room_id: RoomId, message: &str) {
        self.failing_rooms.insert(room_id, message.to_string());
    }

    pub fn slow_room(&self, room_id: RoomId, delay_ms: u64) {
        self.slow_rooms.insert(room_id, delay_ms);
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn reservations(&self) -> Vec<RecordedReservation> {
        self.reservations.lock().clone()
    }

    async fn disturb(&self, room_id: RoomId) -> Result<(), ApiError> {
        let delay = self.slow_rooms.get(&room_id).map(|entry| *entry.value());
        if let Some(delay_ms) = delay {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let failure = self
            .failing_rooms
            .get(&room_id)
            .map(|entry| entry.value().clone());
        match failure {
            Some(message) => Err(ApiError::ApiResponseError {
                status_code: 500,
                message,
                is_retryable: true,
            }),
            None => Ok(()),
        }
    }

    async fn apply(
        &self,
        mode: ReservationMode,
        request: &ReservationRequest,
    ) -> Result<ReservationReceipt, ApiError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        if request.check_in >= request.check_out {
            return Err(ApiError::from_status(
                400,
                Some("Check-out must be after check-in".to_string()),
            ));
        }

        for room_id in &request.rooms {
            self.disturb(*room_id).await?;
        }

        let dates: Vec<NaiveDate> = request
            .check_in
            .iter_days()
            .take_while(|date| *date < request.check_out)
            .collect();

        for room_id in &request.rooms {
            if !self.rooms.contains_key(room_id) {
                return Err(ApiError::from_status(
                    404,
                    Some(format!("Room {} does not exist", room_id)),
                ));
            }

            for date in &dates {
                let state = self.state(*room_id, *date);
                let allowed = match mode {
                    ReservationMode::Reserve => state == RoomState::Available,
                    ReservationMode::Occupy => {
                        matches!(state, RoomState::Available | RoomState::Reserved)
                    }
                };
                if !allowed {
                    return Err(ApiError::from_status(
                        409,
                        Some(format!("Room {} is {:?} on {}", room_id, state, date)),
                    ));
                }
            }
        }

        let target = match mode {
            ReservationMode::Reserve => RoomState::Reserved,
            ReservationMode::Occupy => RoomState::Occupied,
        };
        for room_id in &request.rooms {
            for date in &dates {
                self.set_state(*room_id, *date, target);
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.reservations.lock().push(RecordedReservation {
            id,
            mode,
            request: request.clone(),
        });

        Ok(ReservationReceipt { id: Some(id) })
    }
}

#[async_trait]
impl FrontDeskApi for InMemoryFrontDesk {
    async fn room_states(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RoomStatus>, ApiError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        let mut rooms: Vec<RoomInfo> = self.rooms.iter().map(|e| e.value().clone()).collect();
        rooms.sort_by_key(|room| room.id);

        Ok(rooms
            .into_iter()
            .map(|room| {
                let days = from
                    .iter_days()
                    .take_while(|date| *date <= to)
                    .map(|date| DayStatus {
                        date,
                        state: self.state(room.id, date),
                    })
                    .collect();
                RoomStatus {
                    id: room.id,
                    number: room.number,
                    room_type: room.room_type,
                    capacity: room.capacity,
                    days,
                }
            })
            .collect())
    }

    async fn reserve(&self, request: &ReservationRequest) -> Result<ReservationReceipt, ApiError> {
        self.apply(ReservationMode::Reserve, request).await
    }

    async fn occupy(&self, request: &ReservationRequest) -> Result<ReservationReceipt, ApiError> {
        self.apply(ReservationMode::Occupy, request).await
    }

    async fn cancel_date(&self, room_id: RoomId, date: NaiveDate) -> Result<(), ApiError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.disturb(room_id).await?;

        if self.state(room_id, date) != RoomState::Reserved {
            return Err(ApiError::NotFound(format!(
                "No reservation for room {} on {}",
                room_id, date
            )));
        }
        self.set_state(room_id, date, RoomState::Available);
        Ok(())
    }

    async fn find_guest_by_dni(&self, dni: &str) -> Result<Option<Guest>, ApiError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.guests.get(dni).map(|entry| entry.value().clone()))
    }
}
