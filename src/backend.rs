use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{RoomId, RoomState};
use crate::ranges::ContiguousRange;

// Wire structures for the front-desk REST backend

// GET /habitaciones/estado
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RoomStatus {
    pub id: RoomId,
    #[serde(rename = "numero")]
    pub number: u32,
    #[serde(rename = "tipo")]
    pub room_type: String,
    #[serde(rename = "capacidad")]
    pub capacity: u32,
    #[serde(rename = "estadosPorDia", default)]
    pub days: Vec<DayStatus>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DayStatus {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "estado")]
    pub state: RoomState,
}

// Guest as returned by GET /huespedes/buscar-por-dni and sent as titular or
// occupant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Guest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub dni: String,
    #[serde(rename = "nombre", default)]
    pub first_name: String,
    #[serde(rename = "apellido", default)]
    pub last_name: String,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "nacionalidad", default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

impl Guest {
    pub fn new(dni: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            dni: dni.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Default::default()
        }
    }
}

// Body of POST /reservas and POST /reservas/ocupar. One request covers one
// contiguous range of one room.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReservationRequest {
    #[serde(rename = "ingreso")]
    pub check_in: NaiveDate,
    #[serde(rename = "egreso")]
    pub check_out: NaiveDate,
    #[serde(rename = "huesped")]
    pub titular: Guest,
    #[serde(rename = "habitaciones")]
    pub rooms: Vec<RoomId>,
    #[serde(rename = "ocupantesPorHabitacion", default)]
    pub occupants_by_room: BTreeMap<RoomId, Vec<Guest>>,
}

impl ReservationRequest {
    pub fn for_range(
        range: &ContiguousRange,
        titular: &Guest,
        occupants: Option<&[Guest]>,
    ) -> Self {
        let mut occupants_by_room = BTreeMap::new();
        if let Some(occupants) = occupants {
            occupants_by_room.insert(range.room_id, occupants.to_vec());
        }

        Self {
            check_in: range.check_in,
            check_out: range.check_out,
            titular: titular.clone(),
            rooms: vec![range.room_id],
            occupants_by_room,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReservationReceipt {
    #[serde(default)]
    pub id: Option<i64>,
}

// Error payload; the backend uses either key.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(alias = "mensaje", default)]
    pub message: Option<String>,
}
