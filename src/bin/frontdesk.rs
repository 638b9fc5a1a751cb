//! Front-desk command line
//!
//! Prints the availability matrix for a window, or looks a guest up.
//!
//! ```bash
//! FRONTDESK_BASE_URL=http://localhost:8080/api frontdesk matrix 2024-05-01 2024-05-14
//! frontdesk guest 30111222
//! ```
//!
//! # Environment Variables
//!
//! - `FRONTDESK_BASE_URL`, `FRONTDESK_TOKEN`, `FRONTDESK_TIMEOUT_MS`,
//!   `FRONTDESK_MAX_RETRIES`: see `ClientConfig::from_env`
//! - `RUST_LOG`: log filter (default: info)

use std::env;

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use front_desk_reservations::{
    AvailabilityMatrix, ClientConfig, FrontDeskApi, HttpFrontDeskClient, RoomState,
};

fn symbol(state: Option<RoomState>) -> char {
    match state {
        Some(RoomState::Available) => '.',
        Some(RoomState::Reserved) => 'R',
        Some(RoomState::Occupied) => 'O',
        Some(RoomState::Maintenance) => 'M',
        Some(RoomState::Cleaning) => 'C',
        None => '?',
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date {raw}"))
}

fn print_matrix(matrix: &AvailabilityMatrix) {
    let dates: Vec<NaiveDate> = matrix.dates().collect();
    let header: String = dates.iter().map(|d| format!("{:>3}", d.format("%d"))).collect();
    println!("{:<8}{:<12}{}", "room", "type", header);

    for room in matrix.rooms() {
        let row: String = dates
            .iter()
            .map(|date| format!("{:>3}", symbol(matrix.state(room.id, *date))))
            .collect();
        println!("{:<8}{:<12}{}", room.number, room.room_type, row);
    }

    println!(
        "available {} / reserved {} / occupied {}",
        matrix.count_in_state(RoomState::Available),
        matrix.count_in_state(RoomState::Reserved),
        matrix.count_in_state(RoomState::Occupied)
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = ClientConfig::from_env()?;
    info!(base_url = %config.base_url, "using front-desk backend");
    let client = HttpFrontDeskClient::new(config)?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["matrix", from, to] => {
            let matrix = AvailabilityMatrix::fetch(&client, parse_date(from)?, parse_date(to)?)
                .await
                .map_err(|e| anyhow!(e))?;
            print_matrix(&matrix);
        }
        ["guest", dni] => match client.find_guest_by_dni(dni).await? {
            Some(guest) => println!("{} {} ({})", guest.first_name, guest.last_name, guest.dni),
            None => println!("no guest with document {dni}; register a new one"),
        },
        _ => bail!("usage: frontdesk matrix <from> <to> | frontdesk guest <dni>"),
    }

    let stats = client.stats();
    info!(
        sent = stats.requests_sent,
        failed = stats.requests_failed,
        retried = stats.requests_retried,
        "done"
    );
    Ok(())
}
