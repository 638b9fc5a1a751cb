use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use front_desk_reservations::{group_into_ranges, RoomState, SelectedCell, Selection};
use rand::Rng;

// Random selections over a 90 day window, roughly half the cells picked so
// runs are short and plentiful.
fn selection(rooms: i64, rng: &mut impl Rng) -> Selection {
    let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let mut selection = Selection::new();
    for room_id in 1..=rooms {
        for offset in 0..90 {
            if rng.gen_bool(0.5) {
                selection.insert(SelectedCell {
                    room_id,
                    date: start + Duration::days(offset),
                    room_type: "DOBLE".to_string(),
                    room_number: 100 + room_id as u32,
                    capacity: 2,
                    original_state: RoomState::Available,
                });
            }
        }
    }
    selection
}

pub fn range_grouping_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_into_ranges");
    let mut rng = rand::thread_rng();

    for rooms in [1i64, 20, 200].iter() {
        let selection = selection(*rooms, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(rooms), &selection, |b, selection| {
            b.iter(|| black_box(group_into_ranges(selection.iter())))
        });
    }

    group.finish();
}

criterion_group!(benches, range_grouping_benchmark);
criterion_main!(benches);
