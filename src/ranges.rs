// Contiguous range grouping
// Turns a flat selection of (room, date) cells into the fewest check-in /
// check-out ranges that cover exactly those cells.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use tracing::warn;

use crate::calendar::RoomId;
use crate::selection::SelectedCell;

/// A maximal run of consecutive selected days for one room.
/// `check_out` is exclusive: the day after the last selected night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContiguousRange {
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl ContiguousRange {
    // Build a range from the first and last selected day of a run. `None`
    // when `last` is the final representable date and has no check-out.
    pub fn from_run(room_id: RoomId, first: NaiveDate, last: NaiveDate) -> Option<Self> {
        Some(Self {
            room_id,
            check_in: first,
            check_out: last.succ_opt()?,
        })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.check_in && date < self.check_out
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let check_out = self.check_out;
        self.check_in
            .iter_days()
            .take_while(move |date| *date < check_out)
    }
}

impl fmt::Display for ContiguousRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "room {} [{}, {})",
            self.room_id, self.check_in, self.check_out
        )
    }
}

pub fn group_into_ranges<'a, I>(cells: I) -> BTreeMap<RoomId, Vec<ContiguousRange>>
where
    I: IntoIterator<Item = &'a SelectedCell>,
{
    group_room_dates(cells.into_iter().map(|cell| (cell.room_id, cell.date)))
}

// Same grouping over bare (room, date) pairs. Duplicates collapse.
pub fn group_room_dates<I>(pairs: I) -> BTreeMap<RoomId, Vec<ContiguousRange>>
where
    I: IntoIterator<Item = (RoomId, NaiveDate)>,
{
    let mut by_room: BTreeMap<RoomId, Vec<NaiveDate>> = BTreeMap::new();
    for (room_id, date) in pairs {
        by_room.entry(room_id).or_default().push(date);
    }

    by_room
        .into_iter()
        .map(|(room_id, mut dates)| {
            dates.sort_unstable();
            dates.dedup();
            (room_id, runs(room_id, &dates))
        })
        .collect()
}

// `dates` must be sorted and free of duplicates. A run ending on
// `NaiveDate::MAX` has no check-out and is skipped; loaded windows never
// reach that date.
fn runs(room_id: RoomId, dates: &[NaiveDate]) -> Vec<ContiguousRange> {
    let mut ranges = Vec::new();
    let mut iter = dates.iter().copied();
    let Some(first) = iter.next() else {
        return ranges;
    };

    let mut start = first;
    let mut last = first;
    for date in iter {
        if last.succ_opt() == Some(date) {
            last = date;
            continue;
        }
        push_run(&mut ranges, room_id, start, last);
        start = date;
        last = date;
    }
    push_run(&mut ranges, room_id, start, last);

    ranges
}

fn push_run(
    ranges: &mut Vec<ContiguousRange>,
    room_id: RoomId,
    first: NaiveDate,
    last: NaiveDate,
) {
    match ContiguousRange::from_run(room_id, first, last) {
        Some(range) => ranges.push(range),
        None => warn!(room_id, %first, %last, "run has no representable check-out, skipped"),
    }
}
