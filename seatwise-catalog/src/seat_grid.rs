use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use seatwise_core::BookingError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Letters available after skipping the aisle letter.
pub const MAX_COLUMNS: u32 = 25;

pub const MAX_ROWS: u32 = 999;

/// Column index at which letters start skipping one character for the aisle.
const AISLE_AFTER: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatError {
    #[error("Invalid grid dimensions: {rows} rows x {columns} columns")]
    InvalidDimensions { rows: u32, columns: u32 },
    #[error("Seat position out of range: row {row}, column {column}")]
    InvalidPosition { row: u32, column: u32 },
    #[error("Malformed seat code: {0}")]
    MalformedSeatCode(String),
}

impl From<SeatError> for BookingError {
    fn from(err: SeatError) -> Self {
        BookingError::InvalidSeatCode(err.to_string())
    }
}

/// A seat position: 1-based row, 0-based column.
///
/// Ordering is row-major, which is also the allocator's scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatCode {
    pub row: u32,
    pub column: u32,
}

impl SeatCode {
    pub fn letter(column: u32) -> Option<char> {
        let offset = if column < AISLE_AFTER { column } else { column.checked_add(1)? };
        if offset > 25 {
            return None;
        }
        char::from_u32('A' as u32 + offset)
    }

    fn column_for(letter: char) -> Option<u32> {
        let letter = letter.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return None;
        }
        let offset = letter as u32 - 'A' as u32;
        match offset {
            o if o < AISLE_AFTER => Some(o),
            AISLE_AFTER => None,
            o => Some(o - 1),
        }
    }
}

impl fmt::Display for SeatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match SeatCode::letter(self.column) {
            Some(letter) => write!(f, "{}{}", self.row, letter),
            None => write!(f, "{}?", self.row),
        }
    }
}

impl FromStr for SeatCode {
    type Err = SeatError;

    /// Parses the textual form without checking it against any grid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let malformed = || SeatError::MalformedSeatCode(s.to_string());

        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(malformed)?;
        if digits_end == 0 {
            return Err(malformed());
        }
        let (digits, rest) = trimmed.split_at(digits_end);

        let mut letters = rest.chars();
        let letter = letters.next().ok_or_else(malformed)?;
        if letters.next().is_some() {
            return Err(malformed());
        }

        let row: u32 = digits.parse().map_err(|_| malformed())?;
        let column = SeatCode::column_for(letter).ok_or_else(malformed)?;
        if row == 0 {
            return Err(malformed());
        }
        Ok(SeatCode { row, column })
    }
}

impl TryFrom<String> for SeatCode {
    type Error = SeatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatCode> for String {
    fn from(code: SeatCode) -> Self {
        code.to_string()
    }
}

/// Fixed rows x columns seat space for one flight.
///
/// Every mutation goes through a single lock, so `allocate` is an atomic
/// check-and-set: two callers racing for one seat never both win.
pub struct SeatGrid {
    rows: u32,
    columns: u32,
    occupied: Mutex<BTreeSet<SeatCode>>,
}

impl SeatGrid {
    /// Empty grid.
    pub fn new(rows: u32, columns: u32) -> Result<Self, SeatError> {
        if rows == 0 || rows > MAX_ROWS || columns == 0 || columns > MAX_COLUMNS {
            return Err(SeatError::InvalidDimensions { rows, columns });
        }
        Ok(Self {
            rows,
            columns,
            occupied: Mutex::new(BTreeSet::new()),
        })
    }

    /// Grid with a fraction of seats pre-occupied to simulate partial load.
    /// A fixed `seed` makes the chosen seats reproducible.
    pub fn with_occupancy(
        rows: u32,
        columns: u32,
        fraction: f64,
        seed: Option<u64>,
    ) -> Result<Self, SeatError> {
        let grid = Self::new(rows, columns)?;
        let capacity = grid.capacity();
        let count = ((capacity as f64) * fraction.clamp(0.0, 1.0)).round() as usize;
        if count == 0 {
            return Ok(grid);
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        {
            let mut occupied = grid.occupied.lock();
            for index in rand::seq::index::sample(&mut rng, capacity, count) {
                let index = index as u32;
                occupied.insert(SeatCode {
                    row: index / columns + 1,
                    column: index % columns,
                });
            }
        }
        debug!(rows, columns, pre_occupied = count, "seat grid seeded");
        Ok(grid)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Seat code for a position, validated against this grid.
    pub fn seat_code(&self, row: u32, column: u32) -> Result<SeatCode, SeatError> {
        if row == 0 || row > self.rows || column >= self.columns {
            return Err(SeatError::InvalidPosition { row, column });
        }
        Ok(SeatCode { row, column })
    }

    /// Parse a textual seat code such as "12B" and check it fits this grid.
    pub fn parse_seat_code(&self, code: &str) -> Result<SeatCode, SeatError> {
        let parsed: SeatCode = code.parse()?;
        self.seat_code(parsed.row, parsed.column)
    }

    fn check(&self, code: SeatCode) -> Result<(), SeatError> {
        self.seat_code(code.row, code.column).map(|_| ())
    }

    /// Occupy a seat. `Ok(false)` means it was already taken.
    pub fn allocate(&self, code: SeatCode) -> Result<bool, SeatError> {
        self.check(code)?;
        let inserted = self.occupied.lock().insert(code);
        if inserted {
            debug!(seat = %code, "seat held");
        }
        Ok(inserted)
    }

    /// Free a seat. Releasing a free or out-of-range seat is a no-op.
    pub fn release(&self, code: SeatCode) {
        if self.occupied.lock().remove(&code) {
            debug!(seat = %code, "seat released");
        }
    }

    pub fn is_free(&self, code: SeatCode) -> bool {
        self.check(code).is_ok() && !self.occupied.lock().contains(&code)
    }

    /// First free seat scanning row 1 upward, then column 0 upward.
    pub fn next_free(&self) -> Option<SeatCode> {
        let occupied = self.occupied.lock();
        self.scan(&occupied)
    }

    fn scan(&self, occupied: &BTreeSet<SeatCode>) -> Option<SeatCode> {
        (1..=self.rows)
            .flat_map(|row| (0..self.columns).map(move |column| SeatCode { row, column }))
            .find(|code| !occupied.contains(code))
    }

    /// Find and occupy the first free seat under one lock.
    pub fn allocate_next(&self) -> Option<SeatCode> {
        let mut occupied = self.occupied.lock();
        let code = self.scan(&occupied)?;
        occupied.insert(code);
        debug!(seat = %code, "next free seat held");
        Some(code)
    }

    /// Move a holder from `old` to `new` atomically.
    ///
    /// Returns `Ok(false)` when `new` is taken by someone else; `old` is then
    /// still held. Moving onto the seat already held is a successful no-op.
    pub fn reassign(&self, old: Option<SeatCode>, new: SeatCode) -> Result<bool, SeatError> {
        self.check(new)?;
        let mut occupied = self.occupied.lock();
        if old == Some(new) {
            occupied.insert(new);
            return Ok(true);
        }
        if !occupied.insert(new) {
            return Ok(false);
        }
        if let Some(old) = old {
            occupied.remove(&old);
        }
        debug!(from = ?old.map(|c| c.to_string()), to = %new, "seat reassigned");
        Ok(true)
    }

    pub fn capacity(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.lock().len()
    }

    pub fn available_count(&self) -> usize {
        self.capacity() - self.occupied_count()
    }

    /// Snapshot of occupied seats in scan order.
    pub fn occupied(&self) -> Vec<SeatCode> {
        self.occupied.lock().iter().copied().collect()
    }

    /// Occupied share of the grid, 0.0 to 1.0.
    pub fn utilization(&self) -> f64 {
        self.occupied_count() as f64 / self.capacity() as f64
    }

    /// Release every seat. Used when a flight's grid is rebuilt.
    pub fn clear(&self) {
        let mut occupied = self.occupied.lock();
        let released = occupied.len();
        occupied.clear();
        info!(released, "seat grid cleared");
    }
}

impl fmt::Debug for SeatGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeatGrid")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("occupied", &self.occupied_count())
            .finish()
    }
}
