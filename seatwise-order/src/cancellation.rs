use chrono::NaiveDate;
use seatwise_core::Money;

/// Refund owed when a booking is cancelled on `today` for a flight leaving
/// on `departure`.
///
/// 7 or more days ahead refunds everything, 3 to 6 days refunds half,
/// anything later refunds nothing.
pub fn refund_for(cost: Money, departure: NaiveDate, today: NaiveDate) -> Money {
    let days_ahead = (departure - today).num_days();
    let share = match days_ahead {
        d if d >= 7 => 1.0,
        3..=6 => 0.5,
        _ => 0.0,
    };
    cost * share
}
