use seatwise_core::Money;

/// Group discount percentage by passenger count.
pub fn discount_for(passenger_count: usize) -> f64 {
    match passenger_count {
        n if n >= 10 => 15.0,
        5..=9 => 10.0,
        3..=4 => 5.0,
        2 => 2.0,
        _ => 0.0,
    }
}

/// One loyalty point per 10 units spent, rounded down.
pub fn loyalty_points_for(amount: Money) -> u64 {
    if amount <= 0.0 {
        return 0;
    }
    (amount / 10.0).floor() as u64
}

/// Apply a percentage discount to an amount.
pub fn discounted(amount: Money, discount_percentage: f64) -> Money {
    amount * (1.0 - discount_percentage / 100.0)
}
