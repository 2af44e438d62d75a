// libs/appointment-cell/src/services/mobility.rs
use chrono::{Datelike, NaiveDate, Weekday};

/// "Pico y placa": municipal rule barring vehicles from circulating on
/// specific weekdays based on the last digit of the license plate. The
/// weekday table is mandated policy; changes touch the table only.
pub fn is_restricted(plate: &str, date: NaiveDate) -> bool {
    let plate = plate.trim();
    if plate.is_empty() {
        return false;
    }

    let Some(digits) = restricted_digits(date.weekday()) else {
        return false;
    };

    let last_char = match plate.to_uppercase().chars().last() {
        Some(c) => c,
        None => return false,
    };

    match last_char.to_digit(10) {
        Some(digit) => digits.contains(&digit),
        None => false,
    }
}

/// Restricted plate digits per weekday. Weekends are unrestricted.
pub fn restricted_digits(weekday: Weekday) -> Option<[u32; 2]> {
    match weekday {
        Weekday::Mon => Some([1, 2]),
        Weekday::Tue => Some([3, 4]),
        Weekday::Wed => Some([5, 6]),
        Weekday::Thu => Some([7, 8]),
        Weekday::Fri => Some([9, 0]),
        Weekday::Sat | Weekday::Sun => None,
    }
}
