//! Date-derived seeds.
//!
//! Every seed is a sum of "character codes" of positions in the canonical
//! `YYYY-MM-DD` form, computed arithmetically from the date fields instead of
//! formatting and scanning a string. Positions 4 and 7 are the separators.

use crate::models::calendar::CalendarDate;

const ZERO_CODE: u32 = b'0' as u32;
const SEPARATOR_CODE: u32 = b'-' as u32;

/// Number of positions in the canonical form.
pub const CANONICAL_LEN: usize = 10;

/// Code of the canonical character at `position` (0-based).
pub fn code_at(date: &CalendarDate, position: usize) -> u32 {
    let digits = date.digits();
    match position {
        0..=3 => ZERO_CODE + digits[position],
        4 | 7 => SEPARATOR_CODE,
        5 | 6 => ZERO_CODE + digits[position - 1],
        8 | 9 => ZERO_CODE + digits[position - 2],
        _ => 0,
    }
}

/// Sum of the codes at the given canonical positions.
pub fn positional_seed(date: &CalendarDate, positions: &[usize]) -> u32 {
    positions.iter().map(|&p| code_at(date, p)).sum()
}

/// Seed over the whole canonical form; selects the daily category.
pub fn daily_seed(date: &CalendarDate) -> u32 {
    let digit_sum: u32 = date.digits().iter().sum();
    digit_sum + 8 * ZERO_CODE + 2 * SEPARATOR_CODE
}
