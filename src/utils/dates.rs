//! Date arithmetic for draw rounds and ledger search windows

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Date format the site expects in ledger queries
const SEARCH_DATE_FMT: &str = "%Y%m%d";

/// Build the trailing search window for ledger queries
///
/// Returns `(start, end)` as `YYYYMMDD` strings covering the last seven
/// days up to and including `today`.
pub fn search_date_range(today: NaiveDate) -> (String, String) {
    let week_ago = today - Days::new(7);
    (
        week_ago.format(SEARCH_DATE_FMT).to_string(),
        today.format(SEARCH_DATE_FMT).to_string(),
    )
}

/// The upcoming draw day: the next Saturday, or `date` itself if it is one
///
/// Draws happen Saturday evening; on a Saturday the purchase window for
/// that day's draw is still open.
pub fn next_saturday(date: NaiveDate) -> NaiveDate {
    let today = date.weekday().num_days_from_monday() as i64;
    let saturday = Weekday::Sat.num_days_from_monday() as i64;
    let days_ahead = (saturday - today).rem_euclid(7);
    date + Days::new(days_ahead as u64)
}

/// Compute the round number for a draw date by counting weeks from an anchor
///
/// The site runs exactly one draw per week, so the round of any Saturday is
/// the anchor round plus the number of whole weeks since the anchor draw.
pub fn round_for_draw_date(anchor_round: u32, anchor_date: NaiveDate, draw_date: NaiveDate) -> u32 {
    let weeks = (draw_date - anchor_date).num_days().div_euclid(7);
    (anchor_round as i64 + weeks).max(1) as u32
}

/// Format a won amount with thousands separators
pub fn format_money(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{}원", grouped)
    } else {
        format!("{}원", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_search_date_range_spans_seven_days() {
        let (start, end) = search_date_range(date(2025, 3, 10));
        assert_eq!(start, "20250303");
        assert_eq!(end, "20250310");
    }

    #[test]
    fn test_next_saturday_mid_week() {
        assert_eq!(next_saturday(date(2025, 3, 12)), date(2025, 3, 15));
    }

    #[test]
    fn test_next_saturday_on_saturday_is_same_day() {
        assert_eq!(next_saturday(date(2025, 3, 15)), date(2025, 3, 15));
    }

    #[test]
    fn test_next_saturday_on_sunday() {
        assert_eq!(next_saturday(date(2025, 3, 16)), date(2025, 3, 22));
    }

    #[test]
    fn test_round_for_anchor_date_is_anchor_round() {
        assert_eq!(round_for_draw_date(1, date(2002, 12, 7), date(2002, 12, 7)), 1);
    }

    #[test]
    fn test_round_counts_weeks_from_anchor() {
        assert_eq!(
            round_for_draw_date(1, date(2002, 12, 7), date(2002, 12, 28)),
            4
        );
        // Round 1154 drew on 2025-01-11: 1153 weeks after the first draw.
        assert_eq!(
            round_for_draw_date(1, date(2002, 12, 7), date(2025, 1, 11)),
            1154
        );
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0), "0원");
        assert_eq!(format_money(5000), "5,000원");
        assert_eq!(format_money(1234567890), "1,234,567,890원");
    }
}
