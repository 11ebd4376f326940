//! Utility functions and helpers
//!
//! This module contains utility functions used throughout the application.

pub mod dates;

pub use dates::{format_money, next_saturday, round_for_draw_date, search_date_range};

/// Maximum number of body bytes carried in diagnostic errors
const EXCERPT_LEN: usize = 500;

/// Truncate a response body to a diagnostic excerpt
pub fn body_excerpt(body: &str) -> String {
    if body.len() <= EXCERPT_LEN {
        return body.to_string();
    }
    let mut end = EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_excerpt_short_body_unchanged() {
        assert_eq!(body_excerpt("<html>"), "<html>");
    }

    #[test]
    fn test_body_excerpt_truncates_long_body() {
        let body = "x".repeat(2000);
        assert_eq!(body_excerpt(&body).len(), 500);
    }

    #[test]
    fn test_body_excerpt_respects_char_boundaries() {
        let body = "로".repeat(400); // 3 bytes each
        let excerpt = body_excerpt(&body);
        assert!(excerpt.len() <= 500);
        assert!(excerpt.chars().all(|c| c == '로'));
    }
}
