//! WPM calculation.
//!
//! Five keystrokes make a word. The word count is truncated before the
//! rate is taken, and the rate is then divided by ten; both steps are part
//! of the published figure and must not be "corrected".

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Keystrokes per word.
pub const KEYSTROKES_PER_WORD: u64 = 5;

/// Divisor applied to the raw words-per-minute rate.
pub const WPM_NORMALIZATION: f64 = 10.0;

/// Computes the displayed WPM for `keystrokes` over `elapsed`.
///
/// Returns 0 when no time has elapsed.
pub fn compute_wpm(keystrokes: u64, elapsed: Duration) -> f64 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes <= 0.0 {
        return 0.0;
    }

    let words = keystrokes / KEYSTROKES_PER_WORD;
    let raw_wpm = words as f64 / minutes;
    raw_wpm / WPM_NORMALIZATION
}

/// Fixed two-decimal representation.
pub fn format_wpm(wpm: f64) -> String {
    format!("{:.2}", wpm)
}

/// Elapsed time from `start` to `end`, clamped to zero if the clock
/// stepped backwards.
pub fn elapsed_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
    (end - start).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifty_keystrokes_in_one_minute() {
        let wpm = compute_wpm(50, Duration::from_secs(60));
        assert_eq!(wpm, 1.0);
        assert_eq!(format_wpm(wpm), "1.00");
    }

    #[test]
    fn test_word_count_truncates() {
        // 54 keystrokes are still 10 words.
        assert_eq!(
            compute_wpm(54, Duration::from_secs(60)),
            compute_wpm(50, Duration::from_secs(60))
        );
        // Fewer than five keystrokes make no word at all.
        assert_eq!(compute_wpm(4, Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn test_zero_elapsed_is_zero() {
        assert_eq!(compute_wpm(500, Duration::ZERO), 0.0);
        assert_eq!(format_wpm(compute_wpm(0, Duration::ZERO)), "0.00");
    }

    #[test]
    fn test_fractional_minutes() {
        // 300 keystrokes (60 words) in 30 seconds -> 120 raw -> 12.00
        assert_eq!(format_wpm(compute_wpm(300, Duration::from_secs(30))), "12.00");
        // 20 words in 90 seconds -> 13.33 raw -> 1.33
        assert_eq!(format_wpm(compute_wpm(100, Duration::from_secs(90))), "1.33");
    }

    #[test]
    fn test_elapsed_between_clamps_negative() {
        let now = Utc::now();
        let earlier = now - chrono::Duration::seconds(10);
        assert_eq!(elapsed_between(now, earlier), Duration::ZERO);
        assert_eq!(elapsed_between(earlier, now), Duration::from_secs(10));
    }
}
