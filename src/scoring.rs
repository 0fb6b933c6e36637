/// One "word" is five characters, spaces included.
const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute for `chars_typed` characters over `elapsed_secs`.
///
/// Returns 0 for a zero elapsed time rather than dividing by it; the caller
/// hits that case when a session finishes before the clock ever started
/// (empty target text).
pub fn wpm(chars_typed: usize, elapsed_secs: f64) -> u32 {
    if elapsed_secs == 0.0 {
        return 0;
    }
    let words = chars_typed as f64 / CHARS_PER_WORD;
    let minutes = elapsed_secs / 60.0;
    (words / minutes).round() as u32
}

/// Accuracy percentage from cumulative mistakes against the target length.
///
/// Mistakes are monotonic within a session and may exceed the target length
/// (a re-typed index can be charged again), so the result clamps at 0.
pub fn accuracy(mistakes: u32, target_len: usize) -> u8 {
    if target_len == 0 {
        return 100;
    }
    let ratio = 1.0 - (mistakes as f64 / target_len as f64);
    (100.0 * ratio).round().max(0.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wpm_zero_elapsed() {
        assert_eq!(wpm(0, 0.0), 0);
        assert_eq!(wpm(500, 0.0), 0);
    }

    #[test]
    fn test_wpm_one_word_per_minute() {
        // 5 chars in 60s = 1 wpm
        assert_eq!(wpm(5, 60.0), 1);
    }

    #[test]
    fn test_wpm_short_burst() {
        // 3 chars in 6s: (3/5) / (6/60) = 6
        assert_eq!(wpm(3, 6.0), 6);
    }

    #[test]
    fn test_wpm_rounds_half_away_from_zero() {
        // 4.5 words/min rounds up to 5
        assert_eq!(wpm(45, 120.0), 5);
        // 4.4 rounds down
        assert_eq!(wpm(44, 120.0), 4);
    }

    #[test]
    fn test_wpm_typical_sentence() {
        // 44 chars in 12s = 44 wpm
        assert_eq!(wpm(44, 12.0), 44);
    }

    #[test]
    fn test_accuracy_empty_target() {
        assert_eq!(accuracy(0, 0), 100);
        assert_eq!(accuracy(7, 0), 100);
    }

    #[test]
    fn test_accuracy_perfect() {
        assert_eq!(accuracy(0, 44), 100);
    }

    #[test]
    fn test_accuracy_one_in_three() {
        // 1 mistake over 3 chars: round(100 * 2/3) = 67
        assert_eq!(accuracy(1, 3), 67);
    }

    #[test]
    fn test_accuracy_clamps_at_zero() {
        assert_eq!(accuracy(3, 3), 0);
        assert_eq!(accuracy(10, 3), 0);
        assert_eq!(accuracy(u32::MAX, 1), 0);
    }

    #[test]
    fn test_accuracy_always_in_range() {
        for mistakes in 0..50 {
            for len in 0..20 {
                let a = accuracy(mistakes, len);
                assert!(a <= 100);
            }
        }
    }
}
