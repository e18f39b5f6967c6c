//! Scoring formulas shared by the live readouts and the results overlay.
//!
//! A "word" is five correct characters. Live WPM divides by the wall-clock
//! time elapsed so far (never less than one second); final WPM divides by
//! the configured duration, so a test finished early is scored against the
//! full duration.

/// Characters that make up one standard word
pub const CHARS_PER_WORD: f64 = 5.0;

/// Live words per minute from correct characters and elapsed whole seconds
pub fn live_wpm(correct_chars: usize, elapsed_secs: u64) -> u32 {
    let minutes = elapsed_secs.max(1) as f64 / 60.0;
    ((correct_chars as f64 / CHARS_PER_WORD) / minutes).round() as u32
}

/// Percentage of typed characters that matched; 100 when nothing was typed
pub fn accuracy(correct_chars: usize, typed_chars: usize) -> u32 {
    if typed_chars == 0 {
        return 100;
    }
    ((correct_chars as f64 / typed_chars as f64) * 100.0).round() as u32
}

/// Final words per minute, scored against the nominal duration
pub fn final_wpm(correct_chars: usize, duration_secs: u32) -> u32 {
    if correct_chars == 0 || duration_secs == 0 {
        return 0;
    }
    (correct_chars as f64 / CHARS_PER_WORD / (duration_secs as f64 / 60.0)).round() as u32
}

/// Correct characters per minute over the nominal duration
pub fn chars_per_minute(correct_chars: usize, duration_secs: u32) -> u32 {
    if correct_chars == 0 || duration_secs == 0 {
        return 0;
    }
    (correct_chars as f64 / duration_secs as f64 * 60.0).round() as u32
}

/// Typed keys per second over the nominal duration
pub fn keys_per_second(typed_chars: usize, duration_secs: u32) -> f64 {
    if typed_chars == 0 || duration_secs == 0 {
        return 0.0;
    }
    typed_chars as f64 / duration_secs as f64
}
