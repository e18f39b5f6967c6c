use crate::language::Language;
use crate::results::ResultRecord;
use crate::stats;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fresh session, waiting for the first keystroke
    Idle,
    Running,
    /// Terminal until the next reset
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharState {
    Untyped,
    Correct,
    Incorrect,
}

/// Armed countdown. At most one per session; cancelling drops it so later
/// ticks are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    started_at: Instant,
}

impl Countdown {
    fn arm(now: Instant) -> Self {
        Self { started_at: now }
    }

    /// Whole seconds since the countdown was armed
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.started_at).as_secs()
    }
}

/// Readouts refreshed on every keystroke and tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: usize,
}

impl Default for LiveStats {
    fn default() -> Self {
        Self {
            wpm: 0,
            accuracy: 100,
            errors: 0,
        }
    }
}

/// Everything the results overlay needs once a test has ended
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub language: Language,
    pub duration_secs: u32,
    pub typed_chars: usize,
    pub correct_chars: usize,
    pub errors: usize,
    pub wpm: u32,
    pub cpm: u32,
    pub kps: f64,
    pub accuracy: u32,
}

impl SessionSummary {
    pub fn to_record(&self, date: String) -> ResultRecord {
        ResultRecord {
            date,
            language: self.language.tag(),
            duration: self.duration_secs,
            wpm: self.wpm,
            accuracy: self.accuracy,
            errors: self.errors,
        }
    }
}

/// One attempt at one passage
#[derive(Debug, Clone)]
pub struct Session {
    language: Language,
    duration_secs: u32,
    remaining_secs: u32,
    phase: Phase,
    passage: String,
    passage_chars: Vec<char>,
    input: String,
    typed_chars: usize,
    correct_chars: usize,
    errors: usize,
    char_states: Vec<CharState>,
    countdown: Option<Countdown>,
    live: LiveStats,
}

impl Session {
    pub fn new(language: Language, duration_secs: u32, passage: String) -> Self {
        let passage_chars: Vec<char> = passage.chars().collect();
        Self {
            language,
            duration_secs,
            remaining_secs: duration_secs,
            phase: Phase::Idle,
            char_states: vec![CharState::Untyped; passage_chars.len()],
            passage,
            passage_chars,
            input: String::new(),
            typed_chars: 0,
            correct_chars: 0,
            errors: 0,
            countdown: None,
            live: LiveStats::default(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn passage(&self) -> &str {
        &self.passage
    }

    pub fn passage_chars(&self) -> &[char] {
        &self.passage_chars
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn typed_chars(&self) -> usize {
        self.typed_chars
    }

    pub fn correct_chars(&self) -> usize {
        self.correct_chars
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn char_states(&self) -> &[CharState] {
        &self.char_states
    }

    pub fn live(&self) -> LiveStats {
        self.live
    }

    pub fn countdown(&self) -> Option<Countdown> {
        self.countdown
    }

    pub fn accepts_input(&self) -> bool {
        self.phase != Phase::Ended
    }

    /// Position highlighted as the next one to type. Stays on the last
    /// character once the input reaches the end of the passage.
    pub fn cursor(&self) -> Option<usize> {
        if self.passage_chars.is_empty() {
            return None;
        }
        Some(self.typed_chars.min(self.passage_chars.len() - 1))
    }

    pub fn push_char(&mut self, c: char, now: Instant) -> Option<SessionSummary> {
        if !self.accepts_input() {
            return None;
        }
        let mut value = self.input.clone();
        value.push(c);
        self.set_input(value, now)
    }

    /// Deleting from an empty input is not an input event
    pub fn backspace(&mut self, now: Instant) -> Option<SessionSummary> {
        if !self.accepts_input() || self.input.is_empty() {
            return None;
        }
        let mut value = self.input.clone();
        value.pop();
        self.set_input(value, now)
    }

    /// Replace the whole input value, as an input field would report it.
    /// Starts the countdown on the first call and ends the session once the
    /// input covers the passage.
    pub fn set_input(&mut self, value: String, now: Instant) -> Option<SessionSummary> {
        if !self.accepts_input() {
            return None;
        }
        if self.phase == Phase::Idle {
            self.start(now);
        }

        self.input = value;
        self.rescore();
        self.refresh_live(now);

        if self.typed_chars >= self.passage_chars.len() {
            return self.finish();
        }
        None
    }

    /// Advance the countdown. Without an armed countdown this is a no-op.
    pub fn tick(&mut self, now: Instant) -> Option<SessionSummary> {
        let countdown = self.countdown?;

        let elapsed = countdown.elapsed_secs(now);
        self.remaining_secs = (self.duration_secs as u64).saturating_sub(elapsed) as u32;
        self.refresh_live(now);

        if self.remaining_secs == 0 {
            return self.finish();
        }
        None
    }

    fn start(&mut self, now: Instant) {
        // replaces, never stacks: one countdown per session
        self.countdown = Some(Countdown::arm(now));
        self.phase = Phase::Running;
        tracing::debug!(
            language = %self.language,
            duration = self.duration_secs,
            "session started"
        );
    }

    fn rescore(&mut self) {
        let typed: Vec<char> = self.input.chars().collect();
        self.typed_chars = typed.len();
        self.correct_chars = 0;
        self.errors = 0;

        for (i, expected) in self.passage_chars.iter().enumerate() {
            self.char_states[i] = match typed.get(i) {
                Some(c) if c == expected => {
                    self.correct_chars += 1;
                    CharState::Correct
                }
                Some(_) => {
                    self.errors += 1;
                    CharState::Incorrect
                }
                None => CharState::Untyped,
            };
        }
    }

    fn refresh_live(&mut self, now: Instant) {
        let elapsed = match self.countdown {
            Some(countdown) => countdown.elapsed_secs(now).min(self.duration_secs as u64),
            None => (self.duration_secs - self.remaining_secs) as u64,
        };

        self.live = LiveStats {
            wpm: stats::live_wpm(self.correct_chars, elapsed),
            accuracy: stats::accuracy(self.correct_chars, self.typed_chars),
            errors: self.errors,
        };
    }

    /// Running -> Ended. Returns the summary exactly once per session.
    fn finish(&mut self) -> Option<SessionSummary> {
        if self.phase == Phase::Ended {
            return None;
        }
        self.countdown = None;
        self.phase = Phase::Ended;

        let summary = SessionSummary {
            language: self.language,
            duration_secs: self.duration_secs,
            typed_chars: self.typed_chars,
            correct_chars: self.correct_chars,
            errors: self.errors,
            wpm: stats::final_wpm(self.correct_chars, self.duration_secs),
            cpm: stats::chars_per_minute(self.correct_chars, self.duration_secs),
            kps: stats::keys_per_second(self.typed_chars, self.duration_secs),
            accuracy: stats::accuracy(self.correct_chars, self.typed_chars),
        };

        tracing::debug!(
            wpm = summary.wpm,
            accuracy = summary.accuracy,
            errors = summary.errors,
            "session ended"
        );
        Some(summary)
    }
}
