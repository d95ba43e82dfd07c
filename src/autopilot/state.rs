use std::time::{Duration, Instant};

use crate::course::LessonPath;

/// Where the automaton currently is. `Completed` is terminal for the
/// page load; every other phase can be re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Locating,
    PlayerBound,
    Ended,
    Completed,
}

/// Outcome of the background-policy gate for one end-of-video signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundGate {
    /// Foreground, proceed normally
    Proceed,
    /// Backgrounded but allowed to continue
    ProceedBackground,
    /// Backgrounded and suppressed; caller logs this one
    SkipLogged,
    /// Backgrounded and suppressed; already logged this period
    SkipSilent,
}

/// The automaton's owned context. All timestamps are wall-clock
/// `Instant`s so the cooldown guards are robust against callback
/// reordering (not against system clock changes).
#[derive(Debug)]
pub struct AutomatonState {
    pub phase: Phase,
    pub player_bound: bool,
    pub player_ever_seen: bool,
    pub user_has_interacted: bool,
    valid_path: Option<bool>,
    generation: Option<u64>,
    last_end_handled: Option<Instant>,
    last_advance: Option<Instant>,
    last_missing_log: Option<Instant>,
    background_skip_logged: bool,
    completed: bool,
}

impl Default for AutomatonState {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomatonState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            player_bound: false,
            player_ever_seen: false,
            user_has_interacted: false,
            valid_path: None,
            generation: None,
            last_end_handled: None,
            last_advance: None,
            last_missing_log: None,
            background_skip_logged: false,
            completed: false,
        }
    }

    /// Track the page's structural-change counter. A changed generation
    /// invalidates the cached player binding and the memoized path
    /// decision before anything else in the tick can observe them, which
    /// is what keeps exactly one polling loop alive at a time.
    pub fn observe_generation(&mut self, generation: u64) -> bool {
        match self.generation {
            Some(current) if current == generation => false,
            Some(_) => {
                self.generation = Some(generation);
                self.player_bound = false;
                self.valid_path = None;
                if !self.completed {
                    self.phase = Phase::Locating;
                }
                true
            }
            None => {
                self.generation = Some(generation);
                false
            }
        }
    }

    /// Memoized lesson-path recognition; the cached answer lives until
    /// the next structural change.
    pub fn check_path(&mut self, path: &str) -> bool {
        *self
            .valid_path
            .get_or_insert_with(|| LessonPath::is_lesson_path(path))
    }

    pub fn set_idle(&mut self) {
        if !self.completed {
            self.phase = Phase::Idle;
        }
    }

    pub fn enter_locating(&mut self) {
        if !self.completed {
            self.phase = Phase::Locating;
        }
    }

    pub fn bind_player(&mut self) {
        self.player_bound = true;
        if !self.completed {
            self.phase = Phase::PlayerBound;
        }
    }

    /// A lookup for the cached handle failed: drop it and go back to
    /// locating. Never an error.
    pub fn unbind_player(&mut self) {
        self.player_bound = false;
        if !self.completed {
            self.phase = Phase::Locating;
        }
    }

    /// Both end-of-video cooldowns: since the handler last ran, and since
    /// the last successful advance.
    pub fn cooldowns_elapsed(&self, now: Instant, cooldown: Duration) -> bool {
        let elapsed = |at: Option<Instant>| match at {
            Some(at) => now.saturating_duration_since(at) >= cooldown,
            None => true,
        };
        elapsed(self.last_end_handled) && elapsed(self.last_advance)
    }

    pub fn note_end_handled(&mut self, now: Instant) {
        self.last_end_handled = Some(now);
        if !self.completed {
            self.phase = Phase::Ended;
        }
    }

    /// Apply the background policy to one signal. The skip notice is
    /// emitted once per contiguous backgrounded period, tracked by a
    /// latch that resets as soon as a signal proceeds.
    pub fn gate_background(&mut self, hidden: bool, background_allowed: bool) -> BackgroundGate {
        if hidden && !background_allowed {
            if self.background_skip_logged {
                BackgroundGate::SkipSilent
            } else {
                self.background_skip_logged = true;
                BackgroundGate::SkipLogged
            }
        } else {
            self.background_skip_logged = false;
            if hidden {
                BackgroundGate::ProceedBackground
            } else {
                BackgroundGate::Proceed
            }
        }
    }

    /// A navigation succeeded; the host page is expected to replace the
    /// player, so drop the binding and wait for the new one.
    pub fn note_advanced(&mut self, now: Instant) {
        self.last_advance = Some(now);
        self.player_bound = false;
        if !self.completed {
            self.phase = Phase::Locating;
        }
    }

    /// One-shot completion latch. True exactly once per page load.
    pub fn latch_completed(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.phase = Phase::Completed;
        true
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Rate limiter for the "player not found" notice: at most one per
    /// cooldown window. Polling itself is not limited.
    pub fn should_log_player_missing(&mut self, now: Instant, window: Duration) -> bool {
        let due = match self.last_missing_log {
            Some(at) => now.saturating_duration_since(at) > window,
            None => true,
        };
        if due {
            self.last_missing_log = Some(now);
        }
        due
    }
}
