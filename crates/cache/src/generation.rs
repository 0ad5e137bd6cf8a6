//! Fetch generation guard
//!
//! Serial-number scheme that retires in-flight fetches without stopping
//! them. A fetch records the generation it was started under; anything
//! that supersedes it bumps the generation, and the retired task finds
//! out at its next check that it may no longer commit.

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct GuardState {
    generation: u64,
    active: bool,
}

/// Decides which in-flight fetch is allowed to commit its result.
///
/// Exactly one token is canonical at any time: the one equal to the
/// current generation.
#[derive(Debug, Default)]
pub struct FetchGuard {
    state: Mutex<GuardState>,
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a token for a new fetch.
    ///
    /// Starting a fetch while another is active retires the previous
    /// token without stopping its task.
    pub fn begin(&self) -> u64 {
        let mut state = self.state.lock();
        if state.active {
            state.generation += 1;
        } else {
            state.active = true;
        }
        state.generation
    }

    /// Retire the active fetch, if any.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if state.active {
            state.generation += 1;
            state.active = false;
        }
    }

    /// Whether the token still identifies the canonical fetch.
    pub fn is_current(&self, token: u64) -> bool {
        self.state.lock().generation == token
    }

    /// Run `commit` iff `token` is still current, holding the guard lock
    /// so the check cannot race a concurrent `cancel` or `begin`.
    ///
    /// Returns whether the commit ran.
    pub fn commit_if_current(&self, token: u64, commit: impl FnOnce()) -> bool {
        let state = self.state.lock();
        if state.generation != token {
            return false;
        }
        commit();
        true
    }
}
