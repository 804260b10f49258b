use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight control that admits at most one session at a time.
///
/// Starts out accepting. `try_acquire` flips it closed atomically, so a
/// re-delivered Rising edge observed before the first acquisition's side
/// effects finish is rejected.
#[derive(Debug)]
pub struct SessionGuard {
    accepting_new_session: AtomicBool,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self {
            accepting_new_session: AtomicBool::new(true),
        }
    }

    /// Take the guard. Returns `false`, with no side effects, if it is held.
    pub fn try_acquire(&self) -> bool {
        self.accepting_new_session
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Reopen the guard. Idempotent.
    pub fn release(&self) {
        self.accepting_new_session.store(true, Ordering::Release);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting_new_session.load(Ordering::Acquire)
    }
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_starts_accepting() {
        assert!(SessionGuard::new().is_accepting());
    }

    #[test]
    fn test_second_acquire_rejected() {
        let guard = SessionGuard::new();

        assert!(guard.try_acquire());
        assert!(!guard.try_acquire());
        assert!(!guard.is_accepting());
    }

    #[test]
    fn test_release_is_idempotent() {
        let guard = SessionGuard::new();
        guard.try_acquire();

        guard.release();
        guard.release();

        assert!(guard.is_accepting());
        assert!(guard.try_acquire());
    }

    #[test]
    fn test_single_winner_across_threads() {
        let guard = Arc::new(SessionGuard::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                std::thread::spawn(move || guard.try_acquire())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|acquired| *acquired)
            .count();

        assert_eq!(winners, 1);
    }
}
