//! Authentication state with a timed session.
//!
//! A correct password switches the actuator on and opens a session. The main
//! loop calls [`AuthGate::tick`] on every iteration; once the session is older
//! than the configured duration the actuator is switched off again.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::actuator::Actuator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// `since_ms` is the clock reading of the last successful login.
    Authenticated { since_ms: u32 },
}

pub struct AuthGate<A> {
    actuator: A,
    secret: &'static str,
    session_ms: u32,
    state: AuthState,
}

/// The HTTP server runs handlers on its own task, so the gate lives behind a mutex.
pub type SharedGate<A> = Arc<Mutex<AuthGate<A>>>;

impl<A: Actuator> AuthGate<A> {
    /// Starts unauthenticated with the actuator switched off.
    pub fn new(mut actuator: A, secret: &'static str, session_ms: u32) -> Self {
        actuator.set_active(false);
        Self {
            actuator,
            secret,
            session_ms,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn shared(self) -> SharedGate<A> {
        Arc::new(Mutex::new(self))
    }

    /// Checks `submitted` against the secret.
    ///
    /// On a match the session is (re)started at `now_ms` and the actuator is
    /// switched on. A mismatch leaves everything untouched, including a
    /// session that is already running.
    pub fn authenticate(&mut self, submitted: &str, now_ms: u32) -> bool {
        if submitted != self.secret {
            log::warn!("Authentication failed");
            return false;
        }

        if self.is_authenticated() {
            log::info!("Re-authenticated, session restarted");
        } else {
            log::info!("Authenticated, LED on for {} ms", self.session_ms);
        }
        self.state = AuthState::Authenticated { since_ms: now_ms };
        self.actuator.set_active(true);
        true
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated { .. })
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> AuthState {
        self.state
    }

    /// Expires the session once more than `session_ms` has elapsed.
    ///
    /// Returns true when this call ended the session.
    pub fn tick(&mut self, now_ms: u32) -> bool {
        let AuthState::Authenticated { since_ms } = self.state else {
            return false;
        };

        if now_ms.wrapping_sub(since_ms) > self.session_ms {
            self.end_session();
            log::info!("Session expired after {} ms, LED off", self.session_ms);
            true
        } else {
            false
        }
    }

    /// Ends the current session early. Returns false if there was none.
    pub fn logout(&mut self) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        self.end_session();
        log::info!("Logged out, LED off");
        true
    }

    /// Time left in the current session.
    pub fn remaining_ms(&self, now_ms: u32) -> Option<u32> {
        match self.state {
            AuthState::Authenticated { since_ms } => {
                Some(self.session_ms.saturating_sub(now_ms.wrapping_sub(since_ms)))
            }
            AuthState::Unauthenticated => None,
        }
    }

    fn end_session(&mut self) {
        self.actuator.set_active(false);
        self.state = AuthState::Unauthenticated;
    }
}

/// Locks the shared gate, turning a poisoned lock into an error.
pub fn lock<A>(gate: &SharedGate<A>) -> anyhow::Result<MutexGuard<'_, AuthGate<A>>> {
    gate.lock().map_err(|_| anyhow::anyhow!("Auth gate lock poisoned"))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::{AuthGate, AuthState};
    use crate::actuator::Actuator;

    /// Records every level written to it.
    #[derive(Clone, Default)]
    pub struct RecordingActuator {
        pub writes: Rc<RefCell<Vec<bool>>>,
    }

    impl RecordingActuator {
        pub fn level(&self) -> Option<bool> {
            self.writes.borrow().last().copied()
        }
    }

    impl Actuator for RecordingActuator {
        fn set_active(&mut self, active: bool) {
            self.writes.borrow_mut().push(active);
        }
    }

    pub fn gate() -> (AuthGate<RecordingActuator>, RecordingActuator) {
        let led = RecordingActuator::default();
        (AuthGate::new(led.clone(), "1234", 15_000), led)
    }

    #[test]
    fn test_starts_unauthenticated_with_led_off() {
        let (gate, led) = gate();
        assert!(!gate.is_authenticated());
        assert_eq!(gate.state(), AuthState::Unauthenticated);
        assert_eq!(*led.writes.borrow(), vec![false]);
    }

    #[test]
    fn test_authenticate_only_accepts_exact_secret() {
        let (mut gate, led) = gate();
        for wrong in ["", "123", "12345", " 1234", "1234 ", "wrong"] {
            assert!(!gate.authenticate(wrong, 100));
            assert_eq!(gate.state(), AuthState::Unauthenticated);
        }
        assert_eq!(led.level(), Some(false));

        assert!(gate.authenticate("1234", 100));
        assert_eq!(gate.state(), AuthState::Authenticated { since_ms: 100 });
        assert_eq!(led.level(), Some(true));
    }

    #[test]
    fn test_wrong_password_does_not_touch_running_session() {
        let (mut gate, led) = gate();
        gate.authenticate("1234", 1_000);
        let writes = led.writes.borrow().len();

        assert!(!gate.authenticate("nope", 5_000));
        assert_eq!(gate.state(), AuthState::Authenticated { since_ms: 1_000 });
        assert_eq!(led.writes.borrow().len(), writes);
    }

    #[test]
    fn test_session_expires_strictly_after_duration() {
        let (mut gate, led) = gate();
        gate.authenticate("1234", 1_000);

        for now in [1_000, 2_000, 10_000, 16_000] {
            assert!(!gate.tick(now));
            assert!(gate.is_authenticated());
            assert_eq!(led.level(), Some(true));
        }

        assert!(gate.tick(16_001));
        assert!(!gate.is_authenticated());
        assert_eq!(led.level(), Some(false));

        // only the first expired tick reports the transition
        assert!(!gate.tick(20_000));
    }

    #[test]
    fn test_reauthentication_extends_session() {
        let (mut gate, _led) = gate();
        gate.authenticate("1234", 0);
        gate.authenticate("1234", 10_000);

        assert!(!gate.tick(20_000));
        assert!(gate.is_authenticated());
        assert!(gate.tick(25_001));
    }

    #[test]
    fn test_expiry_survives_counter_wraparound() {
        let (mut gate, led) = gate();
        let start = u32::MAX - 5_000;
        gate.authenticate("1234", start);

        // counter wrapped, only 10 001 ms elapsed
        assert!(!gate.tick(5_000));
        assert!(gate.is_authenticated());

        assert!(!gate.tick(start.wrapping_add(15_000)));
        assert!(gate.tick(start.wrapping_add(15_001)));
        assert_eq!(led.level(), Some(false));
    }

    #[test]
    fn test_logout_ends_session() {
        let (mut gate, led) = gate();
        assert!(!gate.logout());

        gate.authenticate("1234", 0);
        assert!(gate.logout());
        assert!(!gate.is_authenticated());
        assert_eq!(led.level(), Some(false));
        assert!(!gate.tick(100_000));
    }

    #[test]
    fn test_remaining_ms() {
        let (mut gate, _led) = gate();
        assert_eq!(gate.remaining_ms(0), None);

        gate.authenticate("1234", 1_000);
        assert_eq!(gate.remaining_ms(1_000), Some(15_000));
        assert_eq!(gate.remaining_ms(6_000), Some(10_000));
        assert_eq!(gate.remaining_ms(50_000), Some(0));
    }
}
