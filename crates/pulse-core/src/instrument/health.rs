use std::fmt;
use std::sync::Mutex;

type CheckFn = dyn Fn() -> Result<(), String> + Send + Sync;

/// Health probe wrapping a caller-supplied check function.
///
/// `check()` runs the function and stores the outcome; `error()` reads the
/// outcome of the most recent run without re-running the check.
pub struct HealthCheck {
    check: Box<CheckFn>,
    status: Mutex<Option<String>>,
}

impl HealthCheck {
    pub fn new(check: impl Fn() -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self {
            check: Box::new(check),
            status: Mutex::new(None),
        }
    }

    pub fn check(&self) {
        let outcome = (self.check)();
        if let Ok(mut status) = self.status.lock() {
            *status = outcome.err();
        }
    }

    pub fn error(&self) -> Option<String> {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(_) => None,
        }
    }

    pub fn healthy(&self) -> bool {
        self.error().is_none()
    }
}

impl fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheck")
            .field("error", &self.error())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::HealthCheck;

    #[test]
    fn records_unhealthy_outcome() {
        let health = HealthCheck::new(|| Err("test".to_string()));
        assert!(health.healthy());

        health.check();
        assert!(!health.healthy());
        assert_eq!(health.error().as_deref(), Some("test"));
    }

    #[test]
    fn recovers_when_check_passes() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let broken = Arc::new(AtomicBool::new(true));
        let probe = broken.clone();
        let health = HealthCheck::new(move || {
            if probe.load(Ordering::Relaxed) {
                Err("down".to_string())
            } else {
                Ok(())
            }
        });

        health.check();
        assert!(!health.healthy());

        broken.store(false, Ordering::Relaxed);
        health.check();
        assert!(health.healthy());
        assert_eq!(health.error(), None);
    }
}
