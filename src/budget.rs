//! Wall-clock execution budget, polled cooperatively at loop boundaries.

use std::time::{Duration, Instant};

use crate::error::DslError;

/// A deadline created from an optional timeout. `None` means no budget —
/// `check` never fails.
#[derive(Debug, Clone)]
pub struct Budget {
    start: Instant,
    deadline: Option<Instant>,
}

impl Budget {
    pub fn new(timeout: Option<Duration>) -> Self {
        let start = Instant::now();
        let deadline = timeout.map(|d| start + d);
        Self { start, deadline }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Fail with `DslError::Timeout` if the deadline has passed.
    pub fn check(&self, phase: &str) -> Result<(), DslError> {
        let Some(deadline) = self.deadline else {
            return Ok(());
        };
        let now = Instant::now();
        if now <= deadline {
            return Ok(());
        }
        let elapsed = now.saturating_duration_since(self.start);
        Err(DslError::Timeout {
            elapsed_s: elapsed.as_secs_f64(),
            phase: phase.to_string(),
            partial_output: None,
        })
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn unbounded_never_times_out() {
        let budget = Budget::unbounded();
        sleep(Duration::from_millis(5));
        assert!(budget.check("test").is_ok());
    }

    #[test]
    fn bounded_times_out_past_deadline() {
        let budget = Budget::new(Some(Duration::from_millis(1)));
        sleep(Duration::from_millis(10));
        let err = budget.check("evaluator loop").unwrap_err();
        match err {
            DslError::Timeout { elapsed_s, phase, .. } => {
                assert!(elapsed_s < 1.0);
                assert_eq!(phase, "evaluator loop");
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }
}
