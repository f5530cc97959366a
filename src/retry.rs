//! Startup retry loop for dependencies that may come up after the service.
//!
//! Request paths never retry; this is only for reaching the store or the authority while a
//! deployment is still converging.

// self
use crate::_prelude::*;

/// Upper bound on any single backoff delay.
pub const MAX_DELAY: StdDuration = StdDuration::from_secs(30);

/// How the delay grows between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backoff {
	/// Same delay every time.
	Fixed,
	/// Delay doubles after each failure, capped at [`MAX_DELAY`].
	Exponential,
}

/// Bounded retry schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts, including the first. Zero is treated as one.
	pub max_attempts: u32,
	/// Delay after the first failure.
	pub delay: StdDuration,
	/// Growth of the delay across failures.
	pub backoff: Backoff,
}
impl RetryPolicy {
	/// Fixed-delay schedule.
	pub const fn fixed(max_attempts: u32, delay: StdDuration) -> Self {
		Self { max_attempts, delay, backoff: Backoff::Fixed }
	}

	/// Doubling schedule starting at `delay`.
	pub const fn exponential(max_attempts: u32, delay: StdDuration) -> Self {
		Self { max_attempts, delay, backoff: Backoff::Exponential }
	}

	/// Delay slept after failed attempt number `attempt` (1-based).
	pub fn delay_after(&self, attempt: u32) -> StdDuration {
		match self.backoff {
			Backoff::Fixed => self.delay,
			Backoff::Exponential => {
				let factor = 1_u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);

				self.delay.saturating_mul(factor).min(MAX_DELAY)
			},
		}
	}

	/// Runs `op` until it succeeds or attempts run out, returning the last error.
	///
	/// `op` receives the 1-based attempt number. `label` names the dependency in logs.
	pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
	where
		F: FnMut(u32) -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: Display,
	{
		let attempts = self.max_attempts.max(1);
		let mut attempt = 1;

		loop {
			match op(attempt).await {
				Ok(value) => {
					if attempt > 1 {
						tracing::info!(attempt, "{label} became reachable.");
					}

					return Ok(value);
				},
				Err(e) if attempt >= attempts => {
					tracing::error!(error = %e, attempt, "{label} is still unreachable; giving up.");

					return Err(e);
				},
				Err(e) => {
					let wait = self.delay_after(attempt);

					tracing::warn!(error = %e, attempt, ?wait, "{label} is unreachable; retrying.");
					tokio::time::sleep(wait).await;

					attempt += 1;
				},
			}
		}
	}
}
impl Default for RetryPolicy {
	/// Ten attempts, two seconds apart.
	fn default() -> Self {
		Self::fixed(10, StdDuration::from_secs(2))
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU32, Ordering};
	// self
	use super::*;

	#[test]
	fn exponential_delays_double_and_cap() {
		let policy = RetryPolicy::exponential(10, StdDuration::from_secs(1));

		assert_eq!(policy.delay_after(1), StdDuration::from_secs(1));
		assert_eq!(policy.delay_after(3), StdDuration::from_secs(4));
		assert_eq!(policy.delay_after(8), MAX_DELAY);
		assert_eq!(policy.delay_after(64), MAX_DELAY);
		assert_eq!(RetryPolicy::default().delay_after(5), StdDuration::from_secs(2));
	}

	#[tokio::test]
	async fn run_stops_at_first_success() {
		let calls = AtomicU32::new(0);
		let policy = RetryPolicy::fixed(5, StdDuration::from_millis(1));
		let value = policy
			.run("flaky dependency", |attempt| {
				calls.fetch_add(1, Ordering::SeqCst);

				async move { if attempt < 3 { Err("not yet") } else { Ok(attempt) } }
			})
			.await
			.expect("Third attempt should succeed.");

		assert_eq!(value, 3);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn run_returns_the_last_error() {
		let policy = RetryPolicy::fixed(2, StdDuration::from_millis(1));
		let err = policy
			.run("dead dependency", |attempt| async move {
				Err::<(), _>(format!("attempt {attempt}"))
			})
			.await
			.expect_err("Every attempt fails.");

		assert_eq!(err, "attempt 2");
	}
}
