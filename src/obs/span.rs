// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::OpKind};

/// A span builder used by session operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	span: Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	///
	/// `owner` is recorded by fingerprint only.
	pub fn new(kind: OpKind, stage: &'static str, owner: &Owner) -> Self {
		let span = tracing::info_span!(
			"session_broker.op",
			op = kind.as_str(),
			stage,
			owner = %owner.fingerprint(),
		);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn in_span<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn in_span_wraps_future() {
		let owner = Owner::new("a@x.com").expect("Owner fixture should be valid.");
		let span = OpSpan::new(OpKind::Validate, "in_span_wraps_future", &owner);
		let value = span.in_span(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
