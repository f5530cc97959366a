//! Observability helpers shared by the authority and the gateway.
//!
//! Every token operation runs inside a `session_broker.op` span carrying `op` and `stage`
//! fields. With the `metrics` feature, each attempt/success/failure also increments the
//! `session_broker_op_total` counter labeled by `op` + `outcome`.

mod counter;
mod span;
mod subscriber;

pub use self::{counter::*, span::*, subscriber::*};

// self
use crate::_prelude::*;

/// Session operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Token Authority issuance.
	Issue,
	/// Token Authority validation.
	Validate,
	/// Token Authority revocation.
	Revoke,
	/// Gateway login (credential check plus issuance).
	Login,
	/// Gateway per-request session check.
	Authenticate,
	/// Gateway logout.
	Logout,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Issue => "issue",
			OpKind::Validate => "validate",
			OpKind::Revoke => "revoke",
			OpKind::Login => "login",
			OpKind::Authenticate => "authenticate",
			OpKind::Logout => "logout",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an [`OpSpan`] and records its attempt and terminal outcome.
pub async fn observe<T, Fut>(kind: OpKind, stage: &'static str, owner: &Owner, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OpSpan::new(kind, stage, owner);

	record_op_outcome(kind, OpOutcome::Attempt);

	let result = span.in_span(fut).await;

	record_result(kind, &result);

	result
}
