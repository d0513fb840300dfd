//! `SignalD` => `Future` adapters.

use ripple::{Dispatcher, SignalD, SignalError, WaitError};
use thiserror::Error;
use tracing::trace;

/// Why [`next_matching`] gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NextError {
	/// The signal was destroyed before waiting started.
	#[error(transparent)]
	Signal(#[from] SignalError),
	/// A [`Wait`](`ripple::Wait`) was cancelled, e.g. by `disconnect_all`, `destroy` or dropping the signal.
	#[error(transparent)]
	Wait(#[from] WaitError),
}

/// Waits for the next `fire` of `signal` whose arguments satisfy `predicate`.
///
/// Each attempt is a fresh [`SignalD::wait`], so fires that happen between attempts
/// (while this future isn't polled) are missed.
///
/// # Errors
///
/// [`NextError::Signal`] iff `signal` is destroyed when an attempt starts.  
/// [`NextError::Wait`] iff the signal stops waiting before a matching fire.
pub async fn next_matching<A: 'static, D: 'static + Dispatcher>(
	signal: &SignalD<A, D>,
	mut predicate: impl FnMut(&A) -> bool,
) -> Result<A, NextError> {
	loop {
		let args = signal.wait()?.await?;
		if predicate(&args) {
			return Ok(args);
		}
		trace!("skipped non-matching fire");
	}
}
