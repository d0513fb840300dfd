use thiserror::Error;

/// Errors returned synchronously by [`SignalD`](`crate::SignalD`) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
	/// The signal was [destroyed](`crate::SignalD::destroy`) and rejects all further interaction.
	#[error("the signal has been destroyed")]
	Destroyed,

	/// [`SignalD::wrap_any`](`crate::SignalD::wrap_any`) was given a value that isn't the expected native event type.
	#[error("expected a native event of type `{expected}`, found `{found}`")]
	TypeMismatch {
		/// The native event type that was asked for.
		expected: &'static str,
		/// The type of the value that was actually passed.
		found: &'static str,
	},
}

/// The failure outcome of a [`Wait`](`crate::Wait`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaitError {
	/// The waiting connection was removed before the signal fired again,
	/// through `disconnect_all`, `destroy` or by dropping the signal.
	#[error("the signal stopped waiting before it fired")]
	Cancelled,
}
