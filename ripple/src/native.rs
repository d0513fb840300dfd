//! The adapter contract for bridging foreign event sources into signals.
//!
//! See [`SignalD::wrap`](`crate::SignalD::wrap`).

use std::any::{type_name, Any};

/// A foreign event source that a [`SignalD`](`crate::SignalD`) can forward from.
pub trait NativeEvent<A> {
	/// The handle returned by [`subscribe`](`NativeEvent::subscribe`).
	type Subscription: NativeSubscription;

	/// Registers `handler` to be called with the arguments of every native invocation,
	/// until the returned subscription is [unsubscribed](`NativeSubscription::unsubscribe`).
	fn subscribe(&self, handler: Box<dyn Fn(A)>) -> Self::Subscription;
}

/// A subscription handle returned by [`NativeEvent::subscribe`].
pub trait NativeSubscription: 'static {
	/// Stops the handler from receiving further invocations.
	///
	/// **Should** be idempotent.
	fn unsubscribe(&mut self);

	/// Whether the handler still receives invocations.
	fn is_active(&self) -> bool;
}

/// Runtime-typed access to a value that may or may not be a [`NativeEvent`].
///
/// Implemented for every `'static` type.
/// See [`SignalD::wrap_any`](`crate::SignalD::wrap_any`).
pub trait AnyEvent: Any {
	/// The name of the concrete type, for diagnostics.
	fn type_name(&self) -> &'static str;

	/// Upcasts to [`Any`] for downcasting.
	fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AnyEvent for T {
	fn type_name(&self) -> &'static str {
		type_name::<T>()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}
