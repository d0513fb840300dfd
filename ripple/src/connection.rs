use std::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	rc::Weak,
};

use crate::ring::{Handle, Ring};

/// A handle to one registered listener of a [`SignalD`](`crate::SignalD`).
///
/// Connections are created linked and can only ever be unlinked once.
/// Holding on to a disconnected [`Connection`] is fine: every method is then a no-op.
///
/// Clones refer to the same listener.
pub struct Connection<A> {
	ring: Weak<RefCell<Ring<A>>>,
	handle: Handle,
}

impl<A> Clone for Connection<A> {
	fn clone(&self) -> Self {
		Self {
			ring: Weak::clone(&self.ring),
			handle: self.handle,
		}
	}
}

impl<A> Debug for Connection<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Connection")
			.field("handle", &self.handle)
			.field("connected", &self.is_connected())
			.finish()
	}
}

impl<A> Connection<A> {
	pub(crate) fn new(ring: Weak<RefCell<Ring<A>>>, handle: Handle) -> Self {
		Self { ring, handle }
	}

	/// Removes this listener from its signal.
	///
	/// **Idempotent.** Takes effect immediately: later `fire` calls won't reach this listener.
	/// Invocations that were already handed to the dispatcher are not recalled.
	pub fn disconnect(&self) {
		if let Some(ring) = self.ring.upgrade() {
			// Bound first so that the ring is released before the payload drops.
			let listener = ring.borrow_mut().unlink(self.handle);
			drop(listener);
		}
	}

	/// Alias of [`disconnect`](`Connection::disconnect`).
	pub fn destroy(&self) {
		self.disconnect();
	}

	/// Whether this listener is still linked into its signal.
	#[must_use]
	pub fn is_connected(&self) -> bool {
		self.ring
			.upgrade()
			.is_some_and(|ring| ring.borrow().is_connected(self.handle))
	}

	/// Whether this is a still-connected one-shot listener (from `once` or `wait`).
	#[must_use]
	pub fn is_once(&self) -> bool {
		self.ring
			.upgrade()
			.is_some_and(|ring| ring.borrow().is_once(self.handle))
	}

	/// Wraps this connection so that it disconnects when dropped.
	#[must_use = "Dropping the guard disconnects immediately."]
	pub fn guard(self) -> ConnectionGuard<A> {
		ConnectionGuard {
			connection: Some(self),
		}
	}
}

/// A [`Connection`] that [disconnects](`Connection::disconnect`) when dropped.
#[must_use = "Dropping the guard disconnects immediately."]
pub struct ConnectionGuard<A> {
	connection: Option<Connection<A>>,
}

impl<A> Debug for ConnectionGuard<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ConnectionGuard")
			.field(&self.connection)
			.finish()
	}
}

impl<A> ConnectionGuard<A> {
	/// Borrows the guarded [`Connection`].
	pub fn connection(&self) -> &Connection<A> {
		self.connection.as_ref().expect("unreachable")
	}

	/// Releases the guard without disconnecting.
	pub fn into_inner(mut self) -> Connection<A> {
		self.connection.take().expect("unreachable")
	}
}

impl<A> Drop for ConnectionGuard<A> {
	fn drop(&mut self) {
		if let Some(connection) = self.connection.take() {
			connection.disconnect();
		}
	}
}
