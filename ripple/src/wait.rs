use std::{
	fmt::{self, Debug, Formatter},
	future::Future,
	pin::Pin,
	task::{Context, Poll},
};

use futures_channel::oneshot;
use pin_project::{pin_project, pinned_drop};

use crate::{Connection, WaitError};

/// A suspended caller, resumed by the next `fire` of the [`SignalD`](`crate::SignalD`) that created it.
///
/// Created by [`SignalD::wait`](`crate::SignalD::wait`), which links a hidden one-shot
/// listener in firing order like any other.
///
/// # Logic
///
/// Resolves to `Ok(args)` with the arguments of the first `fire` that reaches it.
/// The hidden listener is unlinked during that same `fire`.
///
/// Resolves to [`Err(WaitError::Cancelled)`](`WaitError::Cancelled`) if the hidden listener
/// is removed without firing, i.e. by `disconnect_all`, `destroy` or dropping the signal.
///
/// Dropping an unresolved [`Wait`] disconnects the hidden listener.
#[pin_project(PinnedDrop)]
#[must_use = "Futures do nothing unless polled, and dropping a `Wait` disconnects it."]
pub struct Wait<A> {
	connection: Connection<A>,
	#[pin]
	receiver: oneshot::Receiver<A>,
}

impl<A> Debug for Wait<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Wait")
			.field("connection", &self.connection)
			.finish_non_exhaustive()
	}
}

impl<A> Wait<A> {
	pub(crate) fn new(connection: Connection<A>, receiver: oneshot::Receiver<A>) -> Self {
		Self {
			connection,
			receiver,
		}
	}

	/// The hidden one-shot listener this [`Wait`] is suspended on.
	pub fn connection(&self) -> &Connection<A> {
		&self.connection
	}
}

impl<A> Future for Wait<A> {
	type Output = Result<A, WaitError>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		self.project()
			.receiver
			.poll(cx)
			.map_err(|oneshot::Canceled| WaitError::Cancelled)
	}
}

#[pinned_drop]
impl<A> PinnedDrop for Wait<A> {
	fn drop(self: Pin<&mut Self>) {
		self.connection.disconnect();
	}
}
