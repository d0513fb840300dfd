//! `SignalD` => `Stream` adapter.

use std::{
	pin::Pin,
	task::{Context, Poll},
};

use futures_channel::mpsc;
use futures_lite::Stream;
use pin_project::pin_project;
use ripple::{ConnectionGuard, Dispatcher, SignalD, SignalError};

/// A [`Stream`] of the arguments of each `fire` of a signal, from [`events`].
///
/// Items arrive once the signal's dispatcher runs the underlying listener,
/// not directly during `fire`.
///
/// The stream ends when the listener is disconnected and all buffered items were taken,
/// e.g. after `disconnect_all` or `destroy`. Dropping it disconnects the listener.
#[pin_project]
#[must_use = "Streams do nothing unless polled, and dropping `Events` disconnects it."]
pub struct Events<A> {
	guard: ConnectionGuard<A>,
	#[pin]
	receiver: mpsc::UnboundedReceiver<A>,
}

impl<A> Events<A> {
	/// Whether the underlying listener is still connected.
	#[must_use]
	pub fn is_connected(&self) -> bool {
		self.guard.connection().is_connected()
	}
}

/// Connects a persistent listener to `signal` that feeds the returned [`Events`] stream.
///
/// # Errors
///
/// [`SignalError::Destroyed`] iff `signal` was destroyed.
pub fn events<A: 'static, D: 'static + Dispatcher>(
	signal: &SignalD<A, D>,
) -> Result<Events<A>, SignalError> {
	let (sender, receiver) = mpsc::unbounded();
	let connection = signal.connect(move |args| {
		// The receiver only goes away together with the connection.
		sender.unbounded_send(args).ok();
	})?;
	Ok(Events {
		guard: connection.guard(),
		receiver,
	})
}

impl<A> Stream for Events<A> {
	type Item = A;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.project().receiver.poll_next(cx)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.receiver.size_hint()
	}
}
