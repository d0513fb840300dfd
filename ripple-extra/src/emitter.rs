//! A plain synchronous event source, usable as [`NativeEvent`] for [`SignalD::wrap`](`ripple::SignalD::wrap`).

use std::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	rc::{Rc, Weak},
};

use ripple::{NativeEvent, NativeSubscription};

type Handlers<A> = RefCell<Vec<(u64, Rc<dyn Fn(A)>)>>;

/// Calls every subscribed handler inline on [`emit`](`Emitter::emit`).
///
/// Handlers subscribed or unsubscribed during an emission take effect from the next one.
pub struct Emitter<A> {
	handlers: Rc<Handlers<A>>,
	next_id: Cell<u64>,
}

impl<A> Default for Emitter<A> {
	fn default() -> Self {
		Self {
			handlers: Rc::default(),
			next_id: Cell::new(0),
		}
	}
}

impl<A> Debug for Emitter<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Emitter")
			.field("handlers", &self.handler_count())
			.finish_non_exhaustive()
	}
}

impl<A> Emitter<A> {
	/// Creates a new [`Emitter`] without handlers.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Calls each current handler with a clone of `args`, in subscription order.
	pub fn emit(&self, args: A)
	where
		A: Clone,
	{
		let snapshot = self
			.handlers
			.borrow()
			.iter()
			.map(|(_, handler)| Rc::clone(handler))
			.collect::<Vec<_>>();
		for handler in snapshot {
			handler(args.clone());
		}
	}

	/// The number of currently subscribed handlers.
	#[must_use]
	pub fn handler_count(&self) -> usize {
		self.handlers.borrow().len()
	}
}

impl<A: 'static> NativeEvent<A> for Emitter<A> {
	type Subscription = EmitterSubscription<A>;

	fn subscribe(&self, handler: Box<dyn Fn(A)>) -> Self::Subscription {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		self.handlers.borrow_mut().push((id, Rc::from(handler)));
		EmitterSubscription {
			handlers: Rc::downgrade(&self.handlers),
			id,
		}
	}
}

/// The [`NativeSubscription`] of an [`Emitter`] handler.
pub struct EmitterSubscription<A> {
	handlers: Weak<Handlers<A>>,
	id: u64,
}

impl<A: 'static> Debug for EmitterSubscription<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("EmitterSubscription")
			.field("id", &self.id)
			.field("active", &self.is_active())
			.finish()
	}
}

impl<A: 'static> NativeSubscription for EmitterSubscription<A> {
	fn unsubscribe(&mut self) {
		if let Some(handlers) = self.handlers.upgrade() {
			let removed = {
				let mut handlers = handlers.borrow_mut();
				handlers
					.iter()
					.position(|(id, _)| *id == self.id)
					.map(|index| handlers.remove(index))
			};
			drop(removed);
		}
	}

	fn is_active(&self) -> bool {
		let Some(handlers) = self.handlers.upgrade() else {
			return false;
		};
		let active = handlers.borrow().iter().any(|(id, _)| *id == self.id);
		active
	}
}
