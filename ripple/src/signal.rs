use std::{
	any::type_name,
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
	rc::{Rc, Weak},
};

use futures_channel::oneshot;
use ripple_runtime::Dispatcher;
use scopeguard::guard;
use tracing::{debug, trace};

use crate::{
	native::{AnyEvent, NativeEvent, NativeSubscription},
	ring::{Listener, Ring, Visit},
	Connection, SignalError, Wait,
};

/// Type inference helper alias for [`SignalD`] (using [`GlobalDispatcher`](`ripple_runtime::GlobalDispatcher`)).
#[cfg(feature = "global_dispatcher")]
pub type Signal<A> = SignalD<A, ripple_runtime::GlobalDispatcher>;

/// A publish/subscribe hub: listeners connect to it, and `fire` notifies them in connection order.
///
/// Callback listeners (from [`connect`](`SignalD::connect`) and [`once`](`SignalD::once`))
/// are not called by `fire` directly. Each invocation is submitted to the dispatcher `D`
/// and runs whenever that dispatcher gets to it.
/// [`Wait`]ers (from [`wait`](`SignalD::wait`)) are resumed by `fire` itself.
///
/// [`SignalD`] is a cheaply clonable handle. Clones refer to the same signal.
/// Listeners that re-fire or re-connect their own signal should capture a [`SignalWeak`]
/// from [`downgrade`](`SignalD::downgrade`) instead of a clone.
///
/// # Lifecycle
///
/// A signal is active until [`destroy`](`SignalD::destroy`) is called on any of its handles.
/// Afterwards, every operation except the read-only accessors fails with [`SignalError::Destroyed`].
///
/// Dropping the last handle disconnects all listeners (cancelling [`Wait`]ers) and
/// releases any wrapped native event.
///
/// A [`SignalD`] stored in one of its own listeners counts as a handle, so the signal
/// then stays alive until that listener is disconnected (directly, through
/// [`disconnect_all`](`SignalD::disconnect_all`) or through [`destroy`](`SignalD::destroy`)).
pub struct SignalD<A: 'static, D: 'static + Dispatcher> {
	inner: Rc<Inner<A, D>>,
}

struct Inner<A: 'static, D: 'static + Dispatcher> {
	ring: Rc<RefCell<Ring<A>>>,
	state: Cell<State>,
	dispatcher: D,
	native: RefCell<Option<Box<dyn NativeSubscription>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	Active,
	Destroyed,
}

/// A non-owning handle to a [`SignalD`], from [`SignalD::downgrade`].
pub struct SignalWeak<A: 'static, D: 'static + Dispatcher> {
	inner: Weak<Inner<A, D>>,
}

impl<A: 'static, D: 'static + Dispatcher> Clone for SignalWeak<A, D> {
	fn clone(&self) -> Self {
		Self {
			inner: Weak::clone(&self.inner),
		}
	}
}

impl<A: 'static, D: 'static + Dispatcher> Debug for SignalWeak<A, D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("SignalWeak")
			.field("alive", &(self.inner.strong_count() > 0))
			.finish()
	}
}

impl<A: 'static, D: 'static + Dispatcher> SignalWeak<A, D> {
	/// A strong handle to the signal, unless all of those were dropped already.
	#[must_use]
	pub fn upgrade(&self) -> Option<SignalD<A, D>> {
		self.inner.upgrade().map(|inner| SignalD { inner })
	}
}

impl<A: 'static, D: 'static + Dispatcher> Clone for SignalD<A, D> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<A: 'static, D: 'static + Dispatcher + Debug> Debug for SignalD<A, D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("SignalD")
			.field("state", &self.inner.state.get())
			.field("ring", &self.inner.ring)
			.field("dispatcher", &self.inner.dispatcher)
			.field("wraps_native", &self.inner.native.borrow().is_some())
			.finish()
	}
}

impl<A: 'static, D: 'static + Dispatcher + Default> Default for SignalD<A, D> {
	fn default() -> Self {
		Self::new()
	}
}

impl<A: 'static, D: 'static + Dispatcher> SignalD<A, D> {
	/// Creates a new signal without listeners.
	#[must_use]
	pub fn new() -> Self
	where
		D: Default,
	{
		Self::with_dispatcher(D::default())
	}

	/// Creates a new signal without listeners that submits callbacks to `dispatcher`.
	#[must_use]
	pub fn with_dispatcher(dispatcher: D) -> Self {
		Self::with_dispatcher_and_capacity(dispatcher, 0)
	}

	/// Creates a new signal with room for `capacity` listeners before reallocating.
	#[must_use]
	pub fn with_capacity(capacity: usize) -> Self
	where
		D: Default,
	{
		Self::with_dispatcher_and_capacity(D::default(), capacity)
	}

	/// Combines [`with_dispatcher`](`SignalD::with_dispatcher`) and [`with_capacity`](`SignalD::with_capacity`).
	#[must_use]
	pub fn with_dispatcher_and_capacity(dispatcher: D, capacity: usize) -> Self {
		Self {
			inner: Rc::new(Inner {
				ring: Rc::new(RefCell::new(Ring::with_capacity(capacity))),
				state: Cell::new(State::Active),
				dispatcher,
				native: RefCell::new(None),
			}),
		}
	}

	/// Creates a new signal that fires with the arguments of each invocation of `event`.
	///
	/// The forwarding subscription is released by [`destroy`](`SignalD::destroy`)
	/// or when the last handle is dropped.
	#[must_use]
	pub fn wrap<E: NativeEvent<A>>(event: &E) -> Self
	where
		A: Clone,
		D: Default,
	{
		Self::wrap_with_dispatcher(event, D::default())
	}

	/// Like [`wrap`](`SignalD::wrap`), but submitting callbacks to `dispatcher`.
	#[must_use]
	pub fn wrap_with_dispatcher<E: NativeEvent<A>>(event: &E, dispatcher: D) -> Self
	where
		A: Clone,
	{
		let signal = Self::with_dispatcher(dispatcher);
		let weak = signal.downgrade();
		let subscription = event.subscribe(Box::new(move |args| {
			if let Some(signal) = weak.upgrade() {
				// Only fails once destroyed, which also unsubscribes this handler.
				signal.fire(args).ok();
			}
		}));
		*signal.inner.native.borrow_mut() = Some(Box::new(subscription));
		debug!(event = type_name::<E>(), "wrapped native event");
		signal
	}

	/// Like [`wrap`](`SignalD::wrap`), but checks at runtime that `value` is an `E`.
	///
	/// # Errors
	///
	/// [`SignalError::TypeMismatch`] (naming the type of `value`) iff `value` isn't an `E`.
	/// No signal is created in that case.
	pub fn wrap_any<E: NativeEvent<A> + 'static>(value: &dyn AnyEvent) -> Result<Self, SignalError>
	where
		A: Clone,
		D: Default,
	{
		let event = value
			.as_any()
			.downcast_ref::<E>()
			.ok_or_else(|| SignalError::TypeMismatch {
				expected: type_name::<E>(),
				found: value.type_name(),
			})?;
		Ok(Self::wrap(event))
	}

	fn check_active(&self) -> Result<(), SignalError> {
		match self.inner.state.get() {
			State::Active => Ok(()),
			State::Destroyed => Err(SignalError::Destroyed),
		}
	}

	fn link(&self, listener: Listener<A>, once: bool) -> Result<Connection<A>, SignalError> {
		self.check_active()?;
		let handle = self.inner.ring.borrow_mut().link(listener, once);
		Ok(Connection::new(Rc::downgrade(&self.inner.ring), handle))
	}

	/// Connects a persistent listener, called on every [`fire`](`SignalD::fire`) until disconnected.
	///
	/// Listeners are invoked in connection order.
	///
	/// # Errors
	///
	/// [`SignalError::Destroyed`] iff this signal was destroyed.
	pub fn connect(&self, f: impl 'static + Fn(A)) -> Result<Connection<A>, SignalError> {
		self.link(Listener::Function(Rc::new(f)), false)
	}

	/// Connects a one-shot listener, which disconnects as soon as a [`fire`](`SignalD::fire`) schedules it.
	///
	/// # Errors
	///
	/// [`SignalError::Destroyed`] iff this signal was destroyed.
	pub fn once(&self, f: impl 'static + FnOnce(A)) -> Result<Connection<A>, SignalError> {
		self.link(Listener::FunctionOnce(Box::new(f)), true)
	}

	/// Links a hidden one-shot listener and returns a [`Wait`] future suspended on it.
	///
	/// The listener takes its place in firing order now, not when the future is first polled.
	///
	/// # Errors
	///
	/// [`SignalError::Destroyed`] iff this signal was destroyed.
	pub fn wait(&self) -> Result<Wait<A>, SignalError> {
		let (sender, receiver) = oneshot::channel();
		let connection = self.link(Listener::Thread(sender), true)?;
		Ok(Wait::new(connection, receiver))
	}

	/// Notifies each listener connected at the time of the call with a clone of `args`, oldest first.
	///
	/// Callbacks are submitted to the dispatcher and have not necessarily run when this returns.
	/// [`Wait`]ers are resumed directly. One-shot listeners are disconnected as they are scheduled.
	///
	/// Listeners connected while this call is in progress are not notified by it.
	/// Listeners disconnected while it is in progress are skipped if not yet reached.
	///
	/// # Errors
	///
	/// [`SignalError::Destroyed`] iff this signal was destroyed.
	pub fn fire(&self, args: A) -> Result<(), SignalError>
	where
		A: Clone,
	{
		self.check_active()?;

		let mut walk = self.inner.ring.borrow_mut().begin_walk();
		let ring = guard(&self.inner.ring, |ring| ring.borrow_mut().end_walk());

		let mut scheduled = 0_usize;
		// The ring is released before each submission, since the dispatcher may run the job inline.
		while let Some(visit) = {
			let visit = ring.borrow_mut().visit_next(&mut walk);
			visit
		} {
			scheduled += 1;
			match visit {
				Visit::Call(f) => {
					let args = args.clone();
					self.inner.dispatcher.submit(Box::new(move || f(args)));
				}
				Visit::CallOnce(f) => {
					let args = args.clone();
					self.inner.dispatcher.submit(Box::new(move || f(args)));
				}
				Visit::Resume(sender) => {
					// The receiving `Wait` may have been dropped since; that's fine.
					sender.send(args.clone()).ok();
				}
			}
		}

		trace!(scheduled, "fired signal");
		Ok(())
	}

	/// Disconnects every listener. The signal stays usable, as if freshly created.
	///
	/// Pending [`Wait`]ers resolve to [`WaitError::Cancelled`](`crate::WaitError::Cancelled`).
	///
	/// # Errors
	///
	/// [`SignalError::Destroyed`] iff this signal was destroyed.
	pub fn disconnect_all(&self) -> Result<(), SignalError> {
		self.check_active()?;
		let removed = self.clear();
		debug!(removed, "disconnected all listeners");
		Ok(())
	}

	fn clear(&self) -> usize {
		// Bound first so that the ring is released before the payloads drop.
		let removed = self.inner.ring.borrow_mut().clear();
		let count = removed.len();
		drop(removed);
		count
	}

	/// Disconnects every listener, releases a wrapped native event and permanently disables this signal.
	///
	/// Afterwards, every operation on any handle of this signal (including `destroy`)
	/// fails with [`SignalError::Destroyed`], while [`Connection`]s become no-ops.
	///
	/// # Errors
	///
	/// [`SignalError::Destroyed`] iff this signal was already destroyed.
	pub fn destroy(&self) -> Result<(), SignalError> {
		self.check_active()?;
		// Flip the state first, so that listener drops can't connect to a half-destroyed signal.
		self.inner.state.set(State::Destroyed);

		let removed = self.clear();
		let native = self.inner.native.borrow_mut().take();
		if let Some(mut native) = native {
			if native.is_active() {
				native.unsubscribe();
			}
		}

		debug!(removed, "destroyed signal");
		Ok(())
	}

	/// The number of currently connected listeners, including [`Wait`]ers.
	#[must_use]
	pub fn len(&self) -> usize {
		self.inner.ring.borrow().len()
	}

	/// Whether no listeners are currently connected.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Handles to the currently connected listeners, in firing order.
	#[must_use]
	pub fn connections(&self) -> Vec<Connection<A>> {
		let ring = self.inner.ring.borrow();
		ring.handles()
			.into_iter()
			.map(|handle| Connection::new(Rc::downgrade(&self.inner.ring), handle))
			.collect()
	}

	/// Whether [`destroy`](`SignalD::destroy`) was called.
	#[must_use]
	pub fn is_destroyed(&self) -> bool {
		self.inner.state.get() == State::Destroyed
	}

	/// The dispatcher callbacks are submitted to.
	pub fn dispatcher(&self) -> &D {
		&self.inner.dispatcher
	}

	/// Creates a [`SignalWeak`] that doesn't keep this signal alive.
	#[must_use]
	pub fn downgrade(&self) -> SignalWeak<A, D> {
		SignalWeak {
			inner: Rc::downgrade(&self.inner),
		}
	}

	/// Whether `self` and `other` are handles to the same signal.
	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl<A: 'static, D: 'static + Dispatcher> Drop for Inner<A, D> {
	fn drop(&mut self) {
		if let Some(mut native) = self.native.get_mut().take() {
			if native.is_active() {
				native.unsubscribe();
			}
		}
	}
}
