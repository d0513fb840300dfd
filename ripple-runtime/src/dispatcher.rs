//! The [`Dispatcher`] seam through which signals defer listener invocations,
//! along with the queue-backed implementations [`LocalDispatcher`] and [`GlobalDispatcher`].

use std::{
	any::Any,
	cell::{Cell, RefCell},
	collections::VecDeque,
	fmt::{self, Debug, Formatter},
	panic::{catch_unwind, AssertUnwindSafe},
	rc::Rc,
};

use tracing::{error, trace};

#[cfg(feature = "global_dispatcher")]
mod global;
#[cfg(feature = "global_dispatcher")]
pub use global::GlobalDispatcher;

/// A deferred listener invocation, with its arguments already captured.
pub type Job = Box<dyn 'static + FnOnce()>;

/// Trait for handles that let signals hand off listener invocations for later execution.
///
/// [`LocalDispatcher`] and [`GlobalDispatcher`] provide usable defaults.
///
/// # Logic
///
/// [`submit`](`Dispatcher::submit`) **should not** run `job` before returning.  
/// Signals release all internal borrows before calling it, so an inline implementation
/// won't misbehave, but it does give up the decoupling listeners may rely on.
///
/// Jobs submitted through clones of the same handle **must** run in submission order.
///
/// A job that panics **must not** prevent later jobs from running. Its panic **should**
/// be reported through the dispatcher's own channel rather than to the submitter.
pub trait Dispatcher: Clone {
	/// Schedules `job` to run later, independently of the caller.
	fn submit(&self, job: Job);
}

/// An instance-owned FIFO job queue.
///
/// Clones share the same queue. Jobs run only when the queue is drained explicitly,
/// through [`run_pending`](`LocalDispatcher::run_pending`) or [`run_one`](`LocalDispatcher::run_one`).
#[derive(Clone, Default)]
pub struct LocalDispatcher {
	queue: Rc<Queue>,
}

#[derive(Default)]
struct Queue {
	jobs: RefCell<VecDeque<Job>>,
	panicked: Cell<usize>,
}

impl Debug for LocalDispatcher {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("LocalDispatcher")
			.field("pending", &self.pending())
			.field("panicked", &self.panicked())
			.finish_non_exhaustive()
	}
}

impl LocalDispatcher {
	/// Creates a new empty [`LocalDispatcher`].
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a new empty [`LocalDispatcher`] with room for at least `capacity` queued jobs.
	#[must_use]
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			queue: Rc::new(Queue {
				jobs: RefCell::new(VecDeque::with_capacity(capacity)),
				panicked: Cell::new(0),
			}),
		}
	}

	/// The number of jobs currently waiting to run.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.queue.jobs.borrow().len()
	}

	/// Whether no jobs are waiting to run.
	#[must_use]
	pub fn is_idle(&self) -> bool {
		self.queue.jobs.borrow().is_empty()
	}

	/// The number of jobs that panicked over this queue's lifetime.
	#[must_use]
	pub fn panicked(&self) -> usize {
		self.queue.panicked.get()
	}

	/// Runs the oldest queued job, if any.
	///
	/// **Returns** whether a job ran (even if it panicked).
	pub fn run_one(&self) -> bool {
		// The borrow must end before the job runs, since it may submit more jobs.
		let next = self.queue.jobs.borrow_mut().pop_front();
		match next {
			Some(job) => {
				self.execute(job);
				true
			}
			None => false,
		}
	}

	/// Runs queued jobs until the queue is empty, including jobs submitted while draining.
	///
	/// **Returns** the number of jobs that ran.
	pub fn run_pending(&self) -> usize {
		let mut count = 0;
		while self.run_one() {
			count += 1;
		}
		if count > 0 {
			trace!(count, "drained dispatcher queue");
		}
		count
	}

	/// Drops all queued jobs without running them.
	///
	/// **Returns** the number of jobs dropped.
	pub fn clear(&self) -> usize {
		// Dropping a job may drop captured handles that submit again, so take the queue first.
		let jobs = self.queue.jobs.take();
		let count = jobs.len();
		drop(jobs);
		count
	}

	fn execute(&self, job: Job) {
		if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
			self.queue.panicked.set(self.queue.panicked.get() + 1);
			error!(panic = panic_message(&*payload), "deferred job panicked");
		}
	}
}

impl Dispatcher for LocalDispatcher {
	fn submit(&self, job: Job) {
		self.queue.jobs.borrow_mut().push_back(job);
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(message) = payload.downcast_ref::<&'static str>() {
		*message
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.as_str()
	} else {
		"(non-string panic payload)"
	}
}
