use super::{Dispatcher, Job, LocalDispatcher};

thread_local! {
	static GLOBAL_DISPATCHER: LocalDispatcher = LocalDispatcher::new();
}

/// A plain [`Dispatcher`] implementation that represents the current thread's job queue.
///
/// Each thread has its own queue, so jobs submitted on one thread only ever run when that
/// same thread drains it.
///
/// # Logic
///
/// This is a zero-sized handle: all instances on a thread are interchangeable, and the
/// associated methods forward to the thread's [`LocalDispatcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalDispatcher;

impl GlobalDispatcher {
	/// See [`LocalDispatcher::pending`].
	#[must_use]
	pub fn pending(&self) -> usize {
		GLOBAL_DISPATCHER.with(LocalDispatcher::pending)
	}

	/// See [`LocalDispatcher::is_idle`].
	#[must_use]
	pub fn is_idle(&self) -> bool {
		GLOBAL_DISPATCHER.with(LocalDispatcher::is_idle)
	}

	/// See [`LocalDispatcher::panicked`].
	#[must_use]
	pub fn panicked(&self) -> usize {
		GLOBAL_DISPATCHER.with(LocalDispatcher::panicked)
	}

	/// See [`LocalDispatcher::run_one`].
	pub fn run_one(&self) -> bool {
		GLOBAL_DISPATCHER.with(LocalDispatcher::clone).run_one()
	}

	/// See [`LocalDispatcher::run_pending`].
	pub fn run_pending(&self) -> usize {
		// Clone out of the thread-local so that jobs can reach it again while running.
		GLOBAL_DISPATCHER.with(LocalDispatcher::clone).run_pending()
	}

	/// See [`LocalDispatcher::clear`].
	pub fn clear(&self) -> usize {
		GLOBAL_DISPATCHER.with(LocalDispatcher::clone).clear()
	}
}

impl Dispatcher for GlobalDispatcher {
	fn submit(&self, job: Job) {
		GLOBAL_DISPATCHER.with(|dispatcher| dispatcher.submit(job));
	}
}
