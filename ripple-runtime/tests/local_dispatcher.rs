use std::{cell::RefCell, rc::Rc};

use ripple_runtime::{Dispatcher, LocalDispatcher};


fn log() -> Rc<RefCell<Vec<&'static str>>> {
	Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Rc<RefCell<Vec<&'static str>>>, entry: &'static str) -> ripple_runtime::Job {
	let log = Rc::clone(log);
	Box::new(move || log.borrow_mut().push(entry))
}

#[test]
fn runs_in_submission_order() {
	let log = log();
	let dispatcher = LocalDispatcher::new();

	dispatcher.submit(push(&log, "a"));
	dispatcher.submit(push(&log, "b"));
	dispatcher.clone().submit(push(&log, "c"));
	assert!(log.borrow().is_empty());
	assert_eq!(dispatcher.pending(), 3);

	assert_eq!(dispatcher.run_pending(), 3);
	assert_eq!(*log.borrow(), ["a", "b", "c"]);
	assert!(dispatcher.is_idle());
}

#[test]
fn jobs_submitted_while_draining_also_run() {
	let log = log();
	let dispatcher = LocalDispatcher::with_capacity(4);

	dispatcher.submit(Box::new({
		let (log, dispatcher) = (Rc::clone(&log), dispatcher.clone());
		move || {
			log.borrow_mut().push("outer");
			dispatcher.submit(push(&log, "inner"));
		}
	}));
	dispatcher.submit(push(&log, "second"));

	assert_eq!(dispatcher.run_pending(), 3);
	assert_eq!(*log.borrow(), ["outer", "second", "inner"]);
}

#[test]
fn run_one_steps() {
	let log = log();
	let dispatcher = LocalDispatcher::new();
	assert!(!dispatcher.run_one());

	dispatcher.submit(push(&log, "a"));
	dispatcher.submit(push(&log, "b"));
	assert!(dispatcher.run_one());
	assert_eq!(*log.borrow(), ["a"]);
	assert_eq!(dispatcher.pending(), 1);
}

#[test]
fn panics_are_isolated() {
	_tracing::init();
	let log = log();
	let dispatcher = LocalDispatcher::new();

	dispatcher.submit(push(&log, "before"));
	dispatcher.submit(Box::new(|| panic!("listener failure")));
	dispatcher.submit(push(&log, "after"));

	assert_eq!(dispatcher.run_pending(), 3);
	assert_eq!(*log.borrow(), ["before", "after"]);
	assert_eq!(dispatcher.panicked(), 1);
}

#[test]
fn clear_drops_without_running() {
	let log = log();
	let dispatcher = LocalDispatcher::new();

	dispatcher.submit(push(&log, "a"));
	dispatcher.submit(push(&log, "b"));
	assert_eq!(dispatcher.clear(), 2);
	assert_eq!(dispatcher.run_pending(), 0);
	assert!(log.borrow().is_empty());
}
