use std::{cell::RefCell, rc::Rc};

use ripple::{shadow_clone, Connection, Dispatcher, Job, LocalDispatcher, SignalD};


use _validator::Validator;

/// Runs each job on the spot, so that listeners re-enter `fire` while it walks.
#[derive(Debug, Clone, Default)]
struct Inline;

impl Dispatcher for Inline {
	fn submit(&self, job: Job) {
		job();
	}
}

#[test]
fn refire_from_deferred_listener() {
	let v = Validator::new();
	let signal = SignalD::<u32, LocalDispatcher>::new();

	signal
		.connect({
			let v = v.clone();
			let this = signal.downgrade();
			move |x| {
				v.push(x);
				if let Some(this) = this.upgrade().filter(|_| x > 0) {
					this.fire(x - 1).unwrap();
				}
			}
		})
		.unwrap();

	signal.fire(3).unwrap();
	assert_eq!(signal.dispatcher().run_pending(), 4);
	v.expect([3, 2, 1, 0]);
}

#[test]
fn connected_during_fire_waits_for_the_next_one() {
	let v = Validator::new();
	let signal = SignalD::<u32, Inline>::new();

	signal
		.once({
			shadow_clone!(v, signal);
			move |x| {
				v.push(("first", x));
				signal
					.connect({
						let v = v.clone();
						move |x| v.push(("late", x))
					})
					.unwrap();
			}
		})
		.unwrap();

	signal.fire(1).unwrap();
	v.expect([("first", 1)]);

	signal.fire(2).unwrap();
	v.expect([("late", 2)]);

	signal.disconnect_all().unwrap();
}

#[test]
fn disconnected_during_fire_is_skipped() {
	let v = Validator::new();
	let signal = SignalD::<u32, Inline>::new();
	let victim = Rc::new(RefCell::new(None::<Connection<u32>>));

	signal
		.connect({
			shadow_clone!(v, victim);
			move |x| {
				v.push(("killer", x));
				if let Some(victim) = victim.borrow_mut().take() {
					victim.disconnect();
				}
			}
		})
		.unwrap();
	*victim.borrow_mut() = Some(
		signal
			.connect({
				let v = v.clone();
				move |x| v.push(("victim", x))
			})
			.unwrap(),
	);
	signal
		.connect({
			let v = v.clone();
			move |x| v.push(("survivor", x))
		})
		.unwrap();

	signal.fire(1).unwrap();
	v.expect([("killer", 1), ("survivor", 1)]);
	assert_eq!(signal.len(), 2);
}

#[test]
fn once_is_not_rescheduled_by_a_nested_fire() {
	let v = Validator::new();
	let signal = SignalD::<u32, Inline>::new();

	signal
		.once({
			shadow_clone!(v, signal);
			move |x| {
				v.push(("once", x));
				signal.fire(x + 1).unwrap();
			}
		})
		.unwrap();
	signal
		.connect({
			let v = v.clone();
			move |x| v.push(("persistent", x))
		})
		.unwrap();

	signal.fire(1).unwrap();
	v.expect([("once", 1), ("persistent", 2), ("persistent", 1)]);
}

#[test]
fn disconnect_all_during_fire_stops_the_walk() {
	let v = Validator::new();
	let signal = SignalD::<u32, Inline>::new();

	signal
		.connect({
			shadow_clone!(v, signal);
			move |x| {
				v.push(("clearing", x));
				signal.disconnect_all().unwrap();
			}
		})
		.unwrap();
	signal
		.connect({
			let v = v.clone();
			move |x| v.push(("skipped", x))
		})
		.unwrap();

	signal.fire(1).unwrap();
	v.expect([("clearing", 1)]);
	assert!(signal.is_empty());

	// Slots retired during the walk are recycled afterwards.
	signal
		.connect({
			let v = v.clone();
			move |x| v.push(("fresh", x))
		})
		.unwrap();
	signal.fire(2).unwrap();
	v.expect([("fresh", 2)]);
}

#[test]
fn destroy_during_fire() {
	let v = Validator::new();
	let signal = SignalD::<u32, Inline>::new();

	signal
		.connect({
			shadow_clone!(v, signal);
			move |x| {
				v.push(("destroying", x));
				signal.destroy().unwrap();
			}
		})
		.unwrap();
	signal
		.connect({
			let v = v.clone();
			move |x| v.push(("skipped", x))
		})
		.unwrap();

	signal.fire(1).unwrap();
	v.expect([("destroying", 1)]);
	assert!(signal.is_destroyed());
}

#[test]
fn panicking_listener_does_not_stop_the_others() {
	_tracing::init();
	let v = Validator::new();
	let signal = SignalD::<u32, LocalDispatcher>::new();

	signal
		.connect({
			let v = v.clone();
			move |x| v.push(("a", x))
		})
		.unwrap();
	signal.connect(|_| panic!("listener failure")).unwrap();
	signal
		.connect({
			let v = v.clone();
			move |x| v.push(("c", x))
		})
		.unwrap();

	signal.fire(1).unwrap();
	assert_eq!(signal.dispatcher().run_pending(), 3);
	v.expect([("a", 1), ("c", 1)]);
	assert_eq!(signal.dispatcher().panicked(), 1);
}
