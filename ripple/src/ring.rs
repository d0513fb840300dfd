//! The circular listener list behind each signal, stored as an index-based arena.
//!
//! Slot `0` is the sentinel. Every other slot is a listener node that is linked in
//! front of the sentinel when created and spliced out exactly once when disconnected.
//!
//! Disconnected slots keep their (now stale) `next`/`prev` links until they are recycled,
//! and recycling is postponed while a walk is in progress. That way a walk that captured
//! a node's successor can always continue from it, even if listener code unlinked that
//! successor in the meantime.

use std::{
	fmt::{self, Debug, Formatter},
	rc::Rc,
};

use futures_channel::oneshot;

const SENTINEL: usize = 0;

/// The payload of a listener node.
pub(crate) enum Listener<A> {
	/// A persistent callback.
	Function(Rc<dyn Fn(A)>),
	/// A one-shot callback.
	FunctionOnce(Box<dyn FnOnce(A)>),
	/// A suspended [`Wait`](`crate::Wait`).
	Thread(oneshot::Sender<A>),
}

impl<A> Debug for Listener<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Function(_) => f.write_str("Function"),
			Self::FunctionOnce(_) => f.write_str("FunctionOnce"),
			Self::Thread(_) => f.write_str("Thread"),
		}
	}
}

/// What a walk should do with the node it just reached.
pub(crate) enum Visit<A> {
	Call(Rc<dyn Fn(A)>),
	CallOnce(Box<dyn FnOnce(A)>),
	Resume(oneshot::Sender<A>),
}

/// Identifies one particular node, across slot reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Handle {
	index: usize,
	generation: u32,
}

/// Cursor state of an in-progress walk.
///
/// `newest` is the serial of the last node linked before the walk began.
/// Nodes linked after that are never visited, even if the tail they were appended to is gone.
#[derive(Debug)]
pub(crate) struct Walk {
	cursor: usize,
	newest: u64,
	done: bool,
}

struct Node<A> {
	next: usize,
	prev: usize,
	generation: u32,
	/// Link order. Strictly increasing from the sentinel's successor to its predecessor.
	serial: u64,
	connected: bool,
	once: bool,
	listener: Option<Listener<A>>,
}

impl<A> Node<A> {
	fn sentinel() -> Self {
		Self {
			next: SENTINEL,
			prev: SENTINEL,
			generation: 0,
			serial: 0,
			connected: false,
			once: false,
			listener: None,
		}
	}
}

pub(crate) struct Ring<A> {
	nodes: Vec<Node<A>>,
	free: Vec<usize>,
	/// Unlinked while a walk was in progress. Recycled once the last walk ends.
	retired: Vec<usize>,
	walkers: usize,
	len: usize,
	serial: u64,
}

impl<A> Debug for Ring<A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Ring")
			.field("len", &self.len)
			.field("slots", &(self.nodes.len() - 1))
			.field("walkers", &self.walkers)
			.finish_non_exhaustive()
	}
}

impl<A> Ring<A> {
	pub(crate) fn with_capacity(capacity: usize) -> Self {
		let mut nodes = Vec::with_capacity(capacity + 1);
		nodes.push(Node::sentinel());
		Self {
			nodes,
			free: Vec::new(),
			retired: Vec::new(),
			walkers: 0,
			len: 0,
			serial: 0,
		}
	}

	/// The number of connected nodes.
	pub(crate) fn len(&self) -> usize {
		self.len
	}

	/// Allocates a node for `listener` and splices it in front of the sentinel (at the tail of firing order).
	pub(crate) fn link(&mut self, listener: Listener<A>, once: bool) -> Handle {
		let tail = self.nodes[SENTINEL].prev;
		self.serial += 1;
		let serial = self.serial;
		let index = if let Some(index) = self.free.pop() {
			let node = &mut self.nodes[index];
			debug_assert!(!node.connected && node.listener.is_none());
			node.generation = node.generation.wrapping_add(1);
			node.next = SENTINEL;
			node.prev = tail;
			node.serial = serial;
			node.connected = true;
			node.once = once;
			node.listener = Some(listener);
			index
		} else {
			self.nodes.push(Node {
				next: SENTINEL,
				prev: tail,
				generation: 0,
				serial,
				connected: true,
				once,
				listener: Some(listener),
			});
			self.nodes.len() - 1
		};
		self.nodes[tail].next = index;
		self.nodes[SENTINEL].prev = index;
		self.len += 1;

		Handle {
			index,
			generation: self.nodes[index].generation,
		}
	}

	fn live(&self, handle: Handle) -> Option<&Node<A>> {
		self.nodes
			.get(handle.index)
			.filter(|node| handle.index != SENTINEL && node.generation == handle.generation)
			.filter(|node| node.connected)
	}

	pub(crate) fn is_connected(&self, handle: Handle) -> bool {
		self.live(handle).is_some()
	}

	pub(crate) fn is_once(&self, handle: Handle) -> bool {
		self.live(handle).is_some_and(|node| node.once)
	}

	/// Splices the node out of the ring, if it is still connected.
	///
	/// **Returns** the node's payload, which the caller should drop only after releasing the ring.
	pub(crate) fn unlink(&mut self, handle: Handle) -> Option<Listener<A>> {
		if self.is_connected(handle) {
			Some(self.unlink_index(handle.index))
		} else {
			None
		}
	}

	fn unlink_index(&mut self, index: usize) -> Listener<A> {
		let node = &mut self.nodes[index];
		node.connected = false;
		let listener = node.listener.take().expect("unreachable");
		let (prev, next) = (node.prev, node.next);
		self.nodes[prev].next = next;
		self.nodes[next].prev = prev;
		self.len -= 1;

		if self.walkers == 0 {
			self.free.push(index);
		} else {
			self.retired.push(index);
		}
		listener
	}

	/// Starts a walk over the nodes connected right now, oldest first.
	///
	/// Every call **must** be paired with [`end_walk`](`Ring::end_walk`).
	pub(crate) fn begin_walk(&mut self) -> Walk {
		self.walkers += 1;
		let cursor = self.nodes[SENTINEL].next;
		Walk {
			cursor,
			newest: self.serial,
			done: cursor == SENTINEL,
		}
	}

	pub(crate) fn end_walk(&mut self) {
		self.walkers -= 1;
		if self.walkers == 0 {
			self.free.append(&mut self.retired);
		}
	}

	/// Advances `walk` to the next connected node, skipping nodes unlinked since the walk began.
	fn step(&mut self, walk: &mut Walk) -> Option<usize> {
		while !walk.done {
			let index = walk.cursor;
			let node = &self.nodes[index];
			if index == SENTINEL || node.serial > walk.newest {
				walk.done = true;
				break;
			}

			// Capture the successor first: visiting may unlink this node.
			walk.cursor = node.next;
			if node.connected {
				return Some(index);
			}
		}
		None
	}

	/// Advances `walk` and prepares the reached node for invocation.
	///
	/// One-shot nodes are unlinked as part of this, so they are scheduled exactly once
	/// even if the invocation re-enters the signal.
	pub(crate) fn visit_next(&mut self, walk: &mut Walk) -> Option<Visit<A>> {
		let index = self.step(walk)?;
		let node = &self.nodes[index];
		Some(if node.once {
			match self.unlink_index(index) {
				Listener::Function(f) => Visit::Call(f),
				Listener::FunctionOnce(f) => Visit::CallOnce(f),
				Listener::Thread(sender) => Visit::Resume(sender),
			}
		} else {
			match node.listener.as_ref().expect("unreachable") {
				Listener::Function(f) => Visit::Call(Rc::clone(f)),
				listener => unreachable!("persistent node holding {listener:?}"),
			}
		})
	}

	/// Unlinks every connected node, oldest first, then resets the sentinel.
	///
	/// **Returns** the removed payloads, which the caller should drop only after releasing the ring.
	pub(crate) fn clear(&mut self) -> Vec<Listener<A>> {
		let mut removed = Vec::with_capacity(self.len);
		let mut walk = self.begin_walk();
		while let Some(index) = self.step(&mut walk) {
			removed.push(self.unlink_index(index));
		}
		self.end_walk();

		let sentinel = &mut self.nodes[SENTINEL];
		sentinel.next = SENTINEL;
		sentinel.prev = SENTINEL;
		debug_assert_eq!(self.len, 0);
		removed
	}

	/// Handles of all connected nodes, in firing order.
	pub(crate) fn handles(&self) -> Vec<Handle> {
		let mut handles = Vec::with_capacity(self.len);
		let mut index = self.nodes[SENTINEL].next;
		while index != SENTINEL {
			let node = &self.nodes[index];
			handles.push(Handle {
				index,
				generation: node.generation,
			});
			index = node.next;
		}
		handles
	}

	#[cfg(test)]
	fn check_invariants(&self) {
		let mut count = 0;
		let mut index = SENTINEL;
		loop {
			let next = self.nodes[index].next;
			assert_eq!(self.nodes[next].prev, index, "`prev` doesn't mirror `next`");
			index = next;
			if index == SENTINEL {
				break;
			}
			assert!(self.nodes[index].connected);
			assert!(self.nodes[index].listener.is_some());
			count += 1;
			assert!(count <= self.len, "ring doesn't close");
		}
		assert_eq!(count, self.len);
	}
}

#[cfg(test)]
mod tests {
	use std::{cell::RefCell, rc::Rc};

	use super::{Listener, Ring, Visit};

	fn function(log: &Rc<RefCell<Vec<u32>>>, tag: u32) -> Listener<u32> {
		let log = Rc::clone(log);
		Listener::Function(Rc::new(move |x| log.borrow_mut().push(tag * 100 + x)))
	}

	fn walk_all(ring: &mut Ring<u32>, arg: u32) {
		let mut walk = ring.begin_walk();
		while let Some(visit) = ring.visit_next(&mut walk) {
			match visit {
				Visit::Call(f) => f(arg),
				Visit::CallOnce(f) => f(arg),
				Visit::Resume(sender) => drop(sender.send(arg)),
			}
		}
		ring.end_walk();
	}

	#[test]
	fn empty_ring_is_well_formed() {
		let ring = Ring::<u32>::with_capacity(0);
		ring.check_invariants();
		assert_eq!(ring.len(), 0);
		assert!(ring.handles().is_empty());
	}

	#[test]
	fn link_and_unlink_keep_invariants() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut ring = Ring::with_capacity(4);

		let a = ring.link(function(&log, 1), false);
		let b = ring.link(function(&log, 2), false);
		let c = ring.link(function(&log, 3), false);
		ring.check_invariants();
		assert_eq!(ring.handles(), [a, b, c]);

		assert!(ring.unlink(b).is_some());
		assert!(ring.unlink(b).is_none());
		ring.check_invariants();
		assert_eq!(ring.handles(), [a, c]);

		assert!(ring.unlink(a).is_some());
		assert!(ring.unlink(c).is_some());
		ring.check_invariants();
		assert_eq!(ring.len(), 0);
	}

	#[test]
	fn recycled_slots_get_new_generations() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut ring = Ring::with_capacity(1);

		let a = ring.link(function(&log, 1), false);
		drop(ring.unlink(a));
		let b = ring.link(function(&log, 2), false);

		assert_ne!(a, b);
		assert!(!ring.is_connected(a));
		assert!(ring.unlink(a).is_none());
		assert!(ring.is_connected(b));
	}

	#[test]
	fn walk_visits_in_order_and_unlinks_once_nodes() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut ring = Ring::with_capacity(3);

		ring.link(function(&log, 1), false);
		let once = {
			let log = Rc::clone(&log);
			ring.link(
				Listener::FunctionOnce(Box::new(move |x| log.borrow_mut().push(200 + x))),
				true,
			)
		};
		ring.link(function(&log, 3), false);

		walk_all(&mut ring, 1);
		walk_all(&mut ring, 2);
		assert_eq!(*log.borrow(), [101, 201, 301, 102, 302]);
		assert!(!ring.is_connected(once));
		ring.check_invariants();
	}

	#[test]
	fn walk_survives_unlinking_the_captured_successor() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut ring = Ring::with_capacity(3);

		let a = ring.link(function(&log, 1), false);
		let b = ring.link(function(&log, 2), false);
		let c = ring.link(function(&log, 3), false);

		let mut walk = ring.begin_walk();
		assert!(ring.visit_next(&mut walk).is_some());
		// The walk already captured `b` as successor of `a`.
		drop(ring.unlink(a));
		drop(ring.unlink(b));
		// A slot freed mid-walk must not be recycled yet.
		let d = ring.link(function(&log, 4), false);
		assert_ne!(d.index, a.index);
		assert_ne!(d.index, b.index);

		let Some(Visit::Call(f)) = ring.visit_next(&mut walk) else {
			panic!("expected `c`");
		};
		f(0);
		assert!(ring.visit_next(&mut walk).is_none());
		ring.end_walk();

		assert_eq!(*log.borrow(), [300]);
		assert_eq!(ring.handles(), [c, d]);
		ring.check_invariants();
	}

	#[test]
	fn nodes_linked_during_a_walk_are_not_visited() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut ring = Ring::with_capacity(2);
		ring.link(function(&log, 1), false);

		let mut walk = ring.begin_walk();
		let mut visited = 0;
		while let Some(visit) = ring.visit_next(&mut walk) {
			visited += 1;
			drop(visit);
			ring.link(function(&log, 2), false);
		}
		ring.end_walk();

		assert_eq!(visited, 1);
		assert_eq!(ring.len(), 2);
	}

	#[test]
	fn unlinking_the_old_tail_does_not_extend_a_walk() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut ring = Ring::with_capacity(4);
		ring.link(function(&log, 1), false);
		ring.link(function(&log, 2), false);
		let c = ring.link(function(&log, 3), false);

		let mut walk = ring.begin_walk();
		let mut first = true;
		while let Some(visit) = ring.visit_next(&mut walk) {
			let Visit::Call(f) = visit else {
				panic!("expected a persistent callback");
			};
			f(0);
			if first {
				first = false;
				drop(ring.unlink(c));
				ring.link(function(&log, 4), false);
			}
		}
		ring.end_walk();

		assert_eq!(*log.borrow(), [100, 200]);
		assert_eq!(ring.len(), 3);
		ring.check_invariants();
	}

	#[test]
	fn clear_resets_to_empty() {
		let log = Rc::new(RefCell::new(Vec::new()));
		let mut ring = Ring::with_capacity(2);
		let a = ring.link(function(&log, 1), false);
		ring.link(function(&log, 2), true);

		assert_eq!(ring.clear().len(), 2);
		ring.check_invariants();
		assert!(!ring.is_connected(a));

		ring.link(function(&log, 3), false);
		walk_all(&mut ring, 0);
		assert_eq!(*log.borrow(), [300]);
	}
}
