//! An observable state container.

use crate::observer::{Callback, Observer, Subscribe};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use tracing::{instrument, trace};

/// Application state behind named actions.
///
/// Actions are values of `A` (typically an `enum`), turned into the next state by the
/// reducer. Every change notifies subscribers after the new state is in place, so they can
/// read it through [`Store::get_state`].
pub struct Store<S, A> {
	state: RefCell<S>,
	reducer: Box<dyn Fn(&S, A) -> S>,
	observer: Observer,
}

impl<S: Clone, A> Store<S, A> {
	pub fn new(initial: S, reducer: impl 'static + Fn(&S, A) -> S) -> Self {
		Self {
			state: RefCell::new(initial),
			reducer: Box::new(reducer),
			observer: Observer::new(),
		}
	}

	/// A snapshot of the current state.
	#[must_use]
	pub fn get_state(&self) -> S {
		self.state.borrow().clone()
	}

	/// Reads the current state without cloning it.
	pub fn with_state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
		read(&self.state.borrow())
	}

	pub fn set_state(&self, state: S) {
		*self.state.borrow_mut() = state;
		self.observer.notify();
	}

	/// Modifies the state in place, then notifies.
	pub fn update(&self, update: impl FnOnce(&mut S)) {
		update(&mut self.state.borrow_mut());
		self.observer.notify();
	}

	/// Runs the reducer for `action` and stores its result.
	#[instrument(skip(self, action))]
	pub fn dispatch(&self, action: A) {
		let next = (self.reducer)(&self.state.borrow(), action);
		trace!("Reduced action.");
		self.set_state(next);
	}
}

impl<S, A> Subscribe for Store<S, A> {
	fn subscribe(&self, callback: Callback) {
		self.observer.subscribe(callback);
	}
}

impl<S: Debug, A> Debug for Store<S, A> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Store").field("state", &self.state.borrow()).field("observer", &self.observer).finish_non_exhaustive()
	}
}
