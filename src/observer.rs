//! Change notification shared by the store and the routers.

use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::trace;

pub type Callback = Rc<dyn Fn()>;

/// Something that can be subscribed to for change notifications.
pub trait Subscribe {
	/// Registers `callback` to run after every change.
	fn subscribe(&self, callback: Callback);
}

#[derive(Default)]
pub struct Observer {
	subscribers: RefCell<Vec<Callback>>,
}

impl Observer {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Calls every subscriber in subscription order.
	///
	/// Subscribers added while notifying are first called by the next notification.
	pub fn notify(&self) {
		let subscribers = self.subscribers.borrow().clone();
		trace!("Notifying {} subscriber(s).", subscribers.len());
		for subscriber in subscribers {
			subscriber();
		}
	}

	#[must_use]
	pub fn subscriber_count(&self) -> usize {
		self.subscribers.borrow().len()
	}
}

impl Subscribe for Observer {
	fn subscribe(&self, callback: Callback) {
		self.subscribers.borrow_mut().push(callback);
	}
}

impl<T: Subscribe + ?Sized> Subscribe for Rc<T> {
	fn subscribe(&self, callback: Callback) {
		(**self).subscribe(callback);
	}
}

impl Debug for Observer {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Observer").field("subscribers", &self.subscriber_count()).finish()
	}
}
