//! Path- and hash-based routers over an abstract browser location.

use crate::observer::{Callback, Observer, Subscribe};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::{instrument, trace};

/// The navigation surface of a browser window.
pub trait Location {
	fn pathname(&self) -> String;
	/// Including the leading `#`, or empty.
	fn hash(&self) -> String;
	/// Adds a history entry for `path`. Like `history.pushState`, this doesn't fire pop-state.
	fn push_state(&self, path: &str);
	/// Sets the hash, firing hash-change listeners if it changed.
	fn set_hash(&self, hash: &str);
	fn on_pop_state(&self, callback: Callback);
	fn on_hash_change(&self, callback: Callback);
}

impl<L: Location + ?Sized> Location for Rc<L> {
	fn pathname(&self) -> String {
		(**self).pathname()
	}
	fn hash(&self) -> String {
		(**self).hash()
	}
	fn push_state(&self, path: &str) {
		(**self).push_state(path);
	}
	fn set_hash(&self, hash: &str) {
		(**self).set_hash(hash);
	}
	fn on_pop_state(&self, callback: Callback) {
		(**self).on_pop_state(callback);
	}
	fn on_hash_change(&self, callback: Callback) {
		(**self).on_hash_change(callback);
	}
}

/// The router contract the [`App`](crate::app::App) renders from.
pub trait Navigate: Subscribe {
	/// The current route path, like `/profile`.
	fn path(&self) -> String;
	/// Navigates to `path` and notifies subscribers.
	fn push(&self, path: &str);
}

impl<N: Navigate + ?Sized> Navigate for Rc<N> {
	fn path(&self) -> String {
		(**self).path()
	}
	fn push(&self, path: &str) {
		(**self).push(path);
	}
}

/// Routes by `location.pathname`, navigating through the history API.
pub struct HistoryRouter<L: Location> {
	location: L,
	observer: Rc<Observer>,
}

impl<L: Location> HistoryRouter<L> {
	pub fn new(location: L) -> Self {
		let observer = Rc::new(Observer::new());
		location.on_pop_state({
			let observer = Rc::clone(&observer);
			Rc::new(move || observer.notify())
		});
		Self { location, observer }
	}

	pub fn location(&self) -> &L {
		&self.location
	}
}

impl<L: Location> Subscribe for HistoryRouter<L> {
	fn subscribe(&self, callback: Callback) {
		self.observer.subscribe(callback);
	}
}

impl<L: Location> Navigate for HistoryRouter<L> {
	fn path(&self) -> String {
		self.location.pathname()
	}

	#[instrument(skip(self))]
	fn push(&self, path: &str) {
		self.location.push_state(path);
		self.observer.notify();
	}
}

impl<L: Location> Debug for HistoryRouter<L> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("HistoryRouter").field("path", &self.path()).field("observer", &self.observer).finish()
	}
}

/// Routes by `location.hash`, so that servers only ever see one page.
pub struct HashRouter<L: Location> {
	location: L,
	observer: Rc<Observer>,
}

impl<L: Location> HashRouter<L> {
	/// Creates the router. An empty hash is replaced with `#/`.
	pub fn new(location: L) -> Self {
		let observer = Rc::new(Observer::new());
		location.on_hash_change({
			let observer = Rc::clone(&observer);
			Rc::new(move || observer.notify())
		});
		if location.hash().is_empty() {
			trace!("No hash. Navigating to `#/`.");
			location.set_hash("/");
		}
		Self { location, observer }
	}

	pub fn location(&self) -> &L {
		&self.location
	}
}

impl<L: Location> Subscribe for HashRouter<L> {
	fn subscribe(&self, callback: Callback) {
		self.observer.subscribe(callback);
	}
}

impl<L: Location> Navigate for HashRouter<L> {
	fn path(&self) -> String {
		match self.location.hash().strip_prefix('#') {
			Some(path) if !path.is_empty() => path.to_owned(),
			_ => "/".to_owned(),
		}
	}

	/// Notification happens through the location's hash-change event.
	#[instrument(skip(self))]
	fn push(&self, path: &str) {
		self.location.set_hash(path);
	}
}

impl<L: Location> Debug for HashRouter<L> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("HashRouter").field("path", &self.path()).field("observer", &self.observer).finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
	pathname: String,
	hash: String,
}

#[derive(Default)]
struct History {
	entries: Vec<Entry>,
	index: usize,
}

/// A [`Location`] without a browser. Hash changes are reported synchronously.
pub struct MemoryLocation {
	history: RefCell<History>,
	pop_state: Observer,
	hash_change: Observer,
}

impl MemoryLocation {
	/// Starts at `url`, which may carry a `#hash`.
	#[must_use]
	pub fn new(url: &str) -> Self {
		Self {
			history: RefCell::new(History {
				entries: vec![parse(url)],
				index: 0,
			}),
			pop_state: Observer::new(),
			hash_change: Observer::new(),
		}
	}

	fn current(&self) -> Entry {
		let history = self.history.borrow();
		history.entries[history.index].clone()
	}

	fn push(&self, entry: Entry) {
		let mut history = self.history.borrow_mut();
		let index = history.index + 1;
		history.entries.truncate(index);
		history.entries.push(entry);
		history.index = index;
	}

	/// Goes back one entry, firing pop-state (and hash-change if only the hash differs). Returns whether there was an entry to go back to.
	pub fn back(&self) -> bool {
		self.traverse(|index, _| index.checked_sub(1))
	}

	pub fn forward(&self) -> bool {
		self.traverse(|index, len| Some(index + 1).filter(|&next| next < len))
	}

	fn traverse(&self, step: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
		let (from, to) = {
			let mut history = self.history.borrow_mut();
			let Some(next) = step(history.index, history.entries.len()) else {
				return false;
			};
			let from = history.entries[history.index].clone();
			history.index = next;
			(from, history.entries[next].clone())
		};
		self.pop_state.notify();
		if from.pathname == to.pathname && from.hash != to.hash {
			self.hash_change.notify();
		}
		true
	}

	#[must_use]
	pub fn history_len(&self) -> usize {
		self.history.borrow().entries.len()
	}
}

impl Default for MemoryLocation {
	fn default() -> Self {
		Self::new("/")
	}
}

fn parse(url: &str) -> Entry {
	let (pathname, hash) = match url.find('#') {
		Some(index) => (&url[..index], &url[index..]),
		None => (url, ""),
	};
	Entry {
		pathname: if pathname.is_empty() { "/".to_owned() } else { pathname.to_owned() },
		hash: if hash == "#" { String::new() } else { hash.to_owned() },
	}
}

impl Location for MemoryLocation {
	fn pathname(&self) -> String {
		self.current().pathname
	}

	fn hash(&self) -> String {
		self.current().hash
	}

	fn push_state(&self, path: &str) {
		self.push(parse(path));
	}

	fn set_hash(&self, hash: &str) {
		let hash = hash.trim_start_matches('#');
		let hash = if hash.is_empty() { String::new() } else { format!("#{hash}") };
		let current = self.current();
		if current.hash == hash {
			return;
		}
		self.push(Entry { pathname: current.pathname, hash });
		self.hash_change.notify();
	}

	fn on_pop_state(&self, callback: Callback) {
		self.pop_state.subscribe(callback);
	}

	fn on_hash_change(&self, callback: Callback) {
		self.hash_change.subscribe(callback);
	}
}

impl Debug for MemoryLocation {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let current = self.current();
		f.debug_struct("MemoryLocation")
			.field("pathname", &current.pathname)
			.field("hash", &current.hash)
			.field("history_len", &self.history_len())
			.finish()
	}
}
