use sapling_dom::{HashRouter, HistoryRouter, Location, MemoryLocation, Navigate, Store, Subscribe};
use std::rc::Rc;

mod memory_setup_;
use memory_setup_::{init_tracing, Counter};

#[derive(Debug, Clone, Default, PartialEq)]
struct Session {
	user: Option<String>,
	visits: u32,
}

enum Action {
	LogIn(String),
	LogOut,
	Visit,
}

fn session_store() -> Store<Session, Action> {
	Store::new(Session::default(), |state, action| match action {
		Action::LogIn(user) => Session { user: Some(user), ..state.clone() },
		Action::LogOut => Session { user: None, ..state.clone() },
		Action::Visit => Session { visits: state.visits + 1, ..state.clone() },
	})
}

fn counting(counter: &Counter) -> Rc<dyn Fn()> {
	let counter = counter.clone();
	Rc::new(move || counter.bump())
}

#[test]
fn store_notifies_after_each_change() {
	init_tracing();
	let store = Rc::new(session_store());
	let notified = Counter::new();
	let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
	store.subscribe(counting(&notified));
	store.subscribe(Rc::new({
		let store = Rc::downgrade(&store);
		let seen = Rc::clone(&seen);
		move || {
			if let Some(store) = store.upgrade() {
				seen.borrow_mut().push(store.with_state(|state| state.user.clone()));
			}
		}
	}));

	store.dispatch(Action::LogIn("ada".to_owned()));
	store.dispatch(Action::Visit);
	store.dispatch(Action::LogOut);

	assert_eq!(notified.get(), 3);
	assert_eq!(*seen.borrow(), vec![Some("ada".to_owned()), Some("ada".to_owned()), None]);
	assert_eq!(store.get_state(), Session { user: None, visits: 1 });
}

#[test]
fn store_set_state_and_update() {
	init_tracing();
	let store = session_store();
	let notified = Counter::new();
	store.subscribe(counting(&notified));

	store.set_state(Session { user: Some("grace".to_owned()), visits: 7 });
	store.update(|state| state.visits += 1);

	assert_eq!(store.get_state().visits, 8);
	assert_eq!(notified.get(), 2);
}

#[test]
fn history_router_pushes_and_follows_back() {
	init_tracing();
	let location = Rc::new(MemoryLocation::new("/"));
	let router = HistoryRouter::new(Rc::clone(&location));
	let notified = Counter::new();
	router.subscribe(counting(&notified));

	router.push("/profile");
	assert_eq!(router.path(), "/profile");
	assert_eq!(notified.get(), 1);
	assert_eq!(location.history_len(), 2);

	assert!(location.back());
	assert_eq!(router.path(), "/");
	assert_eq!(notified.get(), 2);

	assert!(!location.back());
	assert!(location.forward());
	assert_eq!(router.path(), "/profile");
	assert_eq!(notified.get(), 3);
}

#[test]
fn hash_router_defaults_to_root() {
	init_tracing();
	let location = Rc::new(MemoryLocation::new("/index.html"));
	let router = HashRouter::new(Rc::clone(&location));

	assert_eq!(location.hash(), "#/");
	assert_eq!(router.path(), "/");
	assert_eq!(location.pathname(), "/index.html");
}

#[test]
fn hash_router_notifies_through_hash_changes() {
	init_tracing();
	let location = Rc::new(MemoryLocation::new("/#/login"));
	let router = HashRouter::new(Rc::clone(&location));
	let notified = Counter::new();
	router.subscribe(counting(&notified));
	assert_eq!(router.path(), "/login");

	router.push("/profile");
	assert_eq!(router.path(), "/profile");
	assert_eq!(location.hash(), "#/profile");
	assert_eq!(notified.get(), 1);

	// Same hash: no change, no notification.
	router.push("/profile");
	assert_eq!(notified.get(), 1);

	assert!(location.back());
	assert_eq!(router.path(), "/login");
	assert_eq!(notified.get(), 2);
}

#[test]
fn routers_share_one_contract() {
	init_tracing();
	fn visit(router: &dyn Navigate, path: &str) -> String {
		router.push(path);
		router.path()
	}

	let history = HistoryRouter::new(MemoryLocation::default());
	let hash = HashRouter::new(MemoryLocation::default());
	assert_eq!(visit(&history, "/about"), "/about");
	assert_eq!(visit(&hash, "/about"), "/about");
}
