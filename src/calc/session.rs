//! The worker's calculator session.
//!
//! Uses `thread_local!` + `RefCell` for safe mutable access in single-threaded
//! WASM. The Web Worker keeps the module alive, so the store lives across
//! `handle_request` calls for the whole browser session. Route handlers are
//! the only callers; everything else receives the store by reference.

use std::cell::RefCell;

use crate::calc::store::ZoneStore;

thread_local! {
    static STORE: RefCell<ZoneStore> = RefCell::new(ZoneStore::new());
}

/// Execute a closure with read access to the store.
pub fn with_store<F, R>(f: F) -> R
where
    F: FnOnce(&ZoneStore) -> R,
{
    STORE.with(|s| f(&s.borrow()))
}

/// Execute a closure with mutable access to the store.
pub fn with_store_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut ZoneStore) -> R,
{
    STORE.with(|s| f(&mut s.borrow_mut()))
}

/// Replace the whole store (tests and full resets).
pub fn replace_store(store: ZoneStore) {
    STORE.with(|s| {
        *s.borrow_mut() = store;
    });
}
