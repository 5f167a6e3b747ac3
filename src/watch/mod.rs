//! Watch subscriptions for policy keys
//!
//! Every registration is identified by `(key, subscriber_id)` and owns one
//! background task. The task listens to the store's change stream for the key
//! and hands every new value to the caller's callback.
//!
//! ```text
//! register_config_callback(key, id, cb)
//!   ├─> store.watch(key)            [watch set up before the read below]
//!   ├─> store.get(key) ──> cb(value) [bounded by fetch_timeout]
//!   └─> spawn watch task ──> cb(value) per change, until cancelled
//!
//! deregister_config(key, id)
//!   └─> cancel token ──> task exits, stream dropped, store watch released
//! ```
//!
//! # Error Handling
//!
//! Nothing on the watch path reaches the caller. A failed initial read leaves
//! the container on its defaults, a failed watch setup means no live updates,
//! and transient stream errors are logged while the task keeps listening.

mod manager;


pub use manager::*;
