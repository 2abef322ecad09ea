//! Session continuity across runs
//!
//! - `SessionStore` - Sessions keyed by client-supplied id
//! - `Session` - The runs created under one session id

pub mod store;

pub use store::{Session, SessionRun, SessionStore};
