//! State module for tracking crawl progress
//!
//! `SessionState` tracks where a crawl session is in its fetch / emit cycle.

mod session_state;

pub use session_state::SessionState;
