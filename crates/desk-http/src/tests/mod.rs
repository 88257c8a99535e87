//! Refresh interceptor tests against the scripted backend.
//!
//! - `refresh_flow.rs` - concurrent 401s, terminal refresh failures, replay
//!   limits, cancellation and explicit session refresh
