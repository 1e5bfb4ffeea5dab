//! Application layer containing the tracking lifecycle.
//!
//! `TrackingEngine` applies the per-token state machine to a chat's set,
//! `PollScheduler` drives one recurring refresh per chat, and
//! `TrackerService` ties both to storage and the chat transport.

pub mod engine;
pub mod messages;
pub mod notify;
pub mod scheduler;
pub mod service;
