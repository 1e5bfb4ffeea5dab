//! Domain layer: chat identity, tracked tokens, and the ports the
//! application layer talks through.

pub mod address;
pub mod chat;
pub mod ports;
pub mod time;
pub mod tracking;
