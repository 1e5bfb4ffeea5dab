//! Inbound side of the chat transport: command parsing and the update loop.

pub mod bot;
pub mod commands;
