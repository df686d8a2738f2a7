//! A multiplexing JDWP client.
//!
//! The transport half of a Dalvik/ART debugger: handshake and packet framing over TCP, reply
//! correlation by packet id so any number of tasks can issue commands concurrently, a typed
//! wrapper for every command group, and demultiplexing of composite event packets to
//! per-request-id handlers.

mod client;
pub mod codec;
pub mod commands;
mod error;
pub mod events;
pub mod id_sizes;
pub mod packet;
pub mod raw;

pub use client::JdwpClient;
pub use error::{JdwpError, ProtocolError};

pub use jdwp_types;
