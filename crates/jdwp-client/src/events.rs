//! Events received from the VM and their delivery to per-request handlers

pub use dispatcher::*;
pub use event::*;

mod dispatcher;
mod event;
