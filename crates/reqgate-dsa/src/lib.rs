#![no_std]
extern crate alloc;

pub mod queue;

pub use queue::{PendingQueue, Ticket};
