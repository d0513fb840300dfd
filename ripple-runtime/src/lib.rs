#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! Dispatchers in this crate are `!Send`. Each one serves a single cooperative
//! execution context, and so do the signals that submit to it.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, Job, LocalDispatcher};

#[cfg(feature = "global_dispatcher")]
pub use dispatcher::GlobalDispatcher;

#[doc = include_str!("../README.md")]
mod readme {}
