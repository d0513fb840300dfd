#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
//! Adapters between [`ripple`] signals and the wider async and event ecosystem.

pub mod emitter;
pub mod future;
pub mod stream;

pub use emitter::{Emitter, EmitterSubscription};
pub use future::{next_matching, NextError};
pub use stream::{events, Events};
