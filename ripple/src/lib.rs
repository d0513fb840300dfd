#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! Signals are `!Send`. Each one belongs to a single cooperative execution context,
//! so it needs no locking. Listener code that re-enters a signal (to fire, connect or
//! disconnect) runs outside of any internal borrow.

mod connection;
mod error;
pub mod native;
mod ring;
mod signal;
mod wait;

pub use connection::{Connection, ConnectionGuard};
pub use error::{SignalError, WaitError};
pub use native::{AnyEvent, NativeEvent, NativeSubscription};
pub use ripple_runtime::{Dispatcher, Job, LocalDispatcher};
pub use signal::{SignalD, SignalWeak};
pub use wait::Wait;

#[cfg(feature = "global_dispatcher")]
pub use ripple_runtime::GlobalDispatcher;
#[cfg(feature = "global_dispatcher")]
pub use signal::Signal;

/// Shadows each given identifier with a [`Clone::clone`] of itself.
///
/// Handy for moving handles into `'static` listeners:
///
/// ```
/// use ripple::{shadow_clone, LocalDispatcher, SignalD};
///
/// let signal = SignalD::<u8, LocalDispatcher>::new();
/// let echo = SignalD::<u8, LocalDispatcher>::with_dispatcher(signal.dispatcher().clone());
/// let _connection = signal
/// 	.connect({
/// 		shadow_clone!(echo);
/// 		move |x| echo.fire(x).unwrap()
/// 	})
/// 	.unwrap();
/// ```
#[macro_export]
macro_rules! shadow_clone {
	($ident:ident$(,)?) => {
		// Avoids `unused_parens` from the general case.
		let $ident = ::core::clone::Clone::clone(&$ident);
	};
	($($ident:ident),*$(,)?) => {
		let ($($ident),*) = ($(::core::clone::Clone::clone(&$ident)),*);
	};
}

#[doc = include_str!("../README.md")]
mod readme {}
