//! Core plumbing for zkanji's word and kanji groups.
//!
//! This crate provides the framework-level pieces the group model is built
//! on, with no knowledge of groups themselves:
//!
//! - **Signal/Slot System**: synchronous, type-safe change notification
//! - **Ranges**: inclusive position ranges, start/count intervals and the
//!   shared range-batching move algorithm
//! - **Logging**: tracing targets and timing spans
//!
//! # Signal/Slot Example
//!
//! ```
//! use zkanji_core::Signal;
//!
//! let added = Signal::<(usize, usize)>::new();
//!
//! let conn_id = added.connect(|(parent, index)| {
//!     println!("child {} added under {}", index, parent);
//! });
//!
//! added.emit((0, 3));
//! added.disconnect(conn_id);
//! ```

mod error;
pub mod logging;
pub mod range;
pub mod signal;

pub use error::{RangeError, SignalError};
pub use logging::PerfSpan;
pub use range::{Interval, Range};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
