//! Error types for zkanji core.

use std::fmt;

use crate::range::Range;

/// Signal-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The connection ID is invalid or has already been disconnected.
    InvalidConnection,
    /// The signal has been dropped and is no longer available.
    SignalDropped,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConnection => write!(f, "Invalid or disconnected connection ID"),
            Self::SignalDropped => write!(f, "Signal has been dropped"),
        }
    }
}

impl std::error::Error for SignalError {}

/// Errors reported when a batch of [`Range`]s cannot be applied to a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// A range whose `first` is after its `last`.
    Inverted(Range),
    /// A range reaches past the end of the list.
    OutOfBounds {
        /// The offending range.
        range: Range,
        /// Length of the list the range was applied to.
        len: usize,
    },
    /// Ranges are not in ascending order, or overlap.
    Unordered,
    /// Two ranges touch; they should have been merged into one.
    Adjacent,
    /// A move destination falls inside one of the moved ranges.
    DestinationInside(usize),
    /// A destination past the end of the list.
    DestinationOutOfBounds {
        /// The requested destination.
        dest: usize,
        /// Length of the list.
        len: usize,
    },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inverted(r) => write!(f, "Range {}..={} is inverted", r.first, r.last),
            Self::OutOfBounds { range, len } => write!(
                f,
                "Range {}..={} is out of bounds for length {len}",
                range.first, range.last
            ),
            Self::Unordered => write!(f, "Ranges are unsorted or overlapping"),
            Self::Adjacent => write!(f, "Ranges are adjacent and should be merged"),
            Self::DestinationInside(dest) => {
                write!(f, "Destination {dest} lies inside a moved range")
            }
            Self::DestinationOutOfBounds { dest, len } => {
                write!(f, "Destination {dest} is out of bounds for length {len}")
            }
        }
    }
}

impl std::error::Error for RangeError {}
