//! Shapes a polled expression may return.

use std::fmt::Debug;

/// Result of evaluating a polled expression once.
///
/// Implemented for plain values and for `Result`s wrapping them, so a polled
/// closure can use `?`. An `Err` stops the wait and is reported.
pub trait Probe<V> {
    /// Convert into the probed value, or a rendered error.
    ///
    /// # Errors
    ///
    /// Returns the `Debug` rendering of the expression's error.
    fn into_probe(self) -> Result<V, String>;
}

impl Probe<bool> for bool {
    fn into_probe(self) -> Result<bool, String> {
        Ok(self)
    }
}

impl<E: Debug> Probe<bool> for Result<bool, E> {
    fn into_probe(self) -> Result<bool, String> {
        self.map_err(|error| format!("{error:?}"))
    }
}

impl<T> Probe<Option<T>> for Option<T> {
    fn into_probe(self) -> Result<Option<T>, String> {
        Ok(self)
    }
}

impl<T, E: Debug> Probe<Option<T>> for Result<Option<T>, E> {
    fn into_probe(self) -> Result<Option<T>, String> {
        self.map_err(|error| format!("{error:?}"))
    }
}
