//! Result-or-fallback value returned by every `ApiClient` operation.

use serde_json::Value;

/// How an `ApiClient` operation completed.
///
/// There is no error variant: failures are logged and replaced by the
/// client's fallback value.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T = Value> {
    /// The server answered with a 2xx status. The response payload is not
    /// mapped into a value.
    Completed,
    /// The operation failed and resolved with the fallback value.
    Fallback(T),
}

impl<T> Outcome<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback(_))
    }

    /// The value a subscriber would observe: nothing on success, the
    /// fallback on failure.
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Completed => None,
            Outcome::Fallback(value) => Some(value),
        }
    }
}
