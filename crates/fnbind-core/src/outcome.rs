//! Handler return types.
//!
//! A handler's output is split into an optional value and an optional fault.
//! The supported shapes are:
//!
//! | Return type | Return roles |
//! |---|---|
//! | `()` | none |
//! | `T: Reply` | value |
//! | `Result<(), E: Fault>` | error |
//! | `Result<T: Reply, E: Fault>` | value, error |

use crate::error::{BoxFault, Fault};
use crate::signature::ReturnRole;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A value a handler may return for encoding.
///
/// Implement it for your response types:
///
/// ```
/// use fnbind_core::Reply;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Greeting {
///     message: String,
/// }
///
/// impl Reply for Greeting {}
/// ```
pub trait Reply: Serialize + Send + 'static {}

impl Reply for String {}
impl Reply for &'static str {}
impl Reply for bool {}
impl Reply for i64 {}
impl Reply for u64 {}
impl Reply for f64 {}
impl Reply for serde_json::Value {}
impl<T: Serialize + Send + 'static> Reply for Vec<T> {}
impl<V: Serialize + Send + 'static> Reply for HashMap<String, V> {}
impl<V: Serialize + Send + 'static> Reply for BTreeMap<String, V> {}
impl<T: Reply> Reply for Box<T> {}

/// The output of a handler.
pub trait Outcome: Send + 'static {
    /// The type handed to the response encoder.
    type Value: Serialize + Send;

    /// The return roles this output declares.
    fn returns() -> Vec<ReturnRole>;

    /// Splits the output into its value and fault.
    ///
    /// A present fault takes precedence over the value.
    fn split(self) -> (Option<Self::Value>, Option<BoxFault>);
}

impl Outcome for () {
    type Value = ();

    fn returns() -> Vec<ReturnRole> {
        Vec::new()
    }

    fn split(self) -> (Option<()>, Option<BoxFault>) {
        (None, None)
    }
}

impl<T: Reply> Outcome for T {
    type Value = T;

    fn returns() -> Vec<ReturnRole> {
        vec![ReturnRole::Value]
    }

    fn split(self) -> (Option<T>, Option<BoxFault>) {
        (Some(self), None)
    }
}

impl<E: Fault> Outcome for Result<(), E> {
    type Value = ();

    fn returns() -> Vec<ReturnRole> {
        vec![ReturnRole::Error]
    }

    fn split(self) -> (Option<()>, Option<BoxFault>) {
        match self {
            Ok(()) => (None, None),
            Err(e) => (None, Some(Box::new(e))),
        }
    }
}

impl<T: Reply, E: Fault> Outcome for Result<T, E> {
    type Value = T;

    fn returns() -> Vec<ReturnRole> {
        vec![ReturnRole::Value, ReturnRole::Error]
    }

    fn split(self) -> (Option<T>, Option<BoxFault>) {
        match self {
            Ok(value) => (Some(value), None),
            Err(e) => (None, Some(Box::new(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusedError;
    use http::StatusCode;

    #[test]
    fn test_unit_has_no_returns() {
        assert!(<()>::returns().is_empty());
        let (value, fault) = ().split();
        assert!(value.is_none());
        assert!(fault.is_none());
    }

    #[test]
    fn test_value_only() {
        assert_eq!(String::returns(), vec![ReturnRole::Value]);
        let (value, fault) = String::from("hi").split();
        assert_eq!(value.as_deref(), Some("hi"));
        assert!(fault.is_none());
    }

    #[test]
    fn test_error_only() {
        type Out = Result<(), StatusedError>;
        assert_eq!(Out::returns(), vec![ReturnRole::Error]);

        let (value, fault) = Out::Err(StatusedError::not_found("missing")).split();
        assert!(value.is_none());
        assert_eq!(fault.unwrap().status_code(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_value_and_error() {
        type Out = Result<Vec<u8>, anyhow::Error>;
        assert_eq!(Out::returns(), vec![ReturnRole::Value, ReturnRole::Error]);

        let (value, fault) = Out::Ok(vec![1, 2]).split();
        assert_eq!(value, Some(vec![1, 2]));
        assert!(fault.is_none());

        let (value, fault) = Out::Err(anyhow::anyhow!("boom")).split();
        assert!(value.is_none());
        assert_eq!(fault.unwrap().to_string(), "boom");
    }
}
