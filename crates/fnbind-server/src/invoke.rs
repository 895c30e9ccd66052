//! Handler invocation behind a panic boundary.

use fnbind_core::{BoxFault, Handler, Outcome, StatusedError};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// A handler's output, partitioned for the encoder and the translator.
#[derive(Debug)]
pub(crate) struct Split<V> {
    pub(crate) value: Option<V>,
    pub(crate) fault: Option<BoxFault>,
    pub(crate) panicked: bool,
}

impl<V> Split<V> {
    fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = panic_message(payload);
        Self {
            value: None,
            fault: Some(Box::new(StatusedError::internal(format!(
                "panic in route execution: {message}"
            )))),
            panicked: true,
        }
    }
}

/// Calls `handler` with bound arguments.
///
/// A panic while building the future or while polling it becomes a 500
/// fault in the returned split.
pub(crate) async fn invoke<H, A>(handler: &H, args: A) -> Split<<H::Output as Outcome>::Value>
where
    H: Handler<A>,
{
    let future = match panic::catch_unwind(AssertUnwindSafe(|| handler.call(args))) {
        Ok(future) => future,
        Err(payload) => return Split::from_panic(payload.as_ref()),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(output) => {
            let (value, fault) = output.split();
            Split {
                value,
                fault,
                panicked: false,
            }
        }
        Err(payload) => Split::from_panic(payload.as_ref()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
