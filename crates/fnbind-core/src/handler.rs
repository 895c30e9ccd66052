//! The handler trait, implemented for async functions and closures.

use crate::arg::{Arg, ArgList};
use crate::outcome::Outcome;
use crate::signature::HandlerSignature;
use std::future::Future;

/// An async function usable as a route handler.
///
/// Implemented for every `Fn` of up to four [`Arg`] parameters returning a
/// future whose output is an [`Outcome`]. The `Args` parameter is the tuple
/// of parameter types; it only exists to keep the implementations apart.
///
/// # Example
///
/// ```
/// use fnbind_core::{Handler, HeaderBag, RequestContext, Role, StatusedError};
///
/// async fn whoami(_ctx: RequestContext, headers: HeaderBag) -> Result<String, StatusedError> {
///     headers
///         .get("x-user")
///         .map(str::to_string)
///         .ok_or_else(|| StatusedError::bad_request("no user"))
/// }
///
/// fn signature_of<H: Handler<A>, A>(_: &H) -> fnbind_core::HandlerSignature {
///     H::signature()
/// }
///
/// let sig = signature_of(&whoami);
/// assert!(sig.validate().is_ok());
/// assert_eq!(sig.header_index(), Some(1));
/// ```
pub trait Handler<Args>: Clone + Send + Sync + 'static {
    /// What the handler returns.
    type Output: Outcome;

    /// The future returned by [`Handler::call`].
    type Future: Future<Output = Self::Output> + Send + 'static;

    /// Invokes the handler with bound arguments.
    fn call(&self, args: Args) -> Self::Future;

    /// The classified, unvalidated signature of this handler.
    fn signature() -> HandlerSignature;
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, Fut, O, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = O> + Send + 'static,
            O: Outcome,
            $($ty: Arg,)*
        {
            type Output = O;
            type Future = Fut;

            fn call(&self, ($($ty,)*): ($($ty,)*)) -> Self::Future {
                (self)($($ty),*)
            }

            fn signature() -> HandlerSignature {
                HandlerSignature::new(<($($ty,)*) as ArgList>::descriptors(), O::returns())
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
