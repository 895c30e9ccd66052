//! Handler parameter types and how they are bound from a request.
//!
//! A parameter type implements [`Arg`], which pairs a [`ParamDescriptor`]
//! (consumed by the classifier at registration) with the code that produces
//! the value from a [`BindSource`] at request time.
//!
//! Request bodies are bound through [`Payload`]. Implement it for your own
//! record types; the default shape is [`TypeShape::Record`].
//!
//! ```
//! use fnbind_core::Payload;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Greet {
//!     name: String,
//! }
//!
//! impl Payload for Greet {}
//! ```

use crate::error::Fault;
use crate::header::HeaderBag;
use crate::signature::{ParamDescriptor, TypeShape};
use crate::RequestContext;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};

/// Where bound values come from.
///
/// Implemented by the request decoder. Each method corresponds to one role.
pub trait BindSource {
    /// Error returned when binding fails.
    type Error: Fault;

    /// Produces the context for the context role.
    fn context(&self) -> RequestContext;

    /// Produces the header bag for the header-bag role.
    fn header_bag(&self) -> HeaderBag;

    /// Decodes the request body into the payload type.
    fn payload<T: DeserializeOwned>(&self) -> Result<T, Self::Error>;

    /// Error for a parameter type that has no role.
    ///
    /// Unreachable for validated signatures.
    fn unbindable(&self, type_name: &'static str) -> Self::Error;
}

/// A type that can appear as a handler parameter.
pub trait Arg: Sized + Send + 'static {
    /// Describes this type to the classifier.
    fn descriptor() -> ParamDescriptor;

    /// Produces a value from the request.
    fn bind<S: BindSource>(source: &S) -> Result<Self, S::Error>;
}

/// A type decoded from the request body.
pub trait Payload: DeserializeOwned + Send + 'static {
    /// The structural shape of this type.
    fn shape() -> TypeShape {
        TypeShape::Record
    }
}

impl<T: Payload> Arg for T {
    fn descriptor() -> ParamDescriptor {
        ParamDescriptor::new(T::shape(), std::any::type_name::<T>())
    }

    fn bind<S: BindSource>(source: &S) -> Result<Self, S::Error> {
        source.payload()
    }
}

impl<T> Payload for Vec<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn shape() -> TypeShape {
        TypeShape::Sequence
    }
}

impl<V> Payload for HashMap<String, V>
where
    V: DeserializeOwned + Send + 'static,
{
    fn shape() -> TypeShape {
        TypeShape::Map
    }
}

impl<V> Payload for BTreeMap<String, V>
where
    V: DeserializeOwned + Send + 'static,
{
    fn shape() -> TypeShape {
        TypeShape::Map
    }
}

impl<T: Payload> Payload for Box<T> {
    fn shape() -> TypeShape {
        TypeShape::pointer(T::shape())
    }
}

impl Arg for RequestContext {
    fn descriptor() -> ParamDescriptor {
        ParamDescriptor::new(TypeShape::Context, "RequestContext")
    }

    fn bind<S: BindSource>(source: &S) -> Result<Self, S::Error> {
        Ok(source.context())
    }
}

impl Arg for HeaderBag {
    fn descriptor() -> ParamDescriptor {
        ParamDescriptor::new(TypeShape::HeaderBag, "HeaderBag")
    }

    fn bind<S: BindSource>(source: &S) -> Result<Self, S::Error> {
        Ok(source.header_bag())
    }
}

/// Primitives are describable so registration can name them when it rejects
/// them; they never bind.
macro_rules! scalar_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Arg for $ty {
                fn descriptor() -> ParamDescriptor {
                    ParamDescriptor::new(TypeShape::Scalar, stringify!($ty))
                }

                fn bind<S: BindSource>(source: &S) -> Result<Self, S::Error> {
                    Err(source.unbindable(stringify!($ty)))
                }
            }
        )*
    };
}

scalar_arg!(String, bool, char, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// An ordered list of handler parameters.
///
/// Implemented for tuples of up to four [`Arg`]s. Four-parameter handlers
/// compile but are rejected at registration.
pub trait ArgList: Sized + Send + 'static {
    /// Descriptors in declaration order.
    fn descriptors() -> Vec<ParamDescriptor>;

    /// Binds every parameter.
    fn bind<S: BindSource>(source: &S) -> Result<Self, S::Error>;
}

macro_rules! arg_list {
    ($($ty:ident),*) => {
        impl<$($ty: Arg,)*> ArgList for ($($ty,)*) {
            fn descriptors() -> Vec<ParamDescriptor> {
                vec![$($ty::descriptor(),)*]
            }

            #[allow(unused_variables)]
            fn bind<S: BindSource>(source: &S) -> Result<Self, S::Error> {
                Ok(($($ty::bind(source)?,)*))
            }
        }
    };
}

arg_list!();
arg_list!(T1);
arg_list!(T1, T2);
arg_list!(T1, T2, T3);
arg_list!(T1, T2, T3, T4);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusedError;
    use crate::signature::{classify, Role};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Greet {
        name: String,
    }

    impl Payload for Greet {}

    struct FixedSource {
        body: &'static str,
    }

    impl BindSource for FixedSource {
        type Error = StatusedError;

        fn context(&self) -> RequestContext {
            RequestContext::mock()
        }

        fn header_bag(&self) -> HeaderBag {
            let mut bag = HeaderBag::new();
            bag.insert("x-test", "yes");
            bag
        }

        fn payload<T: DeserializeOwned>(&self) -> Result<T, Self::Error> {
            serde_json::from_str(self.body).map_err(|e| StatusedError::bad_request(e.to_string()))
        }

        fn unbindable(&self, type_name: &'static str) -> Self::Error {
            StatusedError::internal(format!("cannot bind {type_name}"))
        }
    }

    #[test]
    fn test_descriptor_roles() {
        assert_eq!(classify(RequestContext::descriptor().shape()), Some(Role::Context));
        assert_eq!(classify(HeaderBag::descriptor().shape()), Some(Role::HeaderBag));
        assert_eq!(classify(Greet::descriptor().shape()), Some(Role::Payload));
        assert_eq!(
            classify(<Vec<u32>>::descriptor().shape()),
            Some(Role::Payload)
        );
        assert_eq!(
            classify(<HashMap<String, String>>::descriptor().shape()),
            Some(Role::Payload)
        );
        assert_eq!(classify(<Box<Greet>>::descriptor().shape()), Some(Role::Payload));
        assert_eq!(classify(<Box<Box<Greet>>>::descriptor().shape()), None);
        assert_eq!(classify(String::descriptor().shape()), None);
    }

    #[test]
    fn test_payload_type_name() {
        assert!(Greet::descriptor().type_name().ends_with("Greet"));
        assert_eq!(u64::descriptor().type_name(), "u64");
    }

    #[test]
    fn test_bind_list() {
        let source = FixedSource {
            body: r#"{"name":"Ada"}"#,
        };
        let (ctx, headers, greet) =
            <(RequestContext, HeaderBag, Greet)>::bind(&source).unwrap();

        assert!(!ctx.is_cancelled());
        assert_eq!(headers.get("X-Test"), Some("yes"));
        assert_eq!(greet, Greet { name: "Ada".into() });
    }

    #[test]
    fn test_bind_failure_propagates() {
        let source = FixedSource { body: "not json" };
        let err = <(Greet,)>::bind(&source).unwrap_err();
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_scalar_never_binds() {
        let source = FixedSource { body: "\"x\"" };
        let err = String::bind(&source).unwrap_err();
        assert_eq!(err.message(), "cannot bind String");
    }

    #[test]
    fn test_empty_list() {
        assert!(<()>::descriptors().is_empty());
        let source = FixedSource { body: "" };
        assert!(<()>::bind(&source).is_ok());
    }
}
