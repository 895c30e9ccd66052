//! Role classification and signature validation.
//!
//! Every handler parameter type describes itself with a [`TypeShape`]. The
//! classifier maps a shape to at most one [`Role`]:
//!
//! | Shape | Role |
//! |---|---|
//! | `Context` | context (cancellation carrier) |
//! | `HeaderBag` | header bag |
//! | `Record`, `Map`, `Sequence` | payload |
//! | `Pointer` to `Record`, `Map` or `Sequence` | payload |
//! | anything else | unclassified |
//!
//! A [`HandlerSignature`] is the classified parameter list plus the return
//! roles. It is computed once, when a handler is registered, and
//! [`HandlerSignature::validate`] gates registration:
//!
//! - at most [`MAX_PARAMS`] parameters and [`MAX_RETURNS`] return values,
//! - every parameter classified,
//! - each role used at most once,
//! - the context only at index 0, the header bag only at index 0 or 1,
//! - at most one value return and at most one error return.
//!
//! Signatures are normally derived from a handler's Rust type (see
//! [`Handler::signature`](crate::Handler::signature)); they can also be
//! assembled from descriptors directly, which is how codecs and tests exercise
//! shapes Rust's type system would already refuse.
//!
//! # Example
//!
//! ```
//! use fnbind_core::signature::{HandlerSignature, ParamDescriptor, ReturnRole, Role, TypeShape};
//!
//! let sig = HandlerSignature::new(
//!     vec![
//!         ParamDescriptor::new(TypeShape::Context, "RequestContext"),
//!         ParamDescriptor::new(TypeShape::Record, "Greet"),
//!     ],
//!     vec![ReturnRole::Value, ReturnRole::Error],
//! );
//!
//! assert!(sig.validate().is_ok());
//! assert_eq!(sig.payload_index(), Some(1));
//! assert_eq!(sig.role_at(0), Some(Role::Context));
//! ```

use std::fmt;
use thiserror::Error;

/// Maximum number of handler parameters (one per role).
pub const MAX_PARAMS: usize = 3;

/// Maximum number of handler return values (one value, one error).
pub const MAX_RETURNS: usize = 2;

/// Structural description of a parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// The cancellation-carrying request context.
    Context,
    /// The per-request header bag.
    HeaderBag,
    /// A struct-like type with named fields.
    Record,
    /// A string-keyed map.
    Map,
    /// A list or array.
    Sequence,
    /// One level of indirection around another shape.
    Pointer(Box<TypeShape>),
    /// A primitive such as a number, string or boolean.
    Scalar,
    /// Anything the classifier has no rule for.
    Opaque,
}

impl TypeShape {
    /// Wraps a shape in one level of indirection.
    #[must_use]
    pub fn pointer(inner: TypeShape) -> Self {
        Self::Pointer(Box::new(inner))
    }

    fn is_decodable(&self) -> bool {
        matches!(self, Self::Record | Self::Map | Self::Sequence)
    }
}

/// The semantic purpose of a handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Receives the request context.
    Context,
    /// Receives the header bag.
    HeaderBag,
    /// Receives the decoded request body.
    Payload,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context => write!(f, "context"),
            Self::HeaderBag => write!(f, "header bag"),
            Self::Payload => write!(f, "payload"),
        }
    }
}

/// The semantic purpose of a handler return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnRole {
    /// A value to be encoded into the response body.
    Value,
    /// An error to be rendered by the error translator.
    Error,
}

impl fmt::Display for ReturnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "value"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Assigns a role to a shape, or `None` when no rule applies.
#[must_use]
pub fn classify(shape: &TypeShape) -> Option<Role> {
    match shape {
        TypeShape::Context => Some(Role::Context),
        TypeShape::HeaderBag => Some(Role::HeaderBag),
        TypeShape::Record | TypeShape::Map | TypeShape::Sequence => Some(Role::Payload),
        TypeShape::Pointer(inner) if inner.is_decodable() => Some(Role::Payload),
        TypeShape::Pointer(_) | TypeShape::Scalar | TypeShape::Opaque => None,
    }
}

/// A parameter's shape plus the type name used in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    shape: TypeShape,
    type_name: &'static str,
}

impl ParamDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub const fn new(shape: TypeShape, type_name: &'static str) -> Self {
        Self { shape, type_name }
    }

    /// Returns the shape.
    #[must_use]
    pub const fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// Returns the type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Errors reported when a handler's shape is rejected at registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// More parameters than there are roles.
    #[error("too many parameters: {count} (at most {max})", max = MAX_PARAMS)]
    TooManyParameters {
        /// Declared parameter count.
        count: usize,
    },

    /// More return values than a value and an error.
    #[error("too many return values: {count} (at most {max})", max = MAX_RETURNS)]
    TooManyReturnValues {
        /// Declared return count.
        count: usize,
    },

    /// A parameter type matches no role.
    #[error("parameter {index} has unsupported type {type_name}")]
    UnsupportedType {
        /// Parameter position.
        index: usize,
        /// The offending type.
        type_name: &'static str,
    },

    /// Two parameters classify to the same role.
    #[error("duplicate {role} parameter at index {second} (first at index {first})")]
    DuplicateRole {
        /// The repeated role.
        role: Role,
        /// Position of the first occurrence.
        first: usize,
        /// Position of the repeat.
        second: usize,
    },

    /// A role appears at a position it may not occupy.
    #[error("{role} parameter at index {index} must be at {allowed}")]
    WrongPosition {
        /// The misplaced role.
        role: Role,
        /// Its position.
        index: usize,
        /// Where it is allowed.
        allowed: &'static str,
    },

    /// Two return values share a role.
    #[error("duplicate {role} return value")]
    DuplicateReturnRole {
        /// The repeated return role.
        role: ReturnRole,
    },

    /// A codec refused the signature.
    #[error("{codec}: {reason}")]
    Codec {
        /// Codec name.
        codec: &'static str,
        /// Why the signature was refused.
        reason: String,
    },
}

impl SignatureError {
    /// Creates a codec-specific rejection.
    #[must_use]
    pub fn codec(codec: &'static str, reason: impl Into<String>) -> Self {
        Self::Codec {
            codec,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Param {
    descriptor: ParamDescriptor,
    role: Option<Role>,
}

/// The classified shape of a handler.
///
/// Immutable once built; cached with the registered endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSignature {
    params: Vec<Param>,
    returns: Vec<ReturnRole>,
}

impl HandlerSignature {
    /// Classifies the given parameters. Does not validate.
    #[must_use]
    pub fn new(params: Vec<ParamDescriptor>, returns: Vec<ReturnRole>) -> Self {
        let params = params
            .into_iter()
            .map(|descriptor| Param {
                role: classify(descriptor.shape()),
                descriptor,
            })
            .collect();
        Self { params, returns }
    }

    /// Classifies and validates in one step.
    pub fn checked(
        params: Vec<ParamDescriptor>,
        returns: Vec<ReturnRole>,
    ) -> Result<Self, SignatureError> {
        let signature = Self::new(params, returns);
        signature.validate()?;
        Ok(signature)
    }

    /// Checks the signature against the role rules.
    pub fn validate(&self) -> Result<(), SignatureError> {
        if self.params.len() > MAX_PARAMS {
            return Err(SignatureError::TooManyParameters {
                count: self.params.len(),
            });
        }
        if self.returns.len() > MAX_RETURNS {
            return Err(SignatureError::TooManyReturnValues {
                count: self.returns.len(),
            });
        }

        let mut seen: [Option<usize>; 3] = [None; 3];
        for (index, param) in self.params.iter().enumerate() {
            let role = param.role.ok_or(SignatureError::UnsupportedType {
                index,
                type_name: param.descriptor.type_name(),
            })?;

            let slot = &mut seen[role_slot(role)];
            if let Some(first) = *slot {
                return Err(SignatureError::DuplicateRole {
                    role,
                    first,
                    second: index,
                });
            }
            *slot = Some(index);

            match role {
                Role::Context if index != 0 => {
                    return Err(SignatureError::WrongPosition {
                        role,
                        index,
                        allowed: "index 0",
                    });
                }
                Role::HeaderBag if index > 1 => {
                    return Err(SignatureError::WrongPosition {
                        role,
                        index,
                        allowed: "index 0 or 1",
                    });
                }
                _ => {}
            }
        }

        let mut has_value = false;
        let mut has_error = false;
        for role in &self.returns {
            let seen = match role {
                ReturnRole::Value => &mut has_value,
                ReturnRole::Error => &mut has_error,
            };
            if *seen {
                return Err(SignatureError::DuplicateReturnRole { role: *role });
            }
            *seen = true;
        }

        Ok(())
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The role of the parameter at `index`, if classified.
    #[must_use]
    pub fn role_at(&self, index: usize) -> Option<Role> {
        self.params.get(index).and_then(|p| p.role)
    }

    /// The descriptor of the parameter at `index`.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&ParamDescriptor> {
        self.params.get(index).map(|p| &p.descriptor)
    }

    /// Position of the parameter with the given role.
    #[must_use]
    pub fn index_of(&self, role: Role) -> Option<usize> {
        self.params.iter().position(|p| p.role == Some(role))
    }

    /// Position of the context parameter.
    #[must_use]
    pub fn context_index(&self) -> Option<usize> {
        self.index_of(Role::Context)
    }

    /// Position of the header-bag parameter.
    #[must_use]
    pub fn header_index(&self) -> Option<usize> {
        self.index_of(Role::HeaderBag)
    }

    /// Position of the payload parameter.
    #[must_use]
    pub fn payload_index(&self) -> Option<usize> {
        self.index_of(Role::Payload)
    }

    /// Whether the request body must be read for this handler.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload_index().is_some()
    }

    /// The return roles in declaration order.
    #[must_use]
    pub fn returns(&self) -> &[ReturnRole] {
        &self.returns
    }

    /// Whether the handler produces a value to encode.
    #[must_use]
    pub fn returns_value(&self) -> bool {
        self.returns.contains(&ReturnRole::Value)
    }

    /// Whether the handler can fail.
    #[must_use]
    pub fn returns_error(&self) -> bool {
        self.returns.contains(&ReturnRole::Error)
    }
}

impl fmt::Display for HandlerSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match param.role {
                Some(role) => write!(f, "{role}: {}", param.descriptor.type_name())?,
                None => write!(f, "?: {}", param.descriptor.type_name())?,
            }
        }
        write!(f, ")")?;
        match self.returns.as_slice() {
            [] => Ok(()),
            [one] => write!(f, " -> {one}"),
            many => {
                let names: Vec<String> = many.iter().map(ToString::to_string).collect();
                write!(f, " -> ({})", names.join(", "))
            }
        }
    }
}

fn role_slot(role: Role) -> usize {
    match role {
        Role::Context => 0,
        Role::HeaderBag => 1,
        Role::Payload => 2,
    }
}
