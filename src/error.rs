//! Error types for the injection container.

use std::fmt;

use crate::key::BindingKey;

/// Injection errors
///
/// Every failure the container reports is one of these variants, so callers
/// can tell a configuration mistake (fix the bindings before retrying) from a
/// missing binding or a structural cycle.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{Binder, DiError};
///
/// struct Missing;
///
/// let injector = Binder::new().build();
/// match injector.get_instance::<Missing>() {
///     Err(DiError::Unresolved(key)) => {
///         assert!(key.to_string().contains("Missing"));
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_inject::{BindingKey, DiError};
///
/// let circular = DiError::Circular(vec![
///     BindingKey::of::<u8>(),
///     BindingKey::of::<u16>(),
///     BindingKey::of::<u8>(),
/// ]);
/// assert_eq!(circular.to_string(), "Circular dependency: u8 -> u16 -> u8");
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// Malformed key, invalid builder usage, bad dict setup or bad signature
    Configuration(String),
    /// A resolver is already registered under an equal key
    DuplicateBinding(BindingKey),
    /// No resolver for the key and the type is not auto-injectable
    Unresolved(BindingKey),
    /// Cycle detected during resolution (ordered chain, repeated key last)
    Circular(Vec<BindingKey>),
    /// Type downcast failed
    TypeMismatch(&'static str),
    /// Maximum recursion depth exceeded
    DepthExceeded(usize),
}

impl DiError {
    /// Shorthand for [`DiError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        DiError::Configuration(message.into())
    }

    /// True for errors raised while the graph is being configured.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DiError::Configuration(_) | DiError::DuplicateBinding(_))
    }

    /// The key chain of a circular dependency, if this is one.
    pub fn cycle(&self) -> Option<&[BindingKey]> {
        match self {
            DiError::Circular(chain) => Some(chain),
            _ => None,
        }
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            DiError::DuplicateBinding(key) => write!(f, "Duplicate binding: {}", key),
            DiError::Unresolved(key) => write!(f, "No binding found for: {}", key),
            DiError::Circular(chain) => {
                write!(f, "Circular dependency: ")?;
                for (i, key) in chain.iter().enumerate() {
                    if i > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{}", key)?;
                }
                Ok(())
            }
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for injection operations
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{DiResult, DiError};
///
/// fn load_port() -> DiResult<u16> {
///     Err(DiError::configuration("port not configured"))
/// }
///
/// assert!(load_port().unwrap_err().is_configuration());
/// ```
pub type DiResult<T> = Result<T, DiError>;
