use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::BindingKey;
use crate::monitor::ReadWriteMonitor;
use crate::provider::Provider;

/// Calls its base provider once and caches the first successful result.
///
/// Safe to share between threads: concurrent first calls trigger exactly one
/// base call. A failing base call is not cached, so a later `get` retries.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{InstanceProvider, Lazy};
/// use std::sync::Arc;
///
/// let lazy = Lazy::new(InstanceProvider::new(Arc::new("ready".to_string())));
/// assert!(!lazy.is_initialized());
/// assert_eq!(lazy.get().unwrap().as_str(), "ready");
/// assert!(lazy.is_initialized());
/// ```
pub struct Lazy<T: ?Sized> {
    base: Box<dyn Provider<T>>,
    value: ReadWriteMonitor<Option<Arc<T>>>,
}

impl<T: ?Sized + Send + Sync + 'static> Lazy<T> {
    pub fn new(base: impl Provider<T> + 'static) -> Self {
        Self {
            base: Box::new(base),
            value: ReadWriteMonitor::new(None),
        }
    }

    pub fn get(&self) -> DiResult<Arc<T>> {
        {
            let cached = self.value.read().map_err(|_| self.reentered())?;
            if let Some(value) = cached.as_ref() {
                return Ok(value.clone());
            }
        }

        let mut slot = self.value.write().map_err(|_| self.reentered())?;
        if let Some(value) = slot.as_ref() {
            return Ok(value.clone());
        }
        let value = self.base.get()?;
        *slot = Some(value.clone());
        Ok(value)
    }

    /// Whether a value has been cached. False while the first computation is
    /// still running on the calling thread.
    pub fn is_initialized(&self) -> bool {
        self.value.read().map(|v| v.is_some()).unwrap_or(false)
    }

    fn reentered(&self) -> DiError {
        match self.base.binding_key() {
            Some(key) => DiError::Circular(vec![key.clone(), key.clone()]),
            None => DiError::configuration("lazy value requested while it is being computed"),
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Provider<T> for Lazy<T> {
    fn get(&self) -> DiResult<Arc<T>> {
        Lazy::get(self)
    }

    fn binding_key(&self) -> Option<&BindingKey> {
        self.base.binding_key()
    }
}

impl<T: ?Sized> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("key", &self.base.binding_key())
            .finish()
    }
}
