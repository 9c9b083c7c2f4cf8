//! Ports: per-step accessors bound to channels at wiring time.
//!
//! A step declares its data needs as `Port<T>` fields and exposes them
//! through [`Step::ports`](crate::step::Step::ports). During the wiring
//! pass the workflow looks each port's mapping name up in its channel
//! table and binds the port; a mandatory port with no matching channel, or
//! one whose channel holds a different type, fails wiring fatally.
//!
//! Mapping names may be changed freely before wiring; afterwards a port is
//! either bound to exactly one channel or — if optional and unresolved —
//! permanently unbound.

use crate::channel::CellRef;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Why a [`PortBinding::bind`] call was rejected.
#[doc(hidden)]
pub struct BindError {
    pub expected: &'static str,
    pub actual: &'static str,
}

/// Object-safe view of a port used by the wiring pass.
pub trait PortBinding: Send {
    /// The channel name this port resolves against.
    fn mapping_name(&self) -> &str;

    /// Rename the port. Only effective before wiring.
    fn set_mapping_name(&mut self, name: &str);

    /// Whether the port may stay unbound without failing wiring.
    fn is_optional(&self) -> bool;

    /// Whether the port has been bound to a channel.
    fn is_bound(&self) -> bool;

    #[doc(hidden)]
    fn bind(&mut self, cell: &CellRef) -> std::result::Result<(), BindError>;

    #[doc(hidden)]
    fn expected_type(&self) -> &'static str;
}

/// A typed accessor to one channel, resolved by name at wiring time.
pub struct Port<T> {
    mapping_name: String,
    optional: bool,
    cell: Option<Arc<Mutex<T>>>,
}

impl<T: Send + 'static> Port<T> {
    /// A mandatory port: wiring fails if `name` matches no channel.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            mapping_name: name.into(),
            optional: false,
            cell: None,
        }
    }

    /// An optional port: left unbound if `name` matches no channel.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            mapping_name: name.into(),
            optional: true,
            cell: None,
        }
    }

    /// Read the bound channel's value.
    ///
    /// # Panics
    /// If the port is unbound (used before wiring, or optional and
    /// unresolved). That is a malformed pipeline definition, not a
    /// recoverable condition.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value().clone()
    }

    /// Write the bound channel's value.
    pub fn set(&self, value: T) {
        *self.value() = value;
    }

    /// Run `f` with mutable access to the bound channel's value.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.value())
    }

    /// Whether this port and `other` are bound to the same storage.
    pub fn shares_storage(&self, other: &Port<T>) -> bool {
        match (&self.cell, &other.cell) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn value(&self) -> MutexGuard<'_, T> {
        match &self.cell {
            Some(cell) => cell.lock().unwrap_or_else(PoisonError::into_inner),
            None => panic!(
                "port '{}' was used before being bound to a channel",
                self.mapping_name
            ),
        }
    }
}

impl<T: Send + 'static> PortBinding for Port<T> {
    fn mapping_name(&self) -> &str {
        &self.mapping_name
    }

    fn set_mapping_name(&mut self, name: &str) {
        self.mapping_name = name.to_string();
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    fn is_bound(&self) -> bool {
        self.cell.is_some()
    }

    fn bind(&mut self, cell: &CellRef) -> std::result::Result<(), BindError> {
        match cell.downcast::<T>() {
            Some(storage) => {
                self.cell = Some(storage);
                Ok(())
            }
            None => Err(BindError {
                expected: std::any::type_name::<T>(),
                actual: cell.type_name(),
            }),
        }
    }

    fn expected_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}
