// ============================================================================
// propcell - Typed Bindings
// The typed wrapper over the untyped binding object, and the evaluator
// adapter that bridges the two
// ============================================================================

use std::any::TypeId;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::core::error::BindingError;
use crate::core::location::SourceLocation;
use crate::core::types::{AnyCell, CellData, EqualsFn};
use crate::primitives::property::Property;
use crate::reactivity::binding::{BindingData, BindingEvalFn, UntypedBinding};
use crate::reactivity::equality;

// =============================================================================
// BINDING<T>
// =============================================================================

/// A typed expression whose result becomes a cell's value.
///
/// Bindings are reference-counted and shareable; installing one on a
/// property attaches the shared state, and `take_binding` hands it back.
/// The expression runs lazily, on the first read after any of the cells it
/// read last time changed.
///
/// # Example
///
/// ```
/// use propcell::{bind, Property};
///
/// let celsius = Property::new(20.0_f64);
/// let fahrenheit = Property::new(0.0_f64);
/// let c = celsius.clone();
/// fahrenheit.set_binding(bind(move || c.value() * 9.0 / 5.0 + 32.0));
///
/// assert_eq!(fahrenheit.value(), 68.0);
/// celsius.set_value(100.0);
/// assert_eq!(fahrenheit.value(), 212.0);
/// ```
pub struct Binding<T> {
    untyped: UntypedBinding,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            untyped: self.untyped.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + 'static> Binding<T> {
    /// Create a binding from an infallible expression, comparing results
    /// with `PartialEq` to decide whether dependents must be told.
    #[track_caller]
    pub fn new<F>(f: F) -> Self
    where
        T: PartialEq,
        F: Fn() -> T + 'static,
    {
        Self::new_with_equals(f, equality::equals::<T>)
    }

    /// Create a binding with a custom change-detection function.
    #[track_caller]
    pub fn new_with_equals<F>(f: F, equals: EqualsFn<T>) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let location = SourceLocation::caller();
        Self::build(move || Ok(f()), equals, location)
    }

    /// Create a binding from an expression that can fail. On failure the
    /// error is recorded on the binding and the cell keeps its last good
    /// value.
    #[track_caller]
    pub fn fallible<F>(f: F) -> Self
    where
        T: PartialEq,
        F: Fn() -> Result<T, String> + 'static,
    {
        let location = SourceLocation::caller();
        Self::build(
            move || f().map_err(BindingError::evaluation),
            equality::equals::<T>,
            location,
        )
    }

    /// Create a binding that mirrors another property.
    #[track_caller]
    pub fn from_property(property: &Property<T>) -> Self
    where
        T: PartialEq,
    {
        let property = property.clone();
        Self::new(move || property.value())
    }

    fn build(
        f: impl Fn() -> Result<T, BindingError> + 'static,
        equals: EqualsFn<T>,
        location: SourceLocation,
    ) -> Self {
        // The adapter is the typed/untyped seam: it downcasts the target
        // storage using the recorded type identity and compare-and-stores
        // the fresh result. Facades guarantee the downcast by checking
        // TypeId before install.
        let eval: BindingEvalFn = Box::new(move |target: &dyn AnyCell| {
            let Some(cell) = target.as_any().downcast_ref::<CellData<T>>() else {
                return Err(BindingError::unknown("binding target storage type mismatch"));
            };
            let fresh = f()?;
            let changed = cell.with(|current| !(equals)(current, &fresh));
            if changed {
                cell.store(fresh);
            }
            Ok(changed)
        });

        Self {
            untyped: UntypedBinding::from_data(BindingData::new(TypeId::of::<T>(), location, eval)),
            _marker: PhantomData,
        }
    }

    pub(crate) fn from_data(data: Rc<BindingData>) -> Self {
        debug_assert_eq!(data.value_type(), TypeId::of::<T>());
        Self {
            untyped: UntypedBinding::from_data(data),
            _marker: PhantomData,
        }
    }

    pub(crate) fn data(&self) -> &Rc<BindingData> {
        self.untyped.data()
    }

    /// Recover a typed binding from an untyped handle. Returns None when the
    /// value types disagree.
    pub fn from_untyped(untyped: UntypedBinding) -> Option<Self> {
        if untyped.value_type() != TypeId::of::<T>() {
            return None;
        }
        Some(Self {
            untyped,
            _marker: PhantomData,
        })
    }

    /// Erase the value type.
    pub fn into_untyped(self) -> UntypedBinding {
        self.untyped
    }

    /// Borrow the untyped handle.
    pub fn untyped(&self) -> &UntypedBinding {
        &self.untyped
    }

    /// The error recorded by the last evaluation, if any.
    pub fn error(&self) -> Option<BindingError> {
        self.untyped.error()
    }

    pub fn location(&self) -> SourceLocation {
        self.untyped.location()
    }
}

impl<T: 'static> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("value_type", &std::any::type_name::<T>())
            .field("location", &self.untyped.location())
            .field("error", &self.untyped.error())
            .finish()
    }
}

// =============================================================================
// CONSTRUCTOR FUNCTIONS
// =============================================================================

/// Create a binding from an expression.
///
/// The expression's reads are captured automatically as dependencies each
/// time it runs.
#[track_caller]
pub fn bind<T, F>(f: F) -> Binding<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    Binding::new(f)
}

/// Create a binding with a custom change-detection function.
#[track_caller]
pub fn bind_with_equals<T, F>(f: F, equals: EqualsFn<T>) -> Binding<T>
where
    T: Clone + 'static,
    F: Fn() -> T + 'static,
{
    Binding::new_with_equals(f, equals)
}

/// Create a binding from an expression that can fail.
#[track_caller]
pub fn bind_fallible<T, F>(f: F) -> Binding<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> Result<T, String> + 'static,
{
    Binding::fallible(f)
}

// =============================================================================
// TESTS
// =============================================================================
