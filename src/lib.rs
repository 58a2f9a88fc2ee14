// ============================================================================
// propcell - Reactive Property Binding Cells
// ============================================================================
//
// A property is a cell whose value is stored directly or computed by a
// binding over other properties. Dependencies are captured automatically
// while a binding evaluates, invalidation cascades eagerly on write, and
// re-evaluation is lazy on read.
//
//     use propcell::{bind, Property};
//
//     let width = Property::new(4);
//     let height = Property::new(5);
//     let area = Property::new(0);
//     let (w, h) = (width.clone(), height.clone());
//     area.set_binding(bind(move || w.value() * h.value()));
//
//     assert_eq!(area.value(), 20);
//     width.set_value(10);
//     assert_eq!(area.value(), 50);
//
// The engine is single-threaded: cells belong to the thread that created
// them, and the evaluation context is thread-local.
// ============================================================================

pub mod core;
pub mod primitives;
pub mod reactivity;

// Re-export the engine surface at the crate root.
pub use crate::core::context::{current_binding, is_evaluating, with_context, EvaluationContext};
pub use crate::core::error::{BindingError, BindingErrorKind};
pub use crate::core::location::SourceLocation;
pub use crate::core::types::{
    default_equals, AnyCell, CellCore, CellData, EqualsFn, HandlerInner, Observable, Observer,
};
pub use crate::reactivity::binding::{BindingData, BindingEvalFn, UntypedBinding};
pub use crate::reactivity::equality::{
    always_equals, equals, never_equals, safe_equals_f32, safe_equals_f64,
};
pub use crate::reactivity::notify::notify_observers;
pub use crate::reactivity::tracking::register_read;

// Re-export the facades.
pub use crate::primitives::alias::Alias;
pub use crate::primitives::bind::{bind, bind_fallible, bind_with_equals, Binding};
pub use crate::primitives::handler::ChangeHandler;
pub use crate::primitives::notified::NotifiedProperty;
pub use crate::primitives::property::Property;

// =============================================================================
// TESTS
// =============================================================================
