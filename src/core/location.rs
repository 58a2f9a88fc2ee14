// ============================================================================
// propcell - Source Locations
// Diagnostic metadata attached to bindings at creation time
// ============================================================================

use std::fmt;
use std::panic::Location;

/// Where a binding was created, for diagnostics only.
///
/// Captured automatically by the `#[track_caller]` binding constructors, or
/// explicitly via the [`source_location!`](crate::source_location) macro.
/// The engine never branches on this data; it only surfaces in `Debug`
/// output and error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub file: &'static str,
    pub module: &'static str,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Capture the location of the caller.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    /// True if this location carries no information.
    pub fn is_empty(&self) -> bool {
        self.file.is_empty() && self.line == 0
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            // The panic location API does not expose the enclosing item.
            module: "",
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "<unknown location>")
        } else if self.module.is_empty() {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        } else {
            write!(f, "{} ({}:{}:{})", self.module, self.file, self.line, self.column)
        }
    }
}

/// Capture the current source location, including the enclosing module path.
///
/// # Example
///
/// ```
/// use propcell::source_location;
///
/// let here = source_location!();
/// assert!(here.file.ends_with(".rs"));
/// ```
#[macro_export]
macro_rules! source_location {
    () => {
        $crate::SourceLocation {
            file: file!(),
            module: module_path!(),
            line: line!(),
            column: column!(),
        }
    };
}

// =============================================================================
// TESTS
// =============================================================================
