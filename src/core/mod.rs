// ============================================================================
// propcell - Core
// Engine state: cells, evaluation context, errors, source locations
// ============================================================================

pub mod context;
pub mod error;
pub mod location;
pub mod types;
