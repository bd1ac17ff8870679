// ── Device/service registry ──
//
// Concurrent entity storage with push-based change notification.
// Mutated only from the dispatch path; read from anywhere.

mod apply;
mod collection;
mod registry;

pub use apply::Upsert;
pub use registry::Registry;
