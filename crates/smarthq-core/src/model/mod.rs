// ── Domain model ──
//
// Canonical representations of what the event stream describes. The
// registry owns every instance; consumers get `Arc` snapshots.

pub mod device;
pub mod service;

pub use device::Device;
pub use service::{Service, ServiceType};
