//! CLI command implementations
//!
//! Commands are generic over `rads_core::platform::Platform`, so the same
//! code drives real hardware and the simulated converter.

pub mod capture;
