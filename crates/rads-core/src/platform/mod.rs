//! Host platform abstractions
//!
//! This module contains the traits the acquisition driver is generic over.

mod traits;

pub use traits::{DataReadyLine, FrameTransport, Level, Platform, SyncLine};
