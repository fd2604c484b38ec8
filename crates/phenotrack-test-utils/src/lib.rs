//! Testing utilities for the phenotrack workspace
//!
//! In-memory fakes for the remote graph service and the remote filesystem,
//! plus tray-scan fixtures.

#![allow(missing_docs)]

mod fixtures;
mod gateway;
mod transport;

pub use fixtures::{scan_headers, ScanRow, EXAMPLE_EXPERIMENT, EXAMPLE_PROJECT};
pub use gateway::MemoryGateway;
pub use transport::{MemoryTransport, TransportOps};
