//! Shared plumbing for the GPUQ workspace.

pub mod logging;
