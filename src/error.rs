//! Error types for the dispatch orchestrator.
//!
//! This module declares focused, composable error types used across buffer
//! management, kernel resolution, and frame execution. Each error carries
//! enough context to make failures actionable while remaining small and cheap
//! to pass around or convert into the aggregate [`EngineError`].
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode (e.g.
//!   stale buffer handles, absent kernel entry points, device loss).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into [`EngineError`].
//! * **Actionability:** Structured fields (offending label, requested vs.
//!   available sizes, the list of known entry points) make failures
//!   diagnosable without reproducing the run.
//!
//! ## Propagation policy
//! Everything here is a *startup or programmer error*: a missing kernel, a
//! misused buffer handle, or a device failure indicates a corrupt program
//! image or driver fault, not a runtime condition. Callers abort
//! initialization (or the tick) with `?`; nothing is retried. Per-tick
//! capacity saturation is deliberately **not** an error — appends clamp on
//! the device and the scheduler surfaces saturation through its frame report.

use std::fmt;

/// Convenient result alias used across the crate.
pub type EngineResult<T> = Result<T, EngineError>;

/// Returned when a buffer handle is misused: freed twice, presented to the
/// wrong registry, or used with a host array whose length does not match the
/// buffer's declared capacity.
///
/// ## Context
/// Buffer handles are typed and non-`Copy`, so most misuse is already
/// unrepresentable; the remaining cases (stale slots after a free, length
/// mismatches on transfer) fail loudly here rather than corrupting device
/// memory.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The handle's slot no longer holds a live buffer.
    StaleHandle {
        /// Label the buffer was allocated under.
        label: &'static str,
    },

    /// A host-side transfer array did not match the buffer's element count.
    LengthMismatch {
        /// Label of the buffer involved in the transfer.
        label: &'static str,

        /// Element count the buffer was allocated with.
        expected: usize,

        /// Element count of the host array presented by the caller.
        actual: usize,
    },

    /// The operation requires a usage tag the buffer was not allocated with.
    UsageMismatch {
        /// Label of the offending buffer.
        label: &'static str,

        /// The usage the operation required.
        required: &'static str,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::StaleHandle { label } => {
                write!(f, "buffer '{label}' is no longer live (freed or never allocated)")
            }
            ResourceError::LengthMismatch { label, expected, actual } => {
                write!(
                    f,
                    "buffer '{label}' transfer length mismatch ({expected} elements expected; {actual} given)"
                )
            }
            ResourceError::UsageMismatch { label, required } => {
                write!(f, "buffer '{label}' lacks required usage '{required}'")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// Returned when a named compute entry point is absent from the compiled
/// program.
///
/// ## Context
/// Kernel resolution happens once at startup; a miss indicates a
/// build/packaging mismatch between the orchestrator and its compute program
/// and is fatal. The error carries every entry point the program *does*
/// expose so the mismatch is obvious from the message alone.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelNotFoundError {
    /// The entry point that was requested.
    pub name: String,

    /// Entry points actually present in the program.
    pub available: Vec<String>,
}

impl fmt::Display for KernelNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "kernel '{}' not found in compute program (available: {})",
            self.name,
            self.available.join(", ")
        )
    }
}

impl std::error::Error for KernelNotFoundError {}

/// Returned when the GPU device, queue, or shader front-end fails.
///
/// ## Context
/// Covers adapter/device acquisition, WGSL parse failures, and poll/map
/// failures during readback. All of these are fatal to the simulation; the
/// message preserves the underlying driver or front-end diagnostic.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    /// Human-readable diagnostic from the failing layer.
    pub message: String,
}

impl DeviceError {
    /// Wraps a lower-level failure into a `DeviceError`.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device failure: {}", self.message)
    }
}

impl std::error::Error for DeviceError {}

/// Aggregate error for every fallible orchestrator operation.
///
/// Low-level modules return the dedicated types above; orchestration code
/// uses `?` to bubble them into `EngineError`, which callers can match on or
/// log with user-readable messages.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Buffer allocation, transfer, or free misuse.
    Resource(ResourceError),

    /// A named kernel entry point was absent at startup.
    KernelNotFound(KernelNotFoundError),

    /// The GPU device or shader front-end failed.
    Device(DeviceError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Resource(e) => e.fmt(f),
            EngineError::KernelNotFound(e) => e.fmt(f),
            EngineError::Device(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Resource(e) => Some(e),
            EngineError::KernelNotFound(e) => Some(e),
            EngineError::Device(e) => Some(e),
        }
    }
}

impl From<ResourceError> for EngineError {
    fn from(e: ResourceError) -> Self {
        EngineError::Resource(e)
    }
}

impl From<KernelNotFoundError> for EngineError {
    fn from(e: KernelNotFoundError) -> Self {
        EngineError::KernelNotFound(e)
    }
}

impl From<DeviceError> for EngineError {
    fn from(e: DeviceError) -> Self {
        EngineError::Device(e)
    }
}
