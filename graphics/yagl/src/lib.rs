//! YaGL host (Yet another GL)
//!
//! This crate implements the host half of an OpenGL ES 1.1 / 2.0 and EGL 1.4
//! passthrough for emulated guests. Guest driver stubs pack GL/EGL calls into
//! shared pages; the host decodes them, shadows the guest-visible object model
//! and replays the calls against a host GL/EGL driver.
//!
//! # Architecture
//!
//! ```text
//!   guest stub ──► shared pages ──► ServerState::dispatch_batch(pid, tid, offset)
//!                                          │
//!                                          ▼
//!                          ThreadState (one worker per guest pid/tid)
//!                                          │ call_event / call_processed_event
//!                                          ▼
//!                             Transport (decode slots, arrays, retry)
//!                                          │
//!                       ┌──────────────────┼──────────────────┐
//!                       ▼                  ▼                  ▼
//!                     EGL               GLES1              GLES2
//!            displays/surfaces    arrays, palette,    shaders, programs,
//!             contexts/images     point-size emul.   precision stripping
//!                       │                  │                  │
//!                       └──────────► host driver traits ◄─────┘
//! ```
//!
//! - Objects shared between contexts live in a [`object::Sharegroup`].
//! - EGL entities are host-handle resources kept in per-display lists.
//! - Guest memory is reached through the [`mem::GuestMemory`] capability.
//!
//! # Usage
//!
//! ```ignore
//! use yagl::{ServerState, YaglConfig, driver::HostDrivers};
//!
//! let config = YaglConfig::load("/etc/yagl.toml")?;
//! let server = ServerState::new(config, guest_memory, HostDrivers::headless());
//!
//! server.dispatch_init(yagl::YAGL_VERSION, pid, tid)?;
//! server.dispatch_update(pid, tid, &page_addresses)?;
//! server.dispatch_batch(pid, tid, 0)?;
//! server.dispatch_exit(pid, tid);
//! ```

/// Per-call tracing, emitted only with the `debug-logging` feature
macro_rules! call_trace {
    ($($arg:tt)*) => {
        if cfg!(feature = "debug-logging") {
            log::trace!($($arg)*);
        }
    };
}

pub mod api;
pub mod client;
pub mod config;
pub mod driver;
pub mod egl;
pub mod event;
pub mod gl;
pub mod gles;
pub mod gles1;
pub mod gles2;
pub mod mem;
pub mod object;
pub mod process;
pub mod range_list;
pub mod server;
pub mod thread;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports
pub use api::{ApiId, CallError, CallResult};
pub use client::{ClientApi, ClientContext};
pub use config::{DirectTransferMode, HostBackend, PrecisionMode, RenderType, YaglConfig};
pub use object::{AddNamed, Namespace, NamespaceKind, Object, ObjectHeader, Sharegroup};
pub use range_list::RangeList;
pub use server::{BatchStatus, ServerState};
pub use transport::Transport;
pub use types::*;

/// Protocol version; the guest must present exactly this value at init
pub const YAGL_VERSION: u32 = 17;

/// Size of a guest page as seen by the transport
pub const PAGE_SIZE: usize = 4096;

/// Every scalar argument occupies one slot of this many bytes
pub const SLOT_SIZE: usize = 8;

/// Maximum number of in-arrays (host writes) per call
pub const MAX_IN_ARRAYS: usize = 8;

/// Maximum number of out-arrays (guest writes) per call
pub const MAX_OUT_ARRAYS: usize = 8;

/// Largest host staging buffer one call may size from guest arguments
pub const MAX_STAGING_SIZE: usize = 256 << 20;

static_assertions::const_assert_eq!(PAGE_SIZE % SLOT_SIZE, 0);
static_assertions::const_assert!(SLOT_SIZE >= core::mem::size_of::<u32>());

/// Result type for YaGL server operations
pub type Result<T> = core::result::Result<T, Error>;

/// YaGL error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Guest and host disagree on the protocol version
    VersionMismatch { guest: u32, host: u32 },
    /// No state exists for this guest process/thread
    ThreadNotFound { pid: Pid, tid: Tid },
    /// The thread was already initialized
    ThreadExists { pid: Pid, tid: Tid },
    /// Guest sent something the protocol does not allow
    Protocol(String),
    /// A guest page could not be translated or mapped
    GuestMemoryFault(u64),
    /// The host driver refused an operation
    HostDriver(String),
    /// The worker thread could not be started
    ThreadSpawn(String),
    /// Configuration could not be parsed
    Config(String),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::VersionMismatch { guest, host } => {
                write!(f, "Version mismatch: guest {}, host {}", guest, host)
            }
            Error::ThreadNotFound { pid, tid } => write!(f, "Thread {}/{} not found", pid, tid),
            Error::ThreadExists { pid, tid } => {
                write!(f, "Thread {}/{} already initialized", pid, tid)
            }
            Error::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            Error::GuestMemoryFault(addr) => write!(f, "Guest memory fault at 0x{:X}", addr),
            Error::HostDriver(msg) => write!(f, "Host driver error: {}", msg),
            Error::ThreadSpawn(msg) => write!(f, "Cannot spawn worker: {}", msg),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
