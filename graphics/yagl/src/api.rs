//! API registration and per-call dispatch
//!
//! Each API (EGL, GLES1, GLES2) creates one [`ApiPs`] per guest process and
//! one [`ApiTs`] per guest thread. The worker routes every decoded call to
//! the thread state of the API named in the call header.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::client::{ClientApi, ClientImage, ClientInterface, SharedClientContext};
use crate::config::YaglConfig;
use crate::driver::HostDrivers;
use crate::mem::GuestMemory;
use crate::transport::Transport;
use crate::types::{HostHandle, Pid, Tid};

/// Wire identifiers of the APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiId {
    Egl = 1,
    Gles1 = 2,
    Gles2 = 3,
}

pub const NUM_APIS: usize = 3;

impl ApiId {
    pub fn from_wire(id: u32) -> Option<ApiId> {
        match id {
            1 => Some(ApiId::Egl),
            2 => Some(ApiId::Gles1),
            3 => Some(ApiId::Gles2),
            _ => None,
        }
    }

    /// Slot in per-process API tables
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

/// Why a call did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// A guest page was missing; the result slot already says retry
    Retry,
    /// The call buffer is malformed; the batch is abandoned
    Protocol(String),
}

impl core::fmt::Display for CallError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CallError::Retry => write!(f, "retry requested"),
            CallError::Protocol(msg) => write!(f, "protocol error: {}", msg),
        }
    }
}

pub type CallResult = Result<(), CallError>;

/// Everything a call handler may touch on the worker thread
pub struct ThreadContext {
    pub pid: Pid,
    pub tid: Tid,
    pub transport: Transport,
    /// Client context current on this thread, maintained by EGL
    pub current: Option<SharedClientContext>,
}

impl ThreadContext {
    pub fn new(pid: Pid, tid: Tid, transport: Transport) -> Self {
        Self {
            pid,
            tid,
            transport,
            current: None,
        }
    }
}

/// Services shared by the APIs of one guest process
pub struct ProcessEnv {
    pub pid: Pid,
    pub config: Arc<YaglConfig>,
    pub drivers: HostDrivers,
    pub mem: Arc<dyn GuestMemory>,
    client_ifaces: RwLock<Vec<Arc<dyn ClientInterface>>>,
    egl_iface: RwLock<Option<Arc<dyn EglInterface>>>,
}

/// What GL client APIs may ask of EGL
pub trait EglInterface: Send + Sync {
    /// Client image behind the EGLImage `handle` of this process
    fn get_image(&self, handle: HostHandle) -> Option<Arc<dyn ClientImage>>;
}

impl ProcessEnv {
    pub fn new(
        pid: Pid,
        config: Arc<YaglConfig>,
        drivers: HostDrivers,
        mem: Arc<dyn GuestMemory>,
    ) -> Self {
        Self {
            pid,
            config,
            drivers,
            mem,
            client_ifaces: RwLock::new(Vec::new()),
            egl_iface: RwLock::new(None),
        }
    }

    /// Make a client API available to EGL context creation
    pub fn register_client(&self, iface: Arc<dyn ClientInterface>) {
        let mut ifaces = self.client_ifaces.write();
        ifaces.retain(|i| i.client_api() != iface.client_api());
        ifaces.push(iface);
    }

    pub fn client_iface(&self, api: ClientApi) -> Option<Arc<dyn ClientInterface>> {
        self.client_ifaces
            .read()
            .iter()
            .find(|i| i.client_api() == api)
            .cloned()
    }

    pub fn clear_clients(&self) {
        self.client_ifaces.write().clear();
    }

    pub fn register_egl(&self, iface: Arc<dyn EglInterface>) {
        *self.egl_iface.write() = Some(iface);
    }

    pub fn egl_iface(&self) -> Option<Arc<dyn EglInterface>> {
        self.egl_iface.read().clone()
    }

    pub fn clear_egl(&self) {
        self.egl_iface.write().take();
    }
}

/// Factory for per-process state
pub trait Api: Send + Sync {
    fn id(&self) -> ApiId;

    fn process_init(&self, env: &Arc<ProcessEnv>) -> Arc<dyn ApiPs>;
}

/// Per-process API state
pub trait ApiPs: Send + Sync {
    fn id(&self) -> ApiId;

    /// Runs on the new thread's worker
    fn thread_init(self: Arc<Self>, tc: &mut ThreadContext) -> Box<dyn ApiTs>;

    /// Last thread of the process is gone
    fn fini(&self);
}

/// Per-thread API state, lives on the worker
pub trait ApiTs {
    /// Execute `func_id`; unknown ids are protocol errors
    fn call(&mut self, func_id: u32, tc: &mut ThreadContext) -> CallResult;

    fn thread_fini(&mut self, tc: &mut ThreadContext);
}

/// Build the protocol error for an unknown function id
pub fn bad_func(api: ApiId, func_id: u32) -> CallError {
    CallError::Protocol(format!("bad function call (api = {:?}, func = {})", api, func_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_ids() {
        assert_eq!(ApiId::from_wire(0), None);
        assert_eq!(ApiId::from_wire(1), Some(ApiId::Egl));
        assert_eq!(ApiId::from_wire(3).map(ApiId::index), Some(2));
        assert_eq!(ApiId::from_wire(4), None);
    }
}
