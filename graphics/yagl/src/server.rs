//! Server entry points
//!
//! The device model forwards the four guest requests (init, update, batch,
//! exit) here. The server keeps the process and thread tables and routes
//! each request to the worker of the guest thread.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::Api;
use crate::config::YaglConfig;
use crate::driver::HostDrivers;
use crate::egl::EglApi;
use crate::gles1::Gles1Api;
use crate::gles2::Gles2Api;
use crate::mem::{GuestMemory, PageSet};
use crate::process::ProcessState;
use crate::thread::ThreadState;
use crate::types::{GuestPhysAddr, Pid, Tid};
use crate::{Error, Result, YAGL_VERSION};

pub use crate::thread::BatchStatus;

#[derive(Default)]
struct Tables {
    processes: BTreeMap<Pid, Arc<ProcessState>>,
    threads: BTreeMap<(Pid, Tid), Arc<ThreadState>>,
    // Threads whose worker is being spawned
    starting: BTreeSet<(Pid, Tid)>,
}

pub struct ServerState {
    config: Arc<YaglConfig>,
    mem: Arc<dyn GuestMemory>,
    drivers: HostDrivers,
    apis: Vec<Arc<dyn Api>>,
    tables: Mutex<Tables>,
}

impl ServerState {
    pub fn new(config: YaglConfig, mem: Arc<dyn GuestMemory>, drivers: HostDrivers) -> Self {
        log::info!(
            "yagl: server created, {:?} rendering, {:?} backend",
            config.render_type,
            config.backend
        );

        Self {
            config: Arc::new(config),
            mem,
            drivers,
            apis: vec![Arc::new(EglApi), Arc::new(Gles1Api), Arc::new(Gles2Api)],
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Server using the host drivers named by `config.backend`
    pub fn with_backend(config: YaglConfig, mem: Arc<dyn GuestMemory>) -> Self {
        let drivers = HostDrivers::for_backend(config.backend);
        Self::new(config, mem, drivers)
    }

    pub fn config(&self) -> &YaglConfig {
        &self.config
    }

    pub fn num_processes(&self) -> usize {
        self.tables.lock().processes.len()
    }

    pub fn num_threads(&self) -> usize {
        self.tables.lock().threads.len()
    }

    fn thread(&self, pid: Pid, tid: Tid) -> Result<Arc<ThreadState>> {
        self.tables
            .lock()
            .threads
            .get(&(pid, tid))
            .cloned()
            .ok_or(Error::ThreadNotFound { pid, tid })
    }

    /// Start serving guest thread `pid`/`tid`, returns the render type word
    pub fn dispatch_init(&self, version: u32, pid: Pid, tid: Tid) -> Result<u32> {
        if version != YAGL_VERSION {
            log::error!(
                "yagl: version mismatch, guest {} host {}",
                version,
                YAGL_VERSION
            );
            return Err(Error::VersionMismatch {
                guest: version,
                host: YAGL_VERSION,
            });
        }

        let process = self.begin_init(pid, tid)?;
        let spawned = ThreadState::spawn(process.clone(), tid);
        self.finish_init(process, pid, tid, spawned)
    }

    /// Reserve `pid`/`tid` and register it with its process
    fn begin_init(&self, pid: Pid, tid: Tid) -> Result<Arc<ProcessState>> {
        let mut tables = self.tables.lock();
        if tables.threads.contains_key(&(pid, tid)) || tables.starting.contains(&(pid, tid)) {
            log::error!("yagl: thread {}/{} already initialized", pid, tid);
            return Err(Error::ThreadExists { pid, tid });
        }

        let process = match tables.processes.get(&pid) {
            Some(process) => process.clone(),
            None => {
                let process = ProcessState::new(
                    pid,
                    self.config.clone(),
                    self.drivers.clone(),
                    self.mem.clone(),
                    self.apis.clone(),
                );
                tables.processes.insert(pid, process.clone());
                process
            }
        };

        process.add_thread(tid);
        tables.starting.insert((pid, tid));
        Ok(process)
    }

    /// Publish the spawned worker, or undo `begin_init`
    fn finish_init(
        &self,
        process: Arc<ProcessState>,
        pid: Pid,
        tid: Tid,
        spawned: Result<Arc<ThreadState>>,
    ) -> Result<u32> {
        let mut tables = self.tables.lock();
        let reserved = tables.starting.remove(&(pid, tid));

        match spawned {
            Ok(thread) if reserved => {
                tables.threads.insert((pid, tid), thread);
                Ok(self.config.render_type.wire_value())
            }
            Ok(thread) => {
                // Reset while the worker was starting
                drop(tables);
                log::warn!("yagl: thread {}/{} reset during init", pid, tid);
                thread.exit(process.remove_thread(tid));
                Err(Error::ThreadNotFound { pid, tid })
            }
            Err(e) => {
                log::error!("yagl: thread {}/{}: {}", pid, tid, e);
                if process.remove_thread(tid) {
                    if tables
                        .processes
                        .get(&pid)
                        .map_or(false, |p| Arc::ptr_eq(p, &process))
                    {
                        tables.processes.remove(&pid);
                    }
                    drop(tables);
                    process.fini();
                }
                Err(e)
            }
        }
    }

    /// Map a new call buffer for `pid`/`tid`
    pub fn dispatch_update(&self, pid: Pid, tid: Tid, pages: &[GuestPhysAddr]) -> Result<()> {
        let thread = self.thread(pid, tid)?;
        let pages = PageSet::map(self.mem.clone(), pages)?;
        thread.update(pages)
    }

    /// Run the batch at byte `offset` of the call buffer of `pid`/`tid`
    pub fn dispatch_batch(&self, pid: Pid, tid: Tid, offset: usize) -> Result<BatchStatus> {
        let thread = self.thread(pid, tid)?;
        thread.batch(offset)
    }

    /// Stop serving `pid`/`tid`; the process goes with its last thread
    pub fn dispatch_exit(&self, pid: Pid, tid: Tid) {
        let (thread, last) = {
            let mut tables = self.tables.lock();
            let thread = match tables.threads.remove(&(pid, tid)) {
                Some(thread) => thread,
                None => {
                    log::warn!("yagl: exit of unknown thread {}/{}", pid, tid);
                    return;
                }
            };
            let last = tables
                .processes
                .get(&pid)
                .map_or(true, |process| process.remove_thread(tid));
            if last {
                tables.processes.remove(&pid);
            }
            (thread, last)
        };

        thread.exit(last);
    }

    /// Tear down every thread and process
    pub fn reset(&self) {
        let tables = core::mem::take(&mut *self.tables.lock());
        if tables.threads.is_empty() {
            return;
        }

        log::info!(
            "yagl: reset, {} processes, {} threads",
            tables.processes.len(),
            tables.threads.len()
        );

        for ((pid, tid), thread) in tables.threads {
            let last = tables
                .processes
                .get(&pid)
                .map_or(true, |process| process.remove_thread(tid));
            thread.exit(last);
        }
    }
}

impl Drop for ServerState {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiId;
    use crate::config::RenderType;
    use crate::driver::HeadlessDriver;
    use crate::egl::calls::{func, NUM_FUNCS as NUM_EGL_FUNCS};
    use crate::egl::consts::*;
    use crate::testutil::{BatchWriter, SimMemory};
    use crate::transport::{CALL_RESULT_OK, CALL_RESULT_RETRY};

    const BATCH_PA: u64 = 0x80000;

    fn server(sim: &Arc<SimMemory>) -> (Arc<HeadlessDriver>, ServerState) {
        let driver = Arc::new(HeadlessDriver::new());
        let server = ServerState::new(
            YaglConfig::default(),
            sim.clone(),
            HostDrivers::from_driver(driver.clone()),
        );
        (driver, server)
    }

    fn submit(sim: &SimMemory, server: &ServerState, pid: Pid, tid: Tid, w: &BatchWriter) -> Result<BatchStatus> {
        let pages = sim.load_batch(BATCH_PA, w.bytes());
        server.dispatch_update(pid, tid, &pages)?;
        server.dispatch_batch(pid, tid, 0)
    }

    #[test]
    fn test_version_mismatch() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        assert_eq!(
            server.dispatch_init(YAGL_VERSION + 1, 1, 1),
            Err(Error::VersionMismatch {
                guest: YAGL_VERSION + 1,
                host: YAGL_VERSION
            })
        );
        assert_eq!(server.num_processes(), 0);
        assert_eq!(server.num_threads(), 0);
    }

    #[test]
    fn test_init_and_double_init() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        assert_eq!(
            server.dispatch_init(YAGL_VERSION, 1, 1),
            Ok(RenderType::Offscreen.wire_value())
        );
        assert_eq!(
            server.dispatch_init(YAGL_VERSION, 1, 1),
            Err(Error::ThreadExists { pid: 1, tid: 1 })
        );
        assert_eq!(server.num_threads(), 1);
    }

    #[test]
    fn test_init_in_progress() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        server.begin_init(1, 1).unwrap();

        assert_eq!(
            server.dispatch_init(YAGL_VERSION, 1, 1),
            Err(Error::ThreadExists { pid: 1, tid: 1 })
        );
        // Other threads are not held up
        assert_eq!(
            server.dispatch_init(YAGL_VERSION, 1, 2),
            Ok(RenderType::Offscreen.wire_value())
        );
        assert_eq!(
            server.dispatch_batch(1, 1, 0),
            Err(Error::ThreadNotFound { pid: 1, tid: 1 })
        );
        assert_eq!(server.num_threads(), 1);
        assert_eq!(server.num_processes(), 1);
    }

    #[test]
    fn test_reset_during_init() {
        let sim = SimMemory::new();
        let (driver, server) = server(&sim);
        let process = server.begin_init(1, 1).unwrap();
        let spawned = ThreadState::spawn(process.clone(), 1);

        server.reset();
        assert_eq!(
            server.finish_init(process.clone(), 1, 1, spawned),
            Err(Error::ThreadNotFound { pid: 1, tid: 1 })
        );
        assert_eq!(server.num_threads(), 0);
        assert_eq!(server.num_processes(), 0);
        assert_eq!(process.num_threads(), 0);
        assert!(process.env().egl_iface().is_none());
        assert_eq!(driver.num_contexts(), 0);

        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();
        assert_eq!(server.num_threads(), 1);
    }

    #[test]
    fn test_onscreen_render_type() {
        let sim = SimMemory::new();
        let config = YaglConfig {
            render_type: RenderType::Onscreen,
            ..YaglConfig::default()
        };
        let server = ServerState::new(config, sim.clone(), HostDrivers::headless());
        assert_eq!(server.dispatch_init(YAGL_VERSION, 4, 4), Ok(2));
    }

    #[test]
    fn test_unknown_thread() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        assert_eq!(
            server.dispatch_batch(1, 1, 0),
            Err(Error::ThreadNotFound { pid: 1, tid: 1 })
        );
        assert_eq!(
            server.dispatch_update(1, 1, &[BATCH_PA]),
            Err(Error::ThreadNotFound { pid: 1, tid: 1 })
        );
        // Ignored
        server.dispatch_exit(1, 1);
    }

    #[test]
    fn test_unmappable_call_buffer() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();
        assert_eq!(
            server.dispatch_update(1, 1, &[SimMemory::UNMAPPABLE_PA]),
            Err(Error::GuestMemoryFault(SimMemory::UNMAPPABLE_PA))
        );
    }

    #[test]
    fn test_batch() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();

        let mut w = BatchWriter::new();
        let res = w.call(ApiId::Egl as u32, func::GET_DISPLAY, false);
        w.u32(0);
        let dpy_at = w.in_arg();
        w.end();

        assert_eq!(
            submit(&sim, &server, 1, 1, &w),
            Ok(BatchStatus::Complete {
                bytes: w.bytes().len()
            })
        );
        assert_eq!(sim.phys_u32(BATCH_PA + res as u64), CALL_RESULT_OK);
        assert_ne!(sim.phys_u32(BATCH_PA + dpy_at as u64), 0);
    }

    #[test]
    fn test_bad_api_is_protocol_error() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();

        let mut w = BatchWriter::new();
        w.call(7, 1, false);
        w.end();
        assert!(matches!(submit(&sim, &server, 1, 1, &w), Err(Error::Protocol(_))));

        let mut w = BatchWriter::new();
        w.call(ApiId::Egl as u32, NUM_EGL_FUNCS + 1, false);
        w.end();
        assert!(matches!(submit(&sim, &server, 1, 1, &w), Err(Error::Protocol(_))));

        // The thread survives a bad batch
        let mut w = BatchWriter::new();
        w.call(ApiId::Egl as u32, func::GET_ERROR, false);
        w.in_arg();
        w.end();
        assert!(matches!(submit(&sim, &server, 1, 1, &w), Ok(BatchStatus::Complete { .. })));
    }

    #[test]
    fn test_retry_on_missing_page() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();

        let mut w = BatchWriter::new();
        let res = w.call(ApiId::Egl as u32, func::CHOOSE_CONFIG, true);
        w.u32(1);
        w.out_direct(0x7000_0000, 3);
        w.in_null();
        w.in_arg_null();
        w.in_arg();
        w.end();

        assert_eq!(submit(&sim, &server, 1, 1, &w), Ok(BatchStatus::Retry));
        assert_eq!(sim.phys_u32(BATCH_PA + res as u64), CALL_RESULT_RETRY);

        // Resubmitted once the page is resident
        sim.map_virt(0x7000_0000, 0x200000);
        let none = [EGL_NONE, 0, 0];
        let raw: Vec<u8> = none.iter().flat_map(|v| v.to_le_bytes()).collect();
        sim.write_virt(0x7000_0000, &raw).unwrap();
        assert!(matches!(
            server.dispatch_batch(1, 1, 0),
            Ok(BatchStatus::Complete { .. })
        ));
        assert_eq!(sim.phys_u32(BATCH_PA + res as u64), CALL_RESULT_OK);
    }

    #[test]
    fn test_threads_share_process() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();
        server.dispatch_init(YAGL_VERSION, 1, 2).unwrap();
        server.dispatch_init(YAGL_VERSION, 2, 1).unwrap();
        assert_eq!(server.num_processes(), 2);
        assert_eq!(server.num_threads(), 3);

        server.dispatch_exit(1, 1);
        assert_eq!(server.num_processes(), 2);
        server.dispatch_exit(1, 2);
        assert_eq!(server.num_processes(), 1);
        assert_eq!(server.num_threads(), 1);

        // Same ids may come back
        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();
        assert_eq!(server.num_processes(), 2);
    }

    #[test]
    fn test_exit_destroys_host_objects() {
        let sim = SimMemory::new();
        let (driver, server) = server(&sim);
        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();

        let mut w = BatchWriter::new();
        w.call(ApiId::Egl as u32, func::GET_DISPLAY, false);
        w.u32(0);
        w.in_arg();
        w.end();
        submit(&sim, &server, 1, 1, &w).unwrap();

        server.dispatch_exit(1, 1);
        assert_eq!(server.num_processes(), 0);
        assert_eq!(driver.num_contexts(), 0);
        assert_eq!(sim.live_mappings(), 0);
    }

    #[test]
    fn test_reset() {
        let sim = SimMemory::new();
        let (_driver, server) = server(&sim);
        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();
        server.dispatch_init(YAGL_VERSION, 1, 2).unwrap();
        server.dispatch_init(YAGL_VERSION, 3, 1).unwrap();

        server.reset();
        assert_eq!(server.num_processes(), 0);
        assert_eq!(server.num_threads(), 0);
        assert_eq!(
            server.dispatch_batch(1, 1, 0),
            Err(Error::ThreadNotFound { pid: 1, tid: 1 })
        );

        server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();
        assert_eq!(server.num_threads(), 1);
    }
}
