//! Per-process state
//!
//! A guest process gets one [`ProcessState`] when its first thread calls in.
//! The first worker to start initializes every API for the process; the
//! worker of the last thread to exit finalizes them.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::{Api, ApiPs, ProcessEnv};
use crate::config::YaglConfig;
use crate::driver::HostDrivers;
use crate::mem::GuestMemory;
use crate::types::{Pid, Tid};

pub struct ProcessState {
    env: Arc<ProcessEnv>,
    apis: Vec<Arc<dyn Api>>,
    api_ps: Mutex<Vec<Arc<dyn ApiPs>>>,
    initialized: Mutex<bool>,
    threads: Mutex<Vec<Tid>>,
}

impl ProcessState {
    pub fn new(
        pid: Pid,
        config: Arc<YaglConfig>,
        drivers: HostDrivers,
        mem: Arc<dyn GuestMemory>,
        apis: Vec<Arc<dyn Api>>,
    ) -> Arc<ProcessState> {
        log::info!("yagl: process {} created", pid);

        Arc::new(ProcessState {
            env: Arc::new(ProcessEnv::new(pid, config, drivers, mem)),
            apis,
            api_ps: Mutex::new(Vec::new()),
            initialized: Mutex::new(false),
            threads: Mutex::new(Vec::new()),
        })
    }

    pub fn pid(&self) -> Pid {
        self.env.pid
    }

    pub fn env(&self) -> &Arc<ProcessEnv> {
        &self.env
    }

    /// Per-process API states, created by the first caller
    pub fn init_apis(&self) -> Vec<Arc<dyn ApiPs>> {
        let mut initialized = self.initialized.lock();
        if !*initialized {
            let api_ps: Vec<_> = self
                .apis
                .iter()
                .map(|api| api.process_init(&self.env))
                .collect();
            *self.api_ps.lock() = api_ps;
            *initialized = true;
        }
        self.api_ps.lock().clone()
    }

    pub fn add_thread(&self, tid: Tid) {
        self.threads.lock().push(tid);
    }

    /// Forget `tid`, returns whether it was the last thread
    pub fn remove_thread(&self, tid: Tid) -> bool {
        let mut threads = self.threads.lock();
        threads.retain(|&t| t != tid);
        threads.is_empty()
    }

    pub fn num_threads(&self) -> usize {
        self.threads.lock().len()
    }

    /// Finalize every API, the last thread is gone
    pub fn fini(&self) {
        let api_ps = core::mem::take(&mut *self.api_ps.lock());
        for ps in &api_ps {
            ps.fini();
        }
        drop(api_ps);

        self.env.clear_egl();
        self.env.clear_clients();

        log::info!("yagl: process {} destroyed", self.pid());
    }
}
