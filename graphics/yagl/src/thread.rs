//! Per-thread worker
//!
//! Every guest thread is served by its own host thread. The dispatcher hands
//! the worker one request at a time through `call_event` and blocks on
//! `call_processed_event` until the worker is done with it, so at most one
//! batch is in flight per guest thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::api::{ApiId, ApiTs, CallError, ThreadContext, NUM_APIS};
use crate::event::Event;
use crate::mem::PageSet;
use crate::process::ProcessState;
use crate::transport::Transport;
use crate::types::{Pid, Tid};
use crate::{Error, Result};

/// How far a batch got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every call ran, `bytes` of the call buffer were consumed
    Complete { bytes: usize },
    /// A call needs a guest page that is not resident; the guest resubmits
    /// from the call whose result slot says retry
    Retry,
}

enum Request {
    Update(PageSet),
    Batch(usize),
    Exit { last: bool },
}

struct Mailbox {
    call_event: Event,
    call_processed_event: Event,
    request: Mutex<Option<Request>>,
    reply: Mutex<Option<Result<BatchStatus>>>,
    exited: AtomicBool,
}

/// Signals the dispatcher when the worker leaves, normally or by panic
struct ExitGuard(Arc<Mailbox>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("yagl: worker panicked");
        }
        self.0.exited.store(true, Ordering::Release);
        self.0.call_processed_event.set();
    }
}

pub struct ThreadState {
    pid: Pid,
    tid: Tid,
    process: Arc<ProcessState>,
    mailbox: Arc<Mailbox>,
    dispatch: Mutex<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadState {
    /// Start the worker and wait until it has initialized every API
    pub fn spawn(process: Arc<ProcessState>, tid: Tid) -> Result<Arc<ThreadState>> {
        let pid = process.pid();
        let mailbox = Arc::new(Mailbox {
            call_event: Event::new(),
            call_processed_event: Event::new(),
            request: Mutex::new(None),
            reply: Mutex::new(None),
            exited: AtomicBool::new(false),
        });

        let worker_mailbox = mailbox.clone();
        let worker_process = process.clone();
        let handle = thread::Builder::new()
            .name(format!("yagl-{}-{}", pid, tid))
            .spawn(move || {
                let guard = ExitGuard(worker_mailbox);
                Worker::new(worker_process, tid).run(&guard.0);
            })
            .map_err(|e| Error::ThreadSpawn(e.to_string()))?;

        mailbox.call_processed_event.wait();
        if mailbox.exited.load(Ordering::Acquire) {
            let _ = handle.join();
            return Err(Error::ThreadSpawn(format!(
                "worker {}/{} failed to initialize",
                pid, tid
            )));
        }

        log::debug!("yagl: thread {}/{} started", pid, tid);

        Ok(Arc::new(ThreadState {
            pid,
            tid,
            process,
            mailbox,
            dispatch: Mutex::new(()),
            worker: Mutex::new(Some(handle)),
        }))
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn tid(&self) -> Tid {
        self.tid
    }

    /// Hand `request` to the worker and wait for it to be processed
    fn rendezvous(&self, request: Request) -> Result<Option<Result<BatchStatus>>> {
        let _dispatch = self.dispatch.lock();
        if self.mailbox.exited.load(Ordering::Acquire) {
            return Err(Error::ThreadNotFound {
                pid: self.pid,
                tid: self.tid,
            });
        }

        *self.mailbox.request.lock() = Some(request);
        self.mailbox.call_event.set();
        self.mailbox.call_processed_event.wait();

        Ok(self.mailbox.reply.lock().take())
    }

    /// Replace the call buffer
    pub fn update(&self, pages: PageSet) -> Result<()> {
        self.rendezvous(Request::Update(pages)).map(|_| ())
    }

    /// Run the batch at byte `offset` of the call buffer
    pub fn batch(&self, offset: usize) -> Result<BatchStatus> {
        match self.rendezvous(Request::Batch(offset))? {
            Some(reply) => reply,
            None => Err(Error::ThreadNotFound {
                pid: self.pid,
                tid: self.tid,
            }),
        }
    }

    /// Stop the worker; with `last` it also finalizes the process, here if
    /// the worker is already gone
    pub fn exit(&self, last: bool) {
        if self.rendezvous(Request::Exit { last }).is_err() {
            log::warn!("yagl: thread {}/{} already exited", self.pid, self.tid);
            if last {
                self.process.fini();
            }
        }

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                log::error!("yagl: thread {}/{} worker panicked", self.pid, self.tid);
            }
        }

        log::debug!("yagl: thread {}/{} destroyed", self.pid, self.tid);
    }
}

struct Worker {
    process: Arc<ProcessState>,
    tc: ThreadContext,
    api_ts: Vec<Option<Box<dyn ApiTs>>>,
}

impl Worker {
    fn new(process: Arc<ProcessState>, tid: Tid) -> Self {
        let env = process.env().clone();
        let transport = Transport::new(&env.config, env.mem.clone());
        let mut tc = ThreadContext::new(env.pid, tid, transport);

        let mut api_ts: Vec<Option<Box<dyn ApiTs>>> = (0..NUM_APIS).map(|_| None).collect();
        for ps in process.init_apis() {
            let index = ps.id().index();
            api_ts[index] = Some(ps.thread_init(&mut tc));
        }

        Self {
            process,
            tc,
            api_ts,
        }
    }

    fn run(mut self, mailbox: &Mailbox) {
        mailbox.call_processed_event.set();

        loop {
            mailbox.call_event.wait();

            let request = mailbox.request.lock().take();
            match request {
                Some(Request::Update(pages)) => {
                    log::debug!(
                        "yagl: thread {}/{} call buffer now {} pages",
                        self.tc.pid,
                        self.tc.tid,
                        pages.len()
                    );
                    self.tc.transport.set_pages(Some(pages));
                }
                Some(Request::Batch(offset)) => {
                    let status = self.batch(offset);
                    *mailbox.reply.lock() = Some(status);
                }
                Some(Request::Exit { last }) => {
                    self.fini(last);
                    return;
                }
                None => {}
            }

            mailbox.call_processed_event.set();
        }
    }

    fn batch(&mut self, offset: usize) -> Result<BatchStatus> {
        match self.process_calls(offset) {
            Ok(bytes) => Ok(BatchStatus::Complete { bytes }),
            Err(CallError::Retry) => {
                log::debug!("yagl: thread {}/{} batch needs retry", self.tc.pid, self.tc.tid);
                Ok(BatchStatus::Retry)
            }
            Err(CallError::Protocol(msg)) => {
                log::error!("yagl: thread {}/{}: {}", self.tc.pid, self.tc.tid, msg);
                Err(Error::Protocol(msg))
            }
        }
    }

    fn process_calls(&mut self, offset: usize) -> core::result::Result<usize, CallError> {
        let tc = &mut self.tc;
        tc.transport.begin(offset)?;

        while let Some((api_id, func_id)) = tc.transport.begin_call()? {
            let api_ts = ApiId::from_wire(api_id)
                .and_then(|api| self.api_ts[api.index()].as_mut())
                .ok_or_else(|| {
                    CallError::Protocol(format!("bad api call (api = {}, func = {})", api_id, func_id))
                })?;

            api_ts.call(func_id, tc)?;
            tc.transport.end_call()?;
        }

        Ok(tc.transport.bytes_processed())
    }

    fn fini(&mut self, last: bool) {
        for api_ts in self.api_ts.iter_mut() {
            if let Some(ts) = api_ts.as_mut() {
                ts.thread_fini(&mut self.tc);
            }
        }
        self.api_ts.clear();
        self.tc.current = None;
        self.tc.transport.set_pages(None);

        if last {
            self.process.fini();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Api;
    use crate::config::YaglConfig;
    use crate::driver::HostDrivers;
    use crate::egl::calls::func;
    use crate::egl::consts::*;
    use crate::egl::EglApi;
    use crate::mem::GuestMemory;
    use crate::testutil::{BatchWriter, SimMemory};
    use crate::transport::{CALL_RESULT_OK, CALL_RESULT_RETRY};

    const BATCH_PA: u64 = 0x80000;

    fn spawn(sim: &Arc<SimMemory>) -> Arc<ThreadState> {
        let apis: Vec<Arc<dyn Api>> = vec![Arc::new(EglApi)];
        let process = ProcessState::new(
            3,
            Arc::new(YaglConfig::default()),
            HostDrivers::headless(),
            sim.clone(),
            apis,
        );
        process.add_thread(9);
        ThreadState::spawn(process, 9).unwrap()
    }

    fn load(sim: &Arc<SimMemory>, thread: &ThreadState, w: &BatchWriter) {
        let mem: Arc<dyn GuestMemory> = sim.clone();
        let addrs = sim.load_batch(BATCH_PA, w.bytes());
        thread.update(PageSet::map(mem, &addrs).unwrap()).unwrap();
    }

    #[test]
    fn test_batch_round_trip() {
        let sim = SimMemory::new();
        let thread = spawn(&sim);
        assert_eq!(thread.pid(), 3);
        assert_eq!(thread.tid(), 9);

        let mut w = BatchWriter::new();
        let res = w.call(ApiId::Egl as u32, func::GET_ERROR, false);
        let error_at = w.in_arg();
        w.end();
        load(&sim, &thread, &w);

        assert_eq!(
            thread.batch(0),
            Ok(BatchStatus::Complete {
                bytes: w.bytes().len()
            })
        );
        assert_eq!(sim.phys_u32(BATCH_PA + res as u64), CALL_RESULT_OK);
        assert_eq!(sim.phys_u32(BATCH_PA + error_at as u64) as EGLint, EGL_SUCCESS);

        thread.exit(true);
    }

    #[test]
    fn test_protocol_errors() {
        let sim = SimMemory::new();
        let thread = spawn(&sim);

        // No call buffer yet
        assert!(matches!(thread.batch(0), Err(Error::Protocol(_))));

        // GLES1 was not registered for this process
        let mut w = BatchWriter::new();
        w.call(ApiId::Gles1 as u32, 1, false);
        w.end();
        load(&sim, &thread, &w);
        assert!(matches!(thread.batch(0), Err(Error::Protocol(_))));

        thread.exit(true);
    }

    #[test]
    fn test_retry_stops_batch() {
        let sim = SimMemory::new();
        let thread = spawn(&sim);

        let mut w = BatchWriter::new();
        let first = w.call(ApiId::Egl as u32, func::GET_ERROR, false);
        w.in_arg();
        let second = w.call(ApiId::Egl as u32, func::CHOOSE_CONFIG, true);
        w.u32(1);
        w.out_direct(0x7000_0000, 2);
        w.in_null();
        w.in_arg_null();
        w.in_arg();
        let third = w.call(ApiId::Egl as u32, func::GET_ERROR, false);
        w.in_arg();
        w.end();
        load(&sim, &thread, &w);

        assert_eq!(thread.batch(0), Ok(BatchStatus::Retry));
        assert_eq!(sim.phys_u32(BATCH_PA + first as u64), CALL_RESULT_OK);
        assert_eq!(sim.phys_u32(BATCH_PA + second as u64), CALL_RESULT_RETRY);
        assert_eq!(sim.phys_u32(BATCH_PA + third as u64), 0);

        thread.exit(true);
    }

    #[test]
    fn test_last_exit_after_worker_is_gone() {
        let sim = SimMemory::new();
        let apis: Vec<Arc<dyn Api>> = vec![Arc::new(EglApi)];
        let process = ProcessState::new(
            4,
            Arc::new(YaglConfig::default()),
            HostDrivers::headless(),
            sim.clone(),
            apis,
        );
        process.add_thread(1);
        let thread = ThreadState::spawn(process.clone(), 1).unwrap();

        // The worker leaves without finalizing the process
        thread.exit(false);
        assert!(process.env().egl_iface().is_some());

        thread.exit(true);
        assert!(process.env().egl_iface().is_none());
    }

    #[test]
    fn test_calls_after_exit() {
        let sim = SimMemory::new();
        let thread = spawn(&sim);
        thread.exit(true);

        assert_eq!(thread.batch(0), Err(Error::ThreadNotFound { pid: 3, tid: 9 }));
        // Second exit only warns
        thread.exit(true);
    }
}
