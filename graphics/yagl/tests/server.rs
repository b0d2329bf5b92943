//! A guest session through the public server entry points

mod common;

use std::sync::Arc;

use common::{Batch, GuestRam, BATCH_PA};
use yagl::driver::{HeadlessDriver, HostCall, HostDrivers};
use yagl::egl::calls::func as egl;
use yagl::egl::consts::*;
use yagl::gl::*;
use yagl::gles::calls::{func as gles, NUM_FUNCS as NUM_GLES_FUNCS};
use yagl::gles2::calls::func as gles2;
use yagl::mem::GuestMemory;
use yagl::{ApiId, BatchStatus, Error, Pid, RenderType, ServerState, Tid, YaglConfig, YAGL_VERSION};

const PIXELS_VA: u64 = 0x4000_0000;
const PIXELS_PA: u64 = 0x20_0000;

struct Guest {
    ram: Arc<GuestRam>,
    driver: Arc<HeadlessDriver>,
    server: ServerState,
}

impl Guest {
    fn new() -> Self {
        let ram = GuestRam::new(4 << 20);
        let driver = Arc::new(HeadlessDriver::new());
        let server = ServerState::new(
            YaglConfig::default(),
            ram.clone(),
            HostDrivers::from_driver(driver.clone()),
        );
        Self { ram, driver, server }
    }

    fn run(&self, pid: Pid, tid: Tid, batch: &Batch) -> BatchStatus {
        let pages = self.ram.store_batch(batch.bytes());
        self.server.dispatch_update(pid, tid, &pages).unwrap();
        self.server.dispatch_batch(pid, tid, 0).unwrap()
    }

    fn slot(&self, offset: usize) -> u32 {
        self.ram.u32_at(BATCH_PA + offset as u64)
    }

    /// One EGL call followed by its return value in-arg
    fn egl<R>(&self, pid: Pid, tid: Tid, func_id: u32, args: impl FnOnce(&mut Batch) -> R) -> (u32, R) {
        let mut batch = Batch::new();
        batch.call(ApiId::Egl, func_id);
        let r = args(&mut batch);
        let retval = batch.in_arg();
        batch.end();
        assert!(matches!(self.run(pid, tid, &batch), BatchStatus::Complete { .. }));
        (self.slot(retval), r)
    }

    fn display(&self, pid: Pid, tid: Tid) -> u32 {
        let (dpy, _) = self.egl(pid, tid, egl::GET_DISPLAY, |b| {
            b.u32(0);
        });
        let (ok, _) = self.egl(pid, tid, egl::INITIALIZE, |b| {
            b.u32(dpy);
            b.null_arg();
            b.null_arg();
        });
        assert_eq!(ok, EGL_TRUE);
        dpy
    }

    fn config(&self, pid: Pid, tid: Tid, dpy: u32) -> u32 {
        let (ok, (_, data_at)) = self.egl(pid, tid, egl::CHOOSE_CONFIG, |b| {
            b.u32(dpy);
            b.i32_array(&[EGL_RENDERABLE_TYPE, EGL_OPENGL_ES2_BIT, EGL_NONE]);
            let configs = b.in_array(1, 4);
            b.in_arg();
            configs
        });
        assert_eq!(ok, EGL_TRUE);
        self.slot(data_at)
    }

    /// A 2x2 window over guest pixels and a GLES2 context, made current
    fn current(&self, pid: Pid, tid: Tid) -> (u32, u32, u32) {
        let dpy = self.display(pid, tid);
        let config = self.config(pid, tid, dpy);
        assert_ne!(config, 0);

        self.ram.map_range(PIXELS_VA, PIXELS_PA, 16);
        let (sfc, _) = self.egl(pid, tid, egl::CREATE_WINDOW_SURFACE_OFFSCREEN, |b| {
            b.u32(dpy);
            b.u32(config);
            b.u32(2);
            b.u32(2);
            b.u32(4);
            b.u32(PIXELS_VA as u32);
            b.i32_array(&[EGL_NONE]);
        });
        assert_ne!(sfc, 0);

        let (ctx, _) = self.egl(pid, tid, egl::CREATE_CONTEXT, |b| {
            b.u32(dpy);
            b.u32(config);
            b.u32(0);
            b.i32_array(&[EGL_CONTEXT_CLIENT_VERSION, 2, EGL_NONE]);
        });
        assert_ne!(ctx, 0);

        let (ok, _) = self.egl(pid, tid, egl::MAKE_CURRENT, |b| {
            b.u32(dpy);
            b.u32(sfc);
            b.u32(sfc);
            b.u32(ctx);
        });
        assert_eq!(ok, EGL_TRUE);
        (dpy, sfc, ctx)
    }
}

fn gles2_id(func_id: u32) -> u32 {
    NUM_GLES_FUNCS + func_id
}

#[test]
fn test_init_rules() {
    let guest = Guest::new();
    assert_eq!(
        guest.server.dispatch_init(YAGL_VERSION - 1, 1, 1),
        Err(Error::VersionMismatch {
            guest: YAGL_VERSION - 1,
            host: YAGL_VERSION
        })
    );
    assert_eq!(guest.server.num_processes(), 0);

    assert_eq!(guest.server.dispatch_init(YAGL_VERSION, 1, 1), Ok(1));
    assert_eq!(
        guest.server.dispatch_init(YAGL_VERSION, 1, 1),
        Err(Error::ThreadExists { pid: 1, tid: 1 })
    );
}

#[test]
fn test_render_type_from_config() {
    let config = YaglConfig::from_toml_str("render_type = \"onscreen\"\n").unwrap();
    assert_eq!(config.render_type, RenderType::Onscreen);

    let ram = GuestRam::new(1 << 20);
    let server = ServerState::with_backend(config, ram);
    assert_eq!(server.dispatch_init(YAGL_VERSION, 5, 6), Ok(2));
    server.dispatch_exit(5, 6);
    assert_eq!(server.num_processes(), 0);
}

#[test]
fn test_draw_session() {
    let guest = Guest::new();
    guest.server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();
    let (dpy, sfc, _ctx) = guest.current(1, 1);
    guest.driver.clear_calls();

    let mut b = Batch::new();
    b.call(ApiId::Gles2, gles::GEN_BUFFERS);
    let (count_at, name_at) = b.in_array(1, 4);
    b.call(ApiId::Gles2, gles::BIND_BUFFER);
    b.u32(GL_ARRAY_BUFFER);
    b.u32(1);
    b.call(ApiId::Gles2, gles::BUFFER_DATA);
    b.u32(GL_ARRAY_BUFFER);
    b.bytes_array(100, &[1u8; 100]);
    b.u32(GL_STATIC_DRAW);
    b.call(ApiId::Gles2, gles::BUFFER_SUB_DATA);
    b.u32(GL_ARRAY_BUFFER);
    b.i32(10);
    b.bytes_array(5, &[2u8; 5]);
    b.call(ApiId::Gles2, gles2_id(gles2::VERTEX_ATTRIB_POINTER));
    b.u32(0);
    b.i32(4);
    b.u32(GL_FLOAT);
    b.u32(0);
    b.i32(16);
    b.u32(0);
    b.call(ApiId::Gles2, gles2_id(gles2::ENABLE_VERTEX_ATTRIB_ARRAY));
    b.u32(0);
    b.call(ApiId::Gles2, gles::DRAW_ARRAYS);
    b.u32(GL_TRIANGLES);
    b.i32(0);
    b.i32(3);
    b.call(ApiId::Gles2, gles::GET_ERROR);
    let error_at = b.in_arg();
    b.end();

    assert_eq!(guest.run(1, 1, &b), BatchStatus::Complete { bytes: b.len() });
    assert_eq!(guest.slot(count_at), 1);
    assert_eq!(guest.slot(name_at), 1);
    assert_eq!(guest.slot(error_at), GL_NO_ERROR);

    // The partial write lands inside the pending full upload
    let calls = guest.driver.take_calls();
    let uploads: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, HostCall::BufferData { .. } | HostCall::BufferSubData { .. }))
        .collect();
    assert_eq!(uploads.len(), 1);
    match uploads[0] {
        HostCall::BufferData { size, data: Some(data), .. } => {
            assert_eq!(*size, 100);
            assert_eq!(data[10..15], [2u8; 5]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(calls.contains(&HostCall::DrawArrays {
        mode: GL_TRIANGLES,
        first: 0,
        count: 3
    }));

    // Swap reads the host framebuffer back into guest pixels, bottom row first
    let (ok, _) = guest.egl(1, 1, egl::SWAP_BUFFERS, |b| {
        b.u32(dpy);
        b.u32(sfc);
    });
    assert_eq!(ok, EGL_TRUE);
    let mut pixels = [0u8; 16];
    guest.ram.read_phys(PIXELS_PA, &mut pixels);
    assert_eq!(pixels[..8], [1u8; 8]);
    assert_eq!(pixels[8..], [0u8; 8]);

    guest.server.dispatch_exit(1, 1);
    assert_eq!(guest.server.num_processes(), 0);
    assert_eq!(guest.driver.num_contexts(), 0);
    assert_eq!(guest.ram.mapped(), 0);
}

#[test]
fn test_gl_call_without_context() {
    let guest = Guest::new();
    guest.server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();

    let mut b = Batch::new();
    let res = b.call(ApiId::Gles1, gles::GET_ERROR);
    b.in_arg();
    b.end();
    assert!(matches!(guest.run(1, 1, &b), BatchStatus::Complete { .. }));
    assert_eq!(guest.slot(res), 0xA);
}

#[test]
fn test_missing_page_retries() {
    let guest = Guest::new();
    guest.server.dispatch_init(YAGL_VERSION, 1, 1).unwrap();
    let dpy = guest.display(1, 1);
    let config = guest.config(1, 1, dpy);

    // The attribute list is not resident yet
    const ATTRIBS_VA: u64 = 0x5000_0000;
    let mut b = Batch::new();
    let res = b.call_direct(ApiId::Egl, egl::CREATE_CONTEXT);
    b.u32(dpy);
    b.u32(config);
    b.u32(0);
    b.direct_array(ATTRIBS_VA as u32, 3);
    let retval = b.in_arg();
    b.end();
    assert_eq!(guest.run(1, 1, &b), BatchStatus::Retry);
    assert_eq!(guest.slot(res), 0xB);
    assert_eq!(guest.slot(retval), 0);
    assert_eq!(guest.driver.num_contexts(), 0);

    // Same batch once the page is in
    guest.ram.map_range(ATTRIBS_VA, 0x30_0000, 12);
    let raw: Vec<u8> = [EGL_CONTEXT_CLIENT_VERSION, 2, EGL_NONE]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    guest.ram.write_virt(ATTRIBS_VA, &raw).unwrap();
    assert!(matches!(
        guest.server.dispatch_batch(1, 1, 0),
        Ok(BatchStatus::Complete { .. })
    ));
    assert_eq!(guest.slot(res), 0xA);
    assert_ne!(guest.slot(retval), 0);
    assert!(guest.driver.num_contexts() > 0);

    let (error, _) = guest.egl(1, 1, egl::GET_ERROR, |_| ());
    assert_eq!(error as EGLint, EGL_SUCCESS);
}

#[test]
fn test_threads_of_one_process() {
    let guest = Guest::new();
    guest.server.dispatch_init(YAGL_VERSION, 3, 1).unwrap();
    guest.server.dispatch_init(YAGL_VERSION, 3, 2).unwrap();
    assert_eq!(guest.server.num_processes(), 1);

    // Displays belong to the process
    let first = guest.display(3, 1);
    let (second, _) = guest.egl(3, 2, egl::GET_DISPLAY, |b| {
        b.u32(0);
    });
    assert_eq!(first, second);

    guest.server.dispatch_exit(3, 1);
    assert_eq!(guest.server.num_processes(), 1);
    let (again, _) = guest.egl(3, 2, egl::GET_DISPLAY, |b| {
        b.u32(0);
    });
    assert_eq!(again, first);

    guest.server.dispatch_exit(3, 2);
    assert_eq!(guest.server.num_processes(), 0);
    assert_eq!(
        guest.server.dispatch_batch(3, 2, 0),
        Err(Error::ThreadNotFound { pid: 3, tid: 2 })
    );
}
