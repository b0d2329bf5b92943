//! OpenGL ES 1.1
//!
//! Fixed-function state goes straight to the host. What the host lacks is
//! emulated here: fixed and byte vertex data, point-size arrays and
//! paletted textures.

pub mod calls;
pub mod context;
pub mod palette;

use std::sync::Arc;

use crate::api::{bad_func, Api, ApiId, ApiPs, ApiTs, CallResult, ProcessEnv, ThreadContext};
use crate::client::{ClientApi, ClientContext, ClientImage, ClientInterface, SharedClientContext};
use crate::driver::HostDrivers;
use crate::gles::{self, GlesImage};
use crate::object::{EnsureContext, Sharegroup};

pub use context::{Gles1Context, Gles1Features};

pub struct Gles1Api;

impl Api for Gles1Api {
    fn id(&self) -> ApiId {
        ApiId::Gles1
    }

    fn process_init(&self, env: &Arc<ProcessEnv>) -> Arc<dyn ApiPs> {
        env.register_client(Arc::new(Gles1Interface {
            drivers: env.drivers.clone(),
        }));
        log::debug!("gles1: process {} initialized", env.pid);
        Arc::new(Gles1Ps { env: env.clone() })
    }
}

struct Gles1Interface {
    drivers: HostDrivers,
}

impl ClientInterface for Gles1Interface {
    fn client_api(&self) -> ClientApi {
        ClientApi::Gles1
    }

    fn create_ctx(&self, sharegroup: Arc<Sharegroup>, ensure: Arc<dyn EnsureContext>) -> SharedClientContext {
        let ctx: Box<dyn ClientContext> = Box::new(Gles1Context::new(
            self.drivers.gles.clone(),
            self.drivers.gles1.clone(),
            ensure,
            sharegroup,
        ));
        Arc::new(parking_lot::Mutex::new(ctx))
    }

    fn create_image(&self, tex_global_name: u32, ensure: Arc<dyn EnsureContext>) -> Arc<dyn ClientImage> {
        GlesImage::new(self.drivers.gles.clone(), tex_global_name, ensure)
    }
}

struct Gles1Ps {
    env: Arc<ProcessEnv>,
}

impl ApiPs for Gles1Ps {
    fn id(&self) -> ApiId {
        ApiId::Gles1
    }

    fn thread_init(self: Arc<Self>, tc: &mut ThreadContext) -> Box<dyn ApiTs> {
        log::debug!("gles1: thread {}/{} initialized", tc.pid, tc.tid);
        Box::new(Gles1Ts { ps: self })
    }

    fn fini(&self) {
        log::debug!("gles1: process {} finished", self.env.pid);
    }
}

struct Gles1Ts {
    ps: Arc<Gles1Ps>,
}

impl ApiTs for Gles1Ts {
    fn call(&mut self, func_id: u32, tc: &mut ThreadContext) -> CallResult {
        if let Some(result) = gles::calls::dispatch::<Gles1Context>(func_id, &self.ps.env, tc) {
            return result;
        }
        func_id
            .checked_sub(gles::calls::NUM_FUNCS)
            .and_then(|local| calls::dispatch(local, tc))
            .unwrap_or_else(|| Err(bad_func(ApiId::Gles1, func_id)))
    }

    fn thread_fini(&mut self, tc: &mut ThreadContext) {
        log::debug!("gles1: thread {}/{} finished", tc.pid, tc.tid);
    }
}
