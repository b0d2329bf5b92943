//! OpenGL ES 2.0
//!
//! Shader and program objects wrap host ones. GLSL ES sources are patched
//! when the host compiler rejects precision qualifiers.

pub mod calls;
pub mod context;
pub mod program;
pub mod shader;

use std::sync::Arc;

use crate::api::{bad_func, Api, ApiId, ApiPs, ApiTs, CallResult, ProcessEnv, ThreadContext};
use crate::client::{ClientApi, ClientContext, ClientImage, ClientInterface, SharedClientContext};
use crate::config::PrecisionMode;
use crate::driver::HostDrivers;
use crate::gles::{self, GlesImage};
use crate::object::{EnsureContext, Sharegroup};

pub use context::{Gles2Context, Gles2Features};
pub use program::GlesProgram;
pub use shader::GlesShader;

pub struct Gles2Api;

impl Api for Gles2Api {
    fn id(&self) -> ApiId {
        ApiId::Gles2
    }

    fn process_init(&self, env: &Arc<ProcessEnv>) -> Arc<dyn ApiPs> {
        env.register_client(Arc::new(Gles2Interface {
            drivers: env.drivers.clone(),
            precision_mode: env.config.strip_precision,
        }));
        log::debug!("gles2: process {} initialized", env.pid);
        Arc::new(Gles2Ps { env: env.clone() })
    }
}

struct Gles2Interface {
    drivers: HostDrivers,
    precision_mode: PrecisionMode,
}

impl ClientInterface for Gles2Interface {
    fn client_api(&self) -> ClientApi {
        ClientApi::Gles2
    }

    fn create_ctx(&self, sharegroup: Arc<Sharegroup>, ensure: Arc<dyn EnsureContext>) -> SharedClientContext {
        let ctx: Box<dyn ClientContext> = Box::new(Gles2Context::new(
            self.drivers.gles.clone(),
            self.drivers.gles2.clone(),
            ensure,
            sharegroup,
            self.precision_mode,
        ));
        Arc::new(parking_lot::Mutex::new(ctx))
    }

    fn create_image(&self, tex_global_name: u32, ensure: Arc<dyn EnsureContext>) -> Arc<dyn ClientImage> {
        GlesImage::new(self.drivers.gles.clone(), tex_global_name, ensure)
    }
}

struct Gles2Ps {
    env: Arc<ProcessEnv>,
}

impl ApiPs for Gles2Ps {
    fn id(&self) -> ApiId {
        ApiId::Gles2
    }

    fn thread_init(self: Arc<Self>, tc: &mut ThreadContext) -> Box<dyn ApiTs> {
        log::debug!("gles2: thread {}/{} initialized", tc.pid, tc.tid);
        Box::new(Gles2Ts { ps: self })
    }

    fn fini(&self) {
        log::debug!("gles2: process {} finished", self.env.pid);
    }
}

struct Gles2Ts {
    ps: Arc<Gles2Ps>,
}

impl ApiTs for Gles2Ts {
    fn call(&mut self, func_id: u32, tc: &mut ThreadContext) -> CallResult {
        if let Some(result) = gles::calls::dispatch::<Gles2Context>(func_id, &self.ps.env, tc) {
            return result;
        }
        func_id
            .checked_sub(gles::calls::NUM_FUNCS)
            .and_then(|local| calls::dispatch(local, tc))
            .unwrap_or_else(|| Err(bad_func(ApiId::Gles2, func_id)))
    }

    fn thread_fini(&mut self, tc: &mut ThreadContext) {
        log::debug!("gles2: thread {}/{} finished", tc.pid, tc.tid);
    }
}
