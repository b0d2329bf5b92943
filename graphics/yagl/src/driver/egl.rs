//! Host EGL driver interface

use crate::types::NativeId;

/// Pixel format capabilities of one host EGL config
///
/// Field values use the EGL attribute encoding; `EGL_DONT_CARE` (-1) is
/// meaningful only in a selection template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeConfig {
    pub red_size: i32,
    pub green_size: i32,
    pub blue_size: i32,
    pub alpha_size: i32,
    pub buffer_size: i32,
    pub caveat: i32,
    pub config_id: i32,
    pub conformant: i32,
    pub depth_size: i32,
    pub frame_buffer_level: i32,
    pub max_pbuffer_width: i32,
    pub max_pbuffer_height: i32,
    pub max_pbuffer_size: i32,
    pub max_swap_interval: i32,
    pub min_swap_interval: i32,
    pub native_renderable: i32,
    pub native_visual_id: i32,
    pub native_visual_type: i32,
    pub renderable_type: i32,
    pub sample_buffers_num: i32,
    pub samples_per_pixel: i32,
    pub stencil_size: i32,
    pub surface_type: i32,
    pub transparent_type: i32,
    pub trans_red_val: i32,
    pub trans_green_val: i32,
    pub trans_blue_val: i32,
    pub bind_to_texture_rgb: i32,
    pub bind_to_texture_rgba: i32,
    pub match_format_khr: i32,
    /// Host-side identity of the config
    pub handle: NativeId,
}

/// Guest pbuffer attributes forwarded to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PbufferAttribs {
    pub largest: bool,
    pub tex_format: i32,
    pub tex_target: i32,
    pub tex_mipmap: bool,
}

/// Host EGL driver
///
/// All handles are opaque [`NativeId`]s; [`NativeId::NONE`] is never a
/// valid object.
pub trait EglDriver: Send + Sync {
    fn display_open(&self, native_dpy: NativeId) -> Option<NativeId>;

    fn display_close(&self, dpy: NativeId);

    /// Every config the host display offers
    fn config_enum(&self, dpy: NativeId) -> Vec<NativeConfig>;

    fn pbuffer_surface_create(
        &self,
        dpy: NativeId,
        cfg: &NativeConfig,
        width: u32,
        height: u32,
        attribs: &PbufferAttribs,
    ) -> Option<NativeId>;

    fn pbuffer_surface_destroy(&self, dpy: NativeId, sfc: NativeId);

    fn context_create(
        &self,
        dpy: NativeId,
        cfg: &NativeConfig,
        share: Option<NativeId>,
    ) -> Option<NativeId>;

    fn context_destroy(&self, dpy: NativeId, ctx: NativeId);

    /// Bind `ctx` with `draw`/`read` to the calling OS thread, or unbind
    /// when all are `None`
    fn make_current(
        &self,
        dpy: NativeId,
        draw: Option<NativeId>,
        read: Option<NativeId>,
        ctx: Option<NativeId>,
    ) -> bool;

    /// Context current on the calling OS thread
    fn current_context(&self) -> Option<NativeId>;
}
