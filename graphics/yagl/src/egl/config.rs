//! EGL configs
//!
//! Configs are the host's RGBA8888 pixel formats with depth and stencil,
//! rewritten so every surface type is offered and the renderable type
//! reflects the client APIs registered in the process.

use core::cmp::Ordering;
use std::sync::Arc;

use bitflags::bitflags;

use super::consts::*;
use crate::driver::NativeConfig;
use crate::object::{gen_handle, Resource};
use crate::types::HostHandle;

bitflags! {
    /// `EGL_SURFACE_TYPE` mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SurfaceType: EGLint {
        const PBUFFER = EGL_PBUFFER_BIT;
        const PIXMAP = EGL_PIXMAP_BIT;
        const WINDOW = EGL_WINDOW_BIT;
        const LOCK_SURFACE = EGL_LOCK_SURFACE_BIT_KHR;
        const OPTIMAL_FORMAT = EGL_OPTIMAL_FORMAT_BIT_KHR;
        const SWAP_BEHAVIOR_PRESERVED = EGL_SWAP_BEHAVIOR_PRESERVED_BIT;
    }
}

bitflags! {
    /// `EGL_RENDERABLE_TYPE` and `EGL_CONFORMANT` mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RenderableType: EGLint {
        const OPENGL_ES = EGL_OPENGL_ES_BIT;
        const OPENVG = EGL_OPENVG_BIT;
        const OPENGL_ES2 = EGL_OPENGL_ES2_BIT;
        const OPENGL = EGL_OPENGL_BIT;
    }
}

pub struct EglConfig {
    handle: HostHandle,
    native: NativeConfig,
}

impl EglConfig {
    /// Whether a host config can back guest surfaces
    pub fn accepts(native: &NativeConfig) -> bool {
        native.buffer_size == 32
            && native.red_size == 8
            && native.green_size == 8
            && native.blue_size == 8
            && native.alpha_size == 8
            && native.depth_size != 0
            && native.stencil_size != 0
    }

    pub fn new(native: &NativeConfig, renderable: RenderableType) -> Arc<EglConfig> {
        let mut native = *native;

        native.surface_type = (SurfaceType::PBUFFER
            | SurfaceType::PIXMAP
            | SurfaceType::WINDOW
            | SurfaceType::SWAP_BEHAVIOR_PRESERVED
            | SurfaceType::LOCK_SURFACE
            | SurfaceType::OPTIMAL_FORMAT)
            .bits();
        native.native_renderable = EGL_TRUE as EGLint;
        native.renderable_type = renderable.bits();

        let has_color =
            native.red_size + native.green_size + native.blue_size + native.alpha_size > 0;
        native.conformant = if has_color && native.caveat != EGL_NON_CONFORMANT_CONFIG {
            renderable.bits()
        } else {
            0
        };

        native.sample_buffers_num = (native.samples_per_pixel > 0) as EGLint;
        native.bind_to_texture_rgb = EGL_TRUE as EGLint;
        native.bind_to_texture_rgba = EGL_TRUE as EGLint;

        Arc::new(EglConfig {
            handle: gen_handle(),
            native,
        })
    }

    pub fn native(&self) -> &NativeConfig {
        &self.native
    }

    pub fn config_id(&self) -> EGLint {
        self.native.config_id
    }

    /// EGL sort order for `eglGetConfigs`/`eglChooseConfig` results
    pub fn sort_order(&self, other: &EglConfig) -> Ordering {
        let (a, b) = (&self.native, &other.native);
        if a.conformant != b.conformant {
            return if a.conformant != 0 {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        a.caveat
            .cmp(&b.caveat)
            .then(a.buffer_size.cmp(&b.buffer_size))
            .then(a.sample_buffers_num.cmp(&b.sample_buffers_num))
            .then(a.samples_per_pixel.cmp(&b.samples_per_pixel))
            .then(a.depth_size.cmp(&b.depth_size))
            .then(a.stencil_size.cmp(&b.stencil_size))
            .then(a.native_visual_type.cmp(&b.native_visual_type))
            .then(a.config_id.cmp(&b.config_id))
    }

    /// `eglGetConfigAttrib`
    pub fn get_attrib(&self, attrib: EGLint) -> Option<EGLint> {
        let n = &self.native;
        let value = match attrib {
            EGL_BUFFER_SIZE => n.buffer_size,
            EGL_RED_SIZE => n.red_size,
            EGL_GREEN_SIZE => n.green_size,
            EGL_BLUE_SIZE => n.blue_size,
            EGL_ALPHA_SIZE => n.alpha_size,
            EGL_ALPHA_MASK_SIZE => 0,
            EGL_BIND_TO_TEXTURE_RGB => n.bind_to_texture_rgb,
            EGL_BIND_TO_TEXTURE_RGBA => n.bind_to_texture_rgba,
            EGL_CONFIG_CAVEAT => n.caveat,
            EGL_CONFIG_ID => n.config_id,
            EGL_DEPTH_SIZE => n.depth_size,
            EGL_LEVEL => n.frame_buffer_level,
            EGL_MAX_PBUFFER_WIDTH => n.max_pbuffer_width,
            EGL_MAX_PBUFFER_HEIGHT => n.max_pbuffer_height,
            EGL_MAX_PBUFFER_PIXELS => n.max_pbuffer_size,
            EGL_MAX_SWAP_INTERVAL => n.max_swap_interval,
            EGL_MIN_SWAP_INTERVAL => n.min_swap_interval,
            EGL_NATIVE_RENDERABLE => n.native_renderable,
            EGL_NATIVE_VISUAL_ID => n.native_visual_id,
            EGL_NATIVE_VISUAL_TYPE => n.native_visual_type,
            EGL_RENDERABLE_TYPE => n.renderable_type,
            EGL_SAMPLE_BUFFERS => n.sample_buffers_num,
            EGL_SAMPLES => n.samples_per_pixel,
            EGL_STENCIL_SIZE => n.stencil_size,
            EGL_SURFACE_TYPE => n.surface_type,
            EGL_TRANSPARENT_TYPE => n.transparent_type,
            EGL_TRANSPARENT_RED_VALUE => n.trans_red_val,
            EGL_TRANSPARENT_GREEN_VALUE => n.trans_green_val,
            EGL_TRANSPARENT_BLUE_VALUE => n.trans_blue_val,
            EGL_CONFORMANT => n.conformant,
            EGL_COLOR_BUFFER_TYPE => EGL_RGB_BUFFER,
            EGL_MATCH_FORMAT_KHR => EGL_FORMAT_RGBA_8888_EXACT_KHR,
            _ => return None,
        };
        Some(value)
    }

    /// Whether this config satisfies the selection template `t`
    pub fn is_chosen_by(&self, t: &NativeConfig) -> bool {
        let n = &self.native;
        let at_least = |want: EGLint, have: EGLint| want == EGL_DONT_CARE || want <= have;
        let exact = |want: EGLint, have: EGLint| want == EGL_DONT_CARE || want == have;
        let mask = |want: EGLint, have: EGLint| want == EGL_DONT_CARE || (want & have) == want;

        at_least(t.red_size, n.red_size)
            && at_least(t.green_size, n.green_size)
            && at_least(t.blue_size, n.blue_size)
            && at_least(t.alpha_size, n.alpha_size)
            && at_least(t.buffer_size, n.buffer_size)
            && at_least(t.depth_size, n.depth_size)
            && at_least(t.stencil_size, n.stencil_size)
            && at_least(t.samples_per_pixel, n.samples_per_pixel)
            && at_least(t.sample_buffers_num, n.sample_buffers_num)
            && exact(t.frame_buffer_level, n.frame_buffer_level)
            && exact(t.config_id, n.config_id)
            && exact(t.native_visual_type, n.native_visual_type)
            && exact(t.max_swap_interval, n.max_swap_interval)
            && exact(t.min_swap_interval, n.min_swap_interval)
            && exact(t.trans_red_val, n.trans_red_val)
            && exact(t.trans_green_val, n.trans_green_val)
            && exact(t.trans_blue_val, n.trans_blue_val)
            && exact(t.caveat, n.caveat)
            && exact(t.native_renderable, n.native_renderable)
            && exact(t.transparent_type, n.transparent_type)
            && exact(t.bind_to_texture_rgb, n.bind_to_texture_rgb)
            && exact(t.bind_to_texture_rgba, n.bind_to_texture_rgba)
            && mask(t.surface_type, n.surface_type)
            && mask(t.conformant, n.conformant)
            && mask(t.renderable_type, n.renderable_type)
            && matches!(
                t.match_format_khr,
                EGL_DONT_CARE | EGL_FORMAT_RGBA_8888_EXACT_KHR | EGL_FORMAT_RGBA_8888_KHR
            )
    }
}

impl Resource for EglConfig {
    fn handle(&self) -> HostHandle {
        self.handle
    }
}

/// What `eglChooseConfig` was asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// `EGL_CONFIG_ID` given, every other attribute is ignored
    ById(EGLint),
    Match(NativeConfig),
}

fn default_template() -> NativeConfig {
    NativeConfig {
        surface_type: EGL_WINDOW_BIT,
        renderable_type: EGL_OPENGL_ES_BIT,
        caveat: EGL_DONT_CARE,
        config_id: EGL_DONT_CARE,
        native_renderable: EGL_DONT_CARE,
        native_visual_type: EGL_DONT_CARE,
        max_swap_interval: EGL_DONT_CARE,
        min_swap_interval: EGL_DONT_CARE,
        trans_red_val: EGL_DONT_CARE,
        trans_green_val: EGL_DONT_CARE,
        trans_blue_val: EGL_DONT_CARE,
        transparent_type: EGL_NONE,
        match_format_khr: EGL_DONT_CARE,
        bind_to_texture_rgb: EGL_DONT_CARE,
        bind_to_texture_rgba: EGL_DONT_CARE,
        ..NativeConfig::default()
    }
}

/// Build a selection from an `eglChooseConfig` attribute list, the error is
/// the EGL error to latch
pub fn parse_selection(attribs: &[EGLint]) -> Result<Selection, EGLint> {
    let mut t = default_template();

    let non_negative = |value: EGLint| {
        if value < 0 {
            Err(EGL_BAD_ATTRIBUTE)
        } else {
            Ok(value)
        }
    };

    for (attrib, value) in super::attrib_pairs(attribs) {
        match attrib {
            EGL_MAX_PBUFFER_WIDTH
            | EGL_MAX_PBUFFER_HEIGHT
            | EGL_MAX_PBUFFER_PIXELS
            | EGL_NATIVE_VISUAL_ID => {}
            EGL_BIND_TO_TEXTURE_RGB => t.bind_to_texture_rgb = value,
            EGL_BIND_TO_TEXTURE_RGBA => t.bind_to_texture_rgba = value,
            EGL_SURFACE_TYPE => t.surface_type = value,
            EGL_LEVEL => {
                if value == EGL_DONT_CARE {
                    return Err(EGL_BAD_ATTRIBUTE);
                }
                t.frame_buffer_level = value;
            }
            EGL_BUFFER_SIZE => t.buffer_size = non_negative(value)?,
            EGL_RED_SIZE => t.red_size = non_negative(value)?,
            EGL_GREEN_SIZE => t.green_size = non_negative(value)?,
            EGL_BLUE_SIZE => t.blue_size = non_negative(value)?,
            EGL_ALPHA_SIZE => t.alpha_size = non_negative(value)?,
            EGL_CONFIG_CAVEAT => {
                if !matches!(value, EGL_NONE | EGL_SLOW_CONFIG | EGL_NON_CONFORMANT_CONFIG) {
                    return Err(EGL_BAD_ATTRIBUTE);
                }
                t.caveat = value;
            }
            EGL_CONFIG_ID => return Ok(Selection::ById(non_negative(value)?)),
            EGL_DEPTH_SIZE => t.depth_size = non_negative(value)?,
            EGL_MAX_SWAP_INTERVAL => t.max_swap_interval = non_negative(value)?,
            EGL_MIN_SWAP_INTERVAL => t.min_swap_interval = non_negative(value)?,
            EGL_CONFORMANT => {
                if RenderableType::from_bits(value).is_none() {
                    return Err(EGL_BAD_ATTRIBUTE);
                }
                t.conformant = value;
            }
            EGL_NATIVE_RENDERABLE => t.native_renderable = value,
            EGL_RENDERABLE_TYPE => t.renderable_type = value,
            EGL_NATIVE_VISUAL_TYPE => {
                if !(0..=1).contains(&value) {
                    return Err(EGL_BAD_ATTRIBUTE);
                }
                t.native_visual_type = value;
            }
            EGL_SAMPLE_BUFFERS => t.sample_buffers_num = non_negative(value)?,
            EGL_SAMPLES => t.samples_per_pixel = non_negative(value)?,
            EGL_STENCIL_SIZE => t.stencil_size = non_negative(value)?,
            EGL_TRANSPARENT_TYPE => {
                if value != EGL_NONE && value != EGL_TRANSPARENT_RGB {
                    return Err(EGL_BAD_ATTRIBUTE);
                }
                t.transparent_type = value;
            }
            EGL_TRANSPARENT_RED_VALUE => t.trans_red_val = value,
            EGL_TRANSPARENT_GREEN_VALUE => t.trans_green_val = value,
            EGL_TRANSPARENT_BLUE_VALUE => t.trans_blue_val = value,
            EGL_MATCH_FORMAT_KHR => t.match_format_khr = value,
            _ => return Err(EGL_BAD_ATTRIBUTE),
        }
    }

    Ok(Selection::Match(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native(config_id: EGLint) -> NativeConfig {
        NativeConfig {
            red_size: 8,
            green_size: 8,
            blue_size: 8,
            alpha_size: 8,
            buffer_size: 32,
            caveat: EGL_NONE,
            config_id,
            depth_size: 24,
            stencil_size: 8,
            transparent_type: EGL_NONE,
            ..NativeConfig::default()
        }
    }

    const ES: RenderableType = RenderableType::OPENGL_ES.union(RenderableType::OPENGL_ES2);

    #[test]
    fn test_accepts_rgba8888_with_depth_stencil() {
        assert!(EglConfig::accepts(&native(1)));
        assert!(!EglConfig::accepts(&NativeConfig {
            depth_size: 0,
            ..native(1)
        }));
        assert!(!EglConfig::accepts(&NativeConfig {
            red_size: 5,
            green_size: 6,
            blue_size: 5,
            alpha_size: 0,
            buffer_size: 16,
            ..native(1)
        }));
    }

    #[test]
    fn test_new_rewrites_capabilities() {
        let cfg = EglConfig::new(
            &NativeConfig {
                samples_per_pixel: 4,
                ..native(7)
            },
            ES,
        );
        let surface_type = SurfaceType::from_bits_truncate(cfg.native().surface_type);
        assert!(surface_type.contains(SurfaceType::WINDOW | SurfaceType::PIXMAP | SurfaceType::PBUFFER));
        assert_eq!(cfg.get_attrib(EGL_RENDERABLE_TYPE), Some(ES.bits()));
        assert_eq!(cfg.get_attrib(EGL_CONFORMANT), Some(ES.bits()));
        assert_eq!(cfg.get_attrib(EGL_SAMPLE_BUFFERS), Some(1));
        assert_eq!(cfg.get_attrib(EGL_CONFIG_ID), Some(7));
        assert_eq!(cfg.get_attrib(EGL_COLOR_BUFFER_TYPE), Some(EGL_RGB_BUFFER));
        assert_eq!(cfg.get_attrib(EGL_WIDTH), None);
    }

    #[test]
    fn test_sort_order() {
        let fast = EglConfig::new(&native(2), ES);
        let slow = EglConfig::new(
            &NativeConfig {
                caveat: EGL_SLOW_CONFIG,
                ..native(1)
            },
            ES,
        );
        let shallow = EglConfig::new(
            &NativeConfig {
                depth_size: 16,
                ..native(3)
            },
            ES,
        );
        let mut configs = vec![slow.clone(), fast.clone(), shallow.clone()];
        configs.sort_by(|a, b| a.sort_order(b));
        let ids: Vec<_> = configs.iter().map(|c| c.config_id()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_parse_selection() {
        assert!(matches!(parse_selection(&[]), Ok(Selection::Match(_))));
        assert_eq!(
            parse_selection(&[EGL_RED_SIZE, 8, EGL_CONFIG_ID, 5, EGL_NONE]),
            Ok(Selection::ById(5))
        );
        assert_eq!(parse_selection(&[EGL_DEPTH_SIZE, -2, EGL_NONE]), Err(EGL_BAD_ATTRIBUTE));
        assert_eq!(parse_selection(&[EGL_LEVEL, EGL_DONT_CARE, EGL_NONE]), Err(EGL_BAD_ATTRIBUTE));
        assert_eq!(parse_selection(&[EGL_CONFORMANT, 0x100, EGL_NONE]), Err(EGL_BAD_ATTRIBUTE));
        assert_eq!(parse_selection(&[EGL_WIDTH, 1, EGL_NONE]), Err(EGL_BAD_ATTRIBUTE));
        // Everything after EGL_NONE is ignored
        assert!(parse_selection(&[EGL_NONE, EGL_WIDTH, 1]).is_ok());
    }

    #[test]
    fn test_matching() {
        let cfg = EglConfig::new(&native(1), ES);
        let template = |attribs: &[EGLint]| match parse_selection(attribs) {
            Ok(Selection::Match(t)) => t,
            other => panic!("unexpected {:?}", other),
        };

        assert!(cfg.is_chosen_by(&template(&[EGL_NONE])));
        assert!(cfg.is_chosen_by(&template(&[EGL_DEPTH_SIZE, 16, EGL_NONE])));
        assert!(!cfg.is_chosen_by(&template(&[EGL_DEPTH_SIZE, 32, EGL_NONE])));
        assert!(cfg.is_chosen_by(&template(&[
            EGL_SURFACE_TYPE,
            EGL_PBUFFER_BIT | EGL_WINDOW_BIT,
            EGL_RENDERABLE_TYPE,
            EGL_OPENGL_ES2_BIT,
            EGL_NONE
        ])));
        assert!(!cfg.is_chosen_by(&template(&[EGL_RENDERABLE_TYPE, EGL_OPENGL_BIT, EGL_NONE])));
        assert!(!cfg.is_chosen_by(&template(&[EGL_CONFIG_CAVEAT, EGL_SLOW_CONFIG, EGL_NONE])));
        assert!(!cfg.is_chosen_by(&template(&[
            EGL_MATCH_FORMAT_KHR,
            EGL_FORMAT_RGB_565_EXACT_KHR,
            EGL_NONE
        ])));
    }
}
