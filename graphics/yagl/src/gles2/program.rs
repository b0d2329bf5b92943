//! Program objects
//!
//! A program holds at most one vertex and one fragment shader. Attachments
//! are tracked by local name so `glGetAttachedShaders` answers in guest
//! names.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use super::shader::GlesShader;
use crate::driver::{ActiveVariable, Gles2Driver};
use crate::gl::*;
use crate::object::{EnsureContext, EnsureGuard, Object, ObjectHeader};
use crate::types::ObjectName;

#[derive(Debug, Default, Clone, Copy)]
struct Attached {
    vertex: ObjectName,
    fragment: ObjectName,
}

pub struct GlesProgram {
    header: ObjectHeader,
    driver: Arc<dyn Gles2Driver>,
    ensure: Arc<dyn EnsureContext>,
    global_name: GLuint,
    attached: Mutex<Attached>,
}

impl GlesProgram {
    pub fn new(driver: Arc<dyn Gles2Driver>, ensure: Arc<dyn EnsureContext>) -> Arc<GlesProgram> {
        let global_name = driver.create_program();
        Arc::new(GlesProgram {
            header: ObjectHeader::new(),
            driver,
            ensure,
            global_name,
            attached: Mutex::new(Attached::default()),
        })
    }

    pub fn global_name(&self) -> GLuint {
        self.global_name
    }

    /// False if a shader of that type is already attached
    pub fn attach_shader(&self, shader: &GlesShader, local_name: ObjectName) -> bool {
        let mut attached = self.attached.lock();
        let slot = match shader.type_() {
            GL_VERTEX_SHADER => &mut attached.vertex,
            GL_FRAGMENT_SHADER => &mut attached.fragment,
            _ => return false,
        };
        if *slot != 0 {
            return false;
        }
        *slot = local_name;
        self.driver.attach_shader(self.global_name, shader.global_name());
        true
    }

    /// False if `local_name` is not attached
    pub fn detach_shader(&self, shader: &GlesShader, local_name: ObjectName) -> bool {
        let mut attached = self.attached.lock();
        if attached.vertex == local_name {
            attached.vertex = 0;
        } else if attached.fragment == local_name {
            attached.fragment = 0;
        } else {
            return false;
        }
        self.driver.detach_shader(self.global_name, shader.global_name());
        true
    }

    /// Local names of the attached shaders, vertex first
    pub fn attached_shaders(&self) -> Vec<ObjectName> {
        let attached = *self.attached.lock();
        [attached.vertex, attached.fragment]
            .into_iter()
            .filter(|&name| name != 0)
            .collect()
    }

    pub fn link(&self) {
        self.driver.link_program(self.global_name);
    }

    pub fn validate(&self) {
        self.driver.validate_program(self.global_name);
    }

    pub fn bind_attrib_location(&self, index: GLuint, name: &str) {
        self.driver.bind_attrib_location(self.global_name, index, name);
    }

    pub fn attrib_location(&self, name: &str) -> GLint {
        self.driver.get_attrib_location(self.global_name, name)
    }

    pub fn uniform_location(&self, name: &str) -> GLint {
        self.driver.get_uniform_location(self.global_name, name)
    }

    pub fn active_attrib(&self, index: GLuint) -> Option<ActiveVariable> {
        self.driver.get_active_attrib(self.global_name, index)
    }

    pub fn active_uniform(&self, index: GLuint) -> Option<ActiveVariable> {
        self.driver.get_active_uniform(self.global_name, index)
    }

    pub fn get_param(&self, pname: GLenum) -> GLint {
        match pname {
            GL_ATTACHED_SHADERS => self.attached_shaders().len() as GLint,
            _ => self.driver.get_programiv(self.global_name, pname),
        }
    }

    pub fn info_log(&self) -> String {
        self.driver.get_program_info_log(self.global_name)
    }

    pub fn uniformfv(&self, location: GLint, params: &mut [GLfloat]) {
        self.driver.get_uniformfv(self.global_name, location, params);
    }

    pub fn uniformiv(&self, location: GLint, params: &mut [GLint]) {
        self.driver.get_uniformiv(self.global_name, location, params);
    }
}

impl Object for GlesProgram {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Drop for GlesProgram {
    fn drop(&mut self) {
        if self.header.nodelete() || self.global_name == 0 {
            return;
        }
        let _guard = EnsureGuard::new(self.ensure.as_ref());
        self.driver.delete_program(self.global_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::HeadlessDriver;
    use crate::testutil::NoEnsure;

    fn shader(driver: &Arc<HeadlessDriver>, type_: GLenum, source: &str) -> Arc<GlesShader> {
        let shader = GlesShader::new(driver.clone(), Arc::new(NoEnsure), type_).unwrap();
        shader.set_source(source.to_string(), false);
        shader.compile();
        shader
    }

    #[test]
    fn test_attach_one_shader_per_stage() {
        let driver = Arc::new(HeadlessDriver::new());
        let program = GlesProgram::new(driver.clone(), Arc::new(NoEnsure));
        let vs = shader(&driver, GL_VERTEX_SHADER, "void main() {}");
        let vs2 = shader(&driver, GL_VERTEX_SHADER, "void main() {}");
        let fs = shader(&driver, GL_FRAGMENT_SHADER, "void main() {}");

        assert!(program.attach_shader(&vs, 1));
        assert!(!program.attach_shader(&vs2, 2));
        assert!(program.attach_shader(&fs, 3));
        assert_eq!(program.attached_shaders(), vec![1, 3]);
        assert_eq!(program.get_param(GL_ATTACHED_SHADERS), 2);
        assert_eq!(driver.get_attached_shaders(program.global_name()).len(), 2);

        assert!(!program.detach_shader(&vs2, 2));
        assert!(program.detach_shader(&vs, 1));
        assert_eq!(program.attached_shaders(), vec![3]);
        assert!(program.attach_shader(&vs2, 2));
        assert_eq!(program.attached_shaders(), vec![2, 3]);
    }

    #[test]
    fn test_link_and_locations() {
        let driver = Arc::new(HeadlessDriver::new());
        let program = GlesProgram::new(driver.clone(), Arc::new(NoEnsure));
        let vs = shader(
            &driver,
            GL_VERTEX_SHADER,
            "attribute vec4 pos;\nuniform mat4 mvp;\nvoid main() { gl_Position = mvp * pos; }",
        );
        let fs = shader(&driver, GL_FRAGMENT_SHADER, "uniform vec4 color;\nvoid main() {}");
        assert!(program.attach_shader(&vs, 1));
        assert!(program.attach_shader(&fs, 2));

        assert_eq!(program.attrib_location("pos"), -1);
        program.link();
        assert_eq!(program.get_param(GL_LINK_STATUS), 1);
        assert_eq!(program.attrib_location("pos"), 0);
        assert_eq!(program.uniform_location("color"), 1);
        assert_eq!(program.active_attrib(0).map(|v| v.name), Some("pos".to_string()));
        assert!(program.active_uniform(2).is_none());
        assert!(program.info_log().is_empty());
    }
}
