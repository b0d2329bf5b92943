//! Shader objects and GLSL ES source patching
//!
//! Desktop GLSL compilers of the GL 2.x era reject the ES precision
//! qualifiers. When the host does, sources are rewritten before they reach
//! it: qualifiers and `precision` statements are dropped, comments go with
//! them, and the ES-only vector limits are expressed through the desktop
//! component limits.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::driver::Gles2Driver;
use crate::gl::*;
use crate::object::{EnsureContext, EnsureGuard, Object, ObjectHeader};

const DELIMITERS: &[u8] = b" \t\n\r()[]{},;?:/%*&|^!+-=<>";

fn is_delimiter(b: u8) -> bool {
    DELIMITERS.contains(&b)
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    /// Run of delimiters with any comments inside removed
    Delim(String),
    Word(&'a str),
}

struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let bytes = self.src.as_bytes();
        if self.pos >= bytes.len() {
            return None;
        }

        if !is_delimiter(bytes[self.pos]) {
            let start = self.pos;
            while self.pos < bytes.len() && !is_delimiter(bytes[self.pos]) {
                self.pos += 1;
            }
            return Some(Token::Word(&self.src[start..self.pos]));
        }

        let mut run = String::new();
        while self.pos < bytes.len() && is_delimiter(bytes[self.pos]) {
            let rest = &bytes[self.pos..];
            if rest.starts_with(b"//") {
                // Line terminator stays
                self.pos += rest
                    .iter()
                    .position(|&b| b == b'\n' || b == b'\r')
                    .unwrap_or(rest.len());
            } else if rest.starts_with(b"/*") {
                self.pos += rest[2..]
                    .windows(2)
                    .position(|w| w == b"*/")
                    .map_or(rest.len(), |at| at + 4);
            } else {
                run.push(bytes[self.pos] as char);
                self.pos += 1;
            }
        }
        Some(Token::Delim(run))
    }
}

fn builtin_replacement(word: &str) -> Option<&'static str> {
    match word {
        "gl_MaxVertexUniformVectors" => Some("(gl_MaxVertexUniformComponents / 4)"),
        "gl_MaxFragmentUniformVectors" => Some("(gl_MaxFragmentUniformComponents / 4)"),
        "gl_MaxVaryingVectors" => Some("(gl_MaxVaryingFloats / 4)"),
        _ => None,
    }
}

/// Rewrite GLSL ES source for a desktop compiler without precision support
pub fn strip_precision(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut tokens = Tokens::new(source);
    while let Some(token) = tokens.next() {
        match token {
            Token::Word("lowp" | "mediump" | "highp") => {}
            Token::Word("precision") => {
                for token in tokens.by_ref() {
                    if matches!(&token, Token::Delim(run) if run.contains(';')) {
                        break;
                    }
                }
            }
            Token::Word(word) => out.push_str(builtin_replacement(word).unwrap_or(word)),
            Token::Delim(run) => out.push_str(&run),
        }
    }
    blank_empty_defines(out)
}

/// A `#define` left without a name after stripping is blanked so the
/// preprocessor does not choke on it
fn blank_empty_defines(source: String) -> String {
    const DEFINE: &[u8] = b"#define";
    let is_eol = |b: u8| b == b'\n' || b == b'\r';
    let is_blank = |b: u8| b == b' ' || b == b'\t';

    let mut bytes = source.into_bytes();
    let len = bytes.len();
    let mut i = 0;
    while i < len {
        while i < len && is_blank(bytes[i]) {
            i += 1;
        }
        if bytes[i..].starts_with(DEFINE) {
            let mut p = i + DEFINE.len();
            while p < len && is_blank(bytes[p]) {
                p += 1;
            }
            if p < len && (is_eol(bytes[p]) || bytes[p] == b'/') {
                bytes[i..i + DEFINE.len()].fill(b' ');
            }
        }
        while i < len && !is_eol(bytes[i]) {
            i += 1;
        }
        while i < len && is_eol(bytes[i]) {
            i += 1;
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

pub struct GlesShader {
    header: ObjectHeader,
    driver: Arc<dyn Gles2Driver>,
    ensure: Arc<dyn EnsureContext>,
    global_name: GLuint,
    type_: GLenum,
    /// Source as the guest gave it, before patching
    source: Mutex<String>,
}

impl GlesShader {
    /// `None` if the host refuses the shader type
    pub fn new(
        driver: Arc<dyn Gles2Driver>,
        ensure: Arc<dyn EnsureContext>,
        type_: GLenum,
    ) -> Option<Arc<GlesShader>> {
        if type_ != GL_VERTEX_SHADER && type_ != GL_FRAGMENT_SHADER {
            return None;
        }
        let global_name = driver.create_shader(type_);
        if global_name == 0 {
            return None;
        }
        Some(Arc::new(GlesShader {
            header: ObjectHeader::new(),
            driver,
            ensure,
            global_name,
            type_,
            source: Mutex::new(String::new()),
        }))
    }

    pub fn global_name(&self) -> GLuint {
        self.global_name
    }

    pub fn type_(&self) -> GLenum {
        self.type_
    }

    pub fn set_source(&self, source: String, strip: bool) {
        if strip {
            self.driver
                .shader_source(self.global_name, &strip_precision(&source));
        } else {
            self.driver.shader_source(self.global_name, &source);
        }
        *self.source.lock() = source;
    }

    pub fn source(&self) -> String {
        self.source.lock().clone()
    }

    pub fn compile(&self) {
        self.driver.compile_shader(self.global_name);
    }

    /// `glGetShaderiv`; the source length is the guest's, not the patched one
    pub fn get_param(&self, pname: GLenum) -> GLint {
        match pname {
            GL_SHADER_SOURCE_LENGTH => {
                let source = self.source.lock();
                if source.is_empty() {
                    0
                } else {
                    source.len() as GLint + 1
                }
            }
            _ => self.driver.get_shaderiv(self.global_name, pname),
        }
    }

    pub fn info_log(&self) -> String {
        self.driver.get_shader_info_log(self.global_name)
    }
}

impl Object for GlesShader {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl Drop for GlesShader {
    fn drop(&mut self) {
        if self.header.nodelete() {
            return;
        }
        let _guard = EnsureGuard::new(self.ensure.as_ref());
        self.driver.delete_shader(self.global_name);
    }
}
