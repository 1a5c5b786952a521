//! Security principals attached to a context

use std::any::Any;

use crate::context::Context;
use crate::error::{ErrorKind, JsResult};

/// Byte sink that principals serialize themselves into
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CloneWriter {
    bytes: Vec<u8>,
}

impl CloneWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a little-endian `u32`
    pub fn write_u32(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    /// Append a little-endian `u64`
    pub fn write_u64(&mut self, v: u64) {
        self.bytes.extend_from_slice(&v.to_le_bytes());
    }

    /// Append raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the written bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Embedder-defined security principals
pub trait Principals: 'static {
    /// Concrete type access
    fn as_any(&self) -> &dyn Any;

    /// Serialize into `writer`. A failure must leave an exception pending.
    fn write(&self, cx: &mut Context, writer: &mut CloneWriter) -> JsResult<()>;

    /// Whether these are system or add-on principals
    fn is_system_or_addon_principal(&self) -> bool;
}

impl Context {
    /// Serialize the installed principals
    pub fn write_principals(&mut self, writer: &mut CloneWriter) -> JsResult<()> {
        match self.principals() {
            Some(principals) => principals.write(self, writer),
            None => Err(self.report_error(ErrorKind::Error, "context has no principals")),
        }
    }

    /// Whether the installed principals are system or add-on principals
    pub fn is_system_principal(&self) -> bool {
        self.principals()
            .is_some_and(|principals| principals.is_system_or_addon_principal())
    }
}
