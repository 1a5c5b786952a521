//! Outcome of operations that can fail without throwing
//!
//! `[[Set]]`, `[[DefineOwnProperty]]`, `[[Delete]]` and friends report
//! "refused" separately from "threw". A refusal only becomes a `TypeError`
//! when the caller is strict, see [`ObjectOpResult::check_strict`].

use crate::context::Context;
use crate::error::{ErrorKind, JsResult};
use crate::id::PropertyKey;

/// Why an operation was refused
#[repr(usize)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureCode {
    /// Assignment to a non-writable property
    ReadOnly = 1,
    /// `[[DefineOwnProperty]]` refused
    CantDefineProperty = 2,
    /// Redefinition of a non-configurable property
    CantRedefineProperty = 3,
    /// `[[Delete]]` of a non-configurable property
    CantDelete = 4,
    /// `[[SetPrototypeOf]]` refused
    CantSetProto = 5,
    /// `[[PreventExtensions]]` refused
    CantPreventExtensions = 6,
    /// Adding a property to a non-extensible object
    NotExtensible = 7,
    /// Assignment to an accessor without a setter
    GetterOnly = 8,
    /// Assignment through a primitive receiver
    NotObjectReceiver = 9,
}

impl FailureCode {
    /// Decode a raw code, `None` for `OK` or unknown codes
    pub fn from_raw(code: usize) -> Option<Self> {
        Some(match code {
            1 => Self::ReadOnly,
            2 => Self::CantDefineProperty,
            3 => Self::CantRedefineProperty,
            4 => Self::CantDelete,
            5 => Self::CantSetProto,
            6 => Self::CantPreventExtensions,
            7 => Self::NotExtensible,
            8 => Self::GetterOnly,
            9 => Self::NotObjectReceiver,
            _ => return None,
        })
    }

    fn message(self) -> &'static str {
        match self {
            Self::ReadOnly => "is read-only",
            Self::CantDefineProperty => "can't be defined",
            Self::CantRedefineProperty => "is non-configurable and can't be redefined",
            Self::CantDelete => "is non-configurable and can't be deleted",
            Self::CantSetProto => "can't have its prototype set",
            Self::CantPreventExtensions => "can't be made non-extensible",
            Self::NotExtensible => "can't be added: object is not extensible",
            Self::GetterOnly => "has only a getter",
            Self::NotObjectReceiver => "can't be set on a primitive",
        }
    }
}

/// Success or a [`FailureCode`], laid out as a single machine word
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectOpResult {
    code: usize,
}

impl ObjectOpResult {
    /// Raw code for success
    pub const OK: usize = 0;

    /// A successful result
    pub const fn ok() -> Self {
        Self { code: Self::OK }
    }

    /// A refused result
    pub const fn failed(code: FailureCode) -> Self {
        Self {
            code: code as usize,
        }
    }

    /// Raw word as seen across the C boundary
    pub const fn raw(self) -> usize {
        self.code
    }

    /// Rebuild from a raw word
    pub const fn from_raw(code: usize) -> Self {
        Self { code }
    }

    /// Mark as succeeded
    pub fn succeed(&mut self) {
        self.code = Self::OK;
    }

    /// Mark as refused
    pub fn fail(&mut self, code: FailureCode) {
        self.code = code as usize;
    }

    /// Whether the operation succeeded
    pub const fn is_ok(self) -> bool {
        self.code == Self::OK
    }

    /// Refusal reason, if any
    pub fn failure_code(self) -> Option<FailureCode> {
        FailureCode::from_raw(self.code)
    }

    /// Convert a refusal into a pending `TypeError` naming `id`
    pub fn check_strict(self, cx: &mut Context, id: PropertyKey) -> JsResult<()> {
        if self.is_ok() {
            return Ok(());
        }
        let name = cx.key_to_string(id);
        let reason = self
            .failure_code()
            .map_or("operation was refused", FailureCode::message);
        Err(cx.report_error(ErrorKind::TypeError, format!("property {name} {reason}")))
    }

    /// Like [`check_strict`](Self::check_strict) for operations without a key
    pub fn check_strict_object(self, cx: &mut Context) -> JsResult<()> {
        if self.is_ok() {
            return Ok(());
        }
        let reason = self
            .failure_code()
            .map_or("operation was refused", FailureCode::message);
        Err(cx.report_error(ErrorKind::TypeError, format!("object {reason}")))
    }
}

impl Default for ObjectOpResult {
    fn default() -> Self {
        Self::ok()
    }
}

impl From<FailureCode> for ObjectOpResult {
    fn from(code: FailureCode) -> Self {
        Self::failed(code)
    }
}
