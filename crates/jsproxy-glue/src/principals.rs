//! Principals backed by foreign callbacks

use std::any::Any;
use std::ffi::c_void;
use std::rc::Rc;

use jsproxy_host::{CloneWriter, Context, JsResult, Principals, Throw};
use tracing::warn;

/// Serialize the principals
pub type WritePrincipalsTrap =
    unsafe extern "C" fn(private: *mut c_void, cx: *mut Context, writer: *mut CloneWriter) -> bool;

/// System or add-on check
pub type IsSystemOrAddonPrincipalTrap = unsafe extern "C" fn(private: *mut c_void) -> bool;

/// Principals callback table
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct PrincipalsCallbacks {
    /// Null fails
    pub write: Option<WritePrincipalsTrap>,
    /// Null answers `false`
    pub is_system_or_addon_principal: Option<IsSystemOrAddonPrincipalTrap>,
}

/// [`Principals`] implemented by foreign callbacks over private data
pub struct ForeignPrincipals {
    callbacks: PrincipalsCallbacks,
    private: *mut c_void,
}

impl ForeignPrincipals {
    /// Wrap `private`.
    ///
    /// # Safety
    /// Every filled slot of `callbacks` must be callable with `private`
    /// for as long as the principals live.
    pub unsafe fn new(callbacks: PrincipalsCallbacks, private: *mut c_void) -> Self {
        Self { callbacks, private }
    }

    /// The private data pointer
    pub fn private(&self) -> *mut c_void {
        self.private
    }
}

impl Principals for ForeignPrincipals {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn write(&self, cx: &mut Context, writer: &mut CloneWriter) -> JsResult<()> {
        let Some(trap) = self.callbacks.write else {
            return Err(Throw);
        };
        // SAFETY: guaranteed by the constructor's contract
        if unsafe { trap(self.private, cx, writer) } {
            Ok(())
        } else {
            if !cx.is_exception_pending() {
                warn!("principals write failed without a pending exception");
            }
            Err(Throw)
        }
    }

    fn is_system_or_addon_principal(&self) -> bool {
        match self.callbacks.is_system_or_addon_principal {
            // SAFETY: guaranteed by the constructor's contract
            Some(trap) => unsafe { trap(self.private) },
            None => false,
        }
    }
}

/// Install foreign principals on `cx`.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
/// - `callbacks` must be null or point at a valid table; it is copied
/// - see [`ForeignPrincipals::new`] for `private`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_set_principals(
    cx: *mut Context,
    callbacks: *const PrincipalsCallbacks,
    private: *mut c_void,
) -> bool {
    if cx.is_null() || callbacks.is_null() {
        return false;
    }
    // SAFETY: checked non-null, validity guaranteed by the caller
    let (cx, callbacks) = unsafe { (&mut *cx, *callbacks) };
    // SAFETY: forwarded from the caller
    let principals = unsafe { ForeignPrincipals::new(callbacks, private) };
    cx.set_principals(Some(Rc::new(principals)));
    true
}

/// Private data of foreign principals installed on `cx`, or null.
///
/// # Safety
/// - `cx` must be null or a valid context pointer
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_get_principals_private(cx: *const Context) -> *mut c_void {
    // SAFETY: null-checked, validity guaranteed by the caller
    let Some(cx) = (unsafe { cx.as_ref() }) else {
        return std::ptr::null_mut();
    };
    cx.principals()
        .and_then(|p| p.as_any().downcast_ref::<ForeignPrincipals>().map(ForeignPrincipals::private))
        .unwrap_or(std::ptr::null_mut())
}

/// Append bytes to a clone writer, for use from a `write` callback.
///
/// # Safety
/// - `writer` must be null or a valid writer
/// - `bytes` must be valid for `len` reads, or null when `len` is 0
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_clone_writer_write_bytes(
    writer: *mut CloneWriter,
    bytes: *const u8,
    len: usize,
) -> bool {
    // SAFETY: null-checked, validity guaranteed by the caller
    let Some(writer) = (unsafe { writer.as_mut() }) else {
        return false;
    };
    if len == 0 {
        return true;
    }
    if bytes.is_null() {
        return false;
    }
    // SAFETY: valid for `len` reads per the caller
    writer.write_bytes(unsafe { std::slice::from_raw_parts(bytes, len) });
    true
}
