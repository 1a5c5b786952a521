//! C access to key vectors
//!
//! Key-listing traps receive a `*mut IdVector` owned by the engine and
//! append to it with [`jsproxy_append_to_id_vector`]. Foreign code that
//! needs a vector of its own creates one and must destroy it.

use jsproxy_host::{IdVector, PropertyKey};

/// Allocate an empty key vector.
#[unsafe(no_mangle)]
pub extern "C" fn jsproxy_create_id_vector() -> *mut IdVector {
    Box::into_raw(Box::new(IdVector::new()))
}

/// Append `id` to `v`.
///
/// # Safety
/// - `v` must be null or a valid, exclusively accessible key vector
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_append_to_id_vector(v: *mut IdVector, id: PropertyKey) -> bool {
    if v.is_null() {
        return false;
    }
    // SAFETY: checked non-null, validity guaranteed by the caller
    let v = unsafe { &mut *v };
    v.push(id);
    true
}

/// Borrow the keys of `v`. The pointer is valid until `v` is modified or
/// destroyed.
///
/// # Safety
/// - `v` must be null or a valid key vector
/// - `length` must be null or valid for writes
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_slice_id_vector(
    v: *const IdVector,
    length: *mut usize,
) -> *const PropertyKey {
    // SAFETY: null-checked, validity guaranteed by the caller
    let keys: &[PropertyKey] = match unsafe { v.as_ref() } {
        Some(v) => v.as_slice(),
        None => &[],
    };
    if !length.is_null() {
        // SAFETY: checked non-null
        unsafe { *length = keys.len() };
    }
    keys.as_ptr()
}

/// Free a vector from [`jsproxy_create_id_vector`].
///
/// # Safety
/// - `v` must be null or come from [`jsproxy_create_id_vector`]
/// - `v` must not be used after this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jsproxy_destroy_id_vector(v: *mut IdVector) {
    if v.is_null() {
        return;
    }
    // SAFETY: allocated by `jsproxy_create_id_vector`
    drop(unsafe { Box::from_raw(v) });
}
