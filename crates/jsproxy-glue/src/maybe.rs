//! Optional values at the C boundary
//!
//! An `Option<T>` crosses as a `(value, is_none)` pair. When `is_none` is
//! set, `value` holds `T::default()` and must not be interpreted.

/// Flattened `Option<T>`
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FfiMaybe<T> {
    /// Payload, meaningful only when `is_none` is `false`
    pub value: T,
    /// No payload
    pub is_none: bool,
}

impl<T: Default> FfiMaybe<T> {
    /// Absent value
    pub fn none() -> Self {
        Self {
            value: T::default(),
            is_none: true,
        }
    }
}

impl<T> FfiMaybe<T> {
    /// Present value
    pub fn some(value: T) -> Self {
        Self {
            value,
            is_none: false,
        }
    }

    /// Back to a native option
    pub fn into_option(self) -> Option<T> {
        read_maybe(self.value, self.is_none)
    }
}

impl<T: Default> Default for FfiMaybe<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T: Default> From<Option<T>> for FfiMaybe<T> {
    fn from(option: Option<T>) -> Self {
        match option {
            Some(value) => Self::some(value),
            None => Self::none(),
        }
    }
}

/// Rebuild an option from its flattened parts
pub fn read_maybe<T>(value: T, is_none: bool) -> Option<T> {
    if is_none { None } else { Some(value) }
}

/// Flatten `option` into separate out-locations. `value` is reset to the
/// default for `None`.
pub fn write_maybe<T: Default>(option: Option<T>, value: &mut T, is_none: &mut bool) {
    match option {
        Some(v) => {
            *value = v;
            *is_none = false;
        }
        None => {
            *value = T::default();
            *is_none = true;
        }
    }
}
