//! CoreFoundation helpers shared by the macOS backends.

use std::ffi::{c_void, CStr, CString};

use crate::error::{MacToolsError, Result};

pub type CFTypeRef = *const c_void;
pub type CFStringRef = *const c_void;
pub type CFArrayRef = *const c_void;

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFRelease(cf: CFTypeRef);
    fn CFRetain(cf: CFTypeRef) -> CFTypeRef;
    fn CFStringCreateWithCString(
        alloc: *const c_void,
        c_str: *const i8,
        encoding: u32,
    ) -> CFStringRef;
    fn CFStringGetCString(
        string: CFStringRef,
        buffer: *mut i8,
        buffer_size: i64,
        encoding: u32,
    ) -> bool;
    fn CFStringGetLength(string: CFStringRef) -> i64;
    fn CFGetTypeID(cf: CFTypeRef) -> u64;
    fn CFStringGetTypeID() -> u64;
    pub fn CFArrayGetTypeID() -> u64;
    pub fn CFArrayGetCount(array: CFArrayRef) -> i64;
    pub fn CFArrayGetValueAtIndex(array: CFArrayRef, index: i64) -> CFTypeRef;
}

const CF_STRING_ENCODING_UTF8: u32 = 0x0800_0100;

/// Create an owned CFString
pub fn create_cf_string(s: &str) -> Result<CFStringRef> {
    let c_str = CString::new(s).map_err(|_| MacToolsError::Accessibility {
        call: format!("CFStringCreate({:?})", s),
        code: -1,
    })?;
    let cf = unsafe {
        CFStringCreateWithCString(std::ptr::null(), c_str.as_ptr(), CF_STRING_ENCODING_UTF8)
    };
    if cf.is_null() {
        return Err(MacToolsError::Accessibility {
            call: format!("CFStringCreate({:?})", s),
            code: -1,
        });
    }
    Ok(cf)
}

/// `CFGetTypeID`, or None for null.
pub fn cf_type_id(cf: CFTypeRef) -> Option<u64> {
    (!cf.is_null()).then(|| unsafe { CFGetTypeID(cf) })
}

pub fn is_cf_string(cf: CFTypeRef) -> bool {
    cf_type_id(cf) == Some(unsafe { CFStringGetTypeID() })
}

/// Copy a CFString into a Rust string. Non-string values yield None.
pub fn cf_string_to_string(cf_string: CFStringRef) -> Option<String> {
    if !is_cf_string(cf_string) {
        return None;
    }
    unsafe {
        let length = CFStringGetLength(cf_string);
        if length <= 0 {
            return Some(String::new());
        }

        // UTF-16 units can expand to up to 4 UTF-8 bytes each
        let buffer_size = (length * 4 + 1) as usize;
        let mut buffer: Vec<i8> = vec![0; buffer_size];
        if CFStringGetCString(
            cf_string,
            buffer.as_mut_ptr(),
            buffer_size as i64,
            CF_STRING_ENCODING_UTF8,
        ) {
            CStr::from_ptr(buffer.as_ptr())
                .to_str()
                .ok()
                .map(str::to_string)
        } else {
            None
        }
    }
}

pub fn cf_release(cf: CFTypeRef) {
    if !cf.is_null() {
        unsafe { CFRelease(cf) }
    }
}

pub fn cf_retain(cf: CFTypeRef) -> CFTypeRef {
    if cf.is_null() {
        cf
    } else {
        unsafe { CFRetain(cf) }
    }
}
