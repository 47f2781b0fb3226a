//! Active `CGEventTap` backend.
//!
//! The high-level core-graphics tap wrapper cannot drop events, so taps are
//! created through the raw API. Returning null from the callback consumes the
//! event.

#![allow(non_upper_case_globals)]

use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use core_foundation::base::TCFType;
use core_foundation::mach_port::{CFMachPort, CFMachPortRef};
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop, CFRunLoopSource};
use core_graphics::geometry::CGPoint;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use super::ensure_main_thread;
use crate::error::{MacToolsError, Result};
use crate::geometry::Point;
use crate::platform::{EventMask, InputEvent, InputTaps, InstalledTap, TapCallback, TapDisposition};

type CGEventRef = *mut c_void;
type CGEventTapProxy = *mut c_void;

type TapCallbackFn = extern "C" fn(
    proxy: CGEventTapProxy,
    event_type: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapCreate(
        tap: u32,
        place: u32,
        options: u32,
        events_of_interest: u64,
        callback: TapCallbackFn,
        user_info: *mut c_void,
    ) -> CFMachPortRef;
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
    fn CGEventGetFlags(event: CGEventRef) -> u64;
    fn CGEventGetIntegerValueField(event: CGEventRef, field: u32) -> i64;
    fn CGEventGetLocation(event: CGEventRef) -> CGPoint;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFMachPortInvalidate(port: CFMachPortRef);
}

const kCGSessionEventTap: u32 = 1;
const kCGHeadInsertEventTap: u32 = 0;
const kCGEventTapOptionDefault: u32 = 0;

const kCGEventLeftMouseDown: u32 = 1;
const kCGEventKeyDown: u32 = 10;
const kCGEventTapDisabledByTimeout: u32 = 0xFFFF_FFFE;
const kCGEventTapDisabledByUserInput: u32 = 0xFFFF_FFFF;

const kCGKeyboardEventKeycode: u32 = 9;

fn cg_mask(mask: EventMask) -> u64 {
    let mut bits = 0u64;
    if mask.contains(EventMask::LEFT_MOUSE_DOWN) {
        bits |= 1 << kCGEventLeftMouseDown;
    }
    if mask.contains(EventMask::KEY_DOWN) {
        bits |= 1 << kCGEventKeyDown;
    }
    bits
}

/// State the C callback reaches through `user_info`
struct TapContext {
    callback: Mutex<TapCallback>,
    port: Mutex<Option<CFMachPort>>,
    enabled: AtomicBool,
}

unsafe fn decode(event_type: u32, event: CGEventRef) -> Option<InputEvent> {
    match event_type {
        kCGEventLeftMouseDown => {
            // CGEvent locations are already in global top-left coordinates
            let p = CGEventGetLocation(event);
            Some(InputEvent::LeftMouseDown {
                location: Point::new(p.x, p.y),
            })
        }
        kCGEventKeyDown => Some(InputEvent::KeyDown {
            key_code: CGEventGetIntegerValueField(event, kCGKeyboardEventKeycode) as u16,
            flags: CGEventGetFlags(event),
        }),
        _ => None,
    }
}

extern "C" fn tap_callback(
    _proxy: CGEventTapProxy,
    event_type: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef {
    if user_info.is_null() {
        return event;
    }
    let context = unsafe { &*(user_info as *const TapContext) };

    if event_type == kCGEventTapDisabledByTimeout || event_type == kCGEventTapDisabledByUserInput {
        if context.enabled.load(Ordering::SeqCst) {
            warn!(event_type, "Event tap disabled by the system, re-enabling");
            if let Some(port) = context.port.lock().as_ref() {
                unsafe { CGEventTapEnable(port.as_concrete_TypeRef(), true) };
            }
        }
        return event;
    }

    let Some(input) = (unsafe { decode(event_type, event) }) else {
        return event;
    };

    // Unwinding across the C boundary aborts; treat a panic as pass-through
    let disposition = catch_unwind(AssertUnwindSafe(|| (context.callback.lock())(&input)))
        .unwrap_or_else(|_| {
            error!("Event tap callback panicked");
            TapDisposition::PassThrough
        });

    match disposition {
        TapDisposition::PassThrough => event,
        TapDisposition::Consume => std::ptr::null_mut(),
    }
}

pub struct MacTap {
    context: *mut TapContext,
    source: Option<CFRunLoopSource>,
}

// The tap is only touched from the main thread; the handle moves between
// owners but is never used concurrently.
unsafe impl Send for MacTap {}

impl MacTap {
    fn context(&self) -> Option<&TapContext> {
        if self.context.is_null() {
            None
        } else {
            Some(unsafe { &*self.context })
        }
    }
}

impl InstalledTap for MacTap {
    fn set_enabled(&mut self, enabled: bool) {
        let Some(context) = self.context() else {
            return;
        };
        context.enabled.store(enabled, Ordering::SeqCst);
        if let Some(port) = context.port.lock().as_ref() {
            unsafe { CGEventTapEnable(port.as_concrete_TypeRef(), enabled) };
        }
    }

    fn uninstall(&mut self) {
        if self.context.is_null() {
            return;
        }
        ensure_main_thread("event tap uninstall");
        self.set_enabled(false);

        if let Some(source) = self.source.take() {
            CFRunLoop::get_main().remove_source(&source, unsafe { kCFRunLoopCommonModes });
        }
        // Take the port out first so the callback can no longer reach it
        let port = unsafe { &*self.context }.port.lock().take();
        if let Some(port) = port {
            unsafe { CFMachPortInvalidate(port.as_concrete_TypeRef()) };
        }
        drop(unsafe { Box::from_raw(self.context) });
        self.context = std::ptr::null_mut();
        info!("Event tap uninstalled");
    }
}

impl Drop for MacTap {
    fn drop(&mut self) {
        self.uninstall();
    }
}

#[derive(Debug, Default)]
pub struct MacInputTaps;

impl InputTaps for MacInputTaps {
    fn install(&self, mask: EventMask, callback: TapCallback) -> Result<Box<dyn InstalledTap>> {
        ensure_main_thread("CGEventTapCreate");
        let context = Box::into_raw(Box::new(TapContext {
            callback: Mutex::new(callback),
            port: Mutex::new(None),
            enabled: AtomicBool::new(false),
        }));

        let raw_port = unsafe {
            CGEventTapCreate(
                kCGSessionEventTap,
                kCGHeadInsertEventTap,
                kCGEventTapOptionDefault,
                cg_mask(mask),
                tap_callback,
                context as *mut c_void,
            )
        };
        if raw_port.is_null() {
            drop(unsafe { Box::from_raw(context) });
            return Err(MacToolsError::PermissionDenied {
                capability: "Accessibility",
            });
        }

        let port = unsafe { CFMachPort::wrap_under_create_rule(raw_port) };
        // Created disabled; the owner enables it once stored
        unsafe { CGEventTapEnable(raw_port, false) };

        let source = match port.create_runloop_source(0) {
            Ok(source) => source,
            Err(()) => {
                unsafe { CFMachPortInvalidate(raw_port) };
                drop(port);
                drop(unsafe { Box::from_raw(context) });
                return Err(MacToolsError::Accessibility {
                    call: "CFMachPortCreateRunLoopSource".to_string(),
                    code: -1,
                });
            }
        };
        CFRunLoop::get_main().add_source(&source, unsafe { kCFRunLoopCommonModes });
        *unsafe { &*context }.port.lock() = Some(port);

        info!(?mask, "Event tap installed");
        Ok(Box::new(MacTap {
            context,
            source: Some(source),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_bits() {
        assert_eq!(cg_mask(EventMask::LEFT_MOUSE_DOWN), 1 << 1);
        assert_eq!(cg_mask(EventMask::KEY_DOWN), 1 << 10);
        assert_eq!(
            cg_mask(EventMask::LEFT_MOUSE_DOWN | EventMask::KEY_DOWN),
            (1 << 1) | (1 << 10)
        );
    }
}
