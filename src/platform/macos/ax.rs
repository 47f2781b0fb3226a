//! Accessibility backend over `AXUIElement`.
//!
//! Every `Copy`/`Create` result is owned and released by `AxElement` or by
//! the helper that produced it; `CFArrayGetValueAtIndex` results are borrowed
//! and retained before they outlive their array.

#![allow(non_upper_case_globals)]

use std::any::Any;
use std::ffi::c_void;
use std::fmt;

use core_graphics::geometry::{CGPoint, CGSize};
use macos_accessibility_client::accessibility;
use tracing::{debug, info, instrument};

use super::cf::{
    cf_release, cf_retain, cf_string_to_string, cf_type_id, create_cf_string, is_cf_string,
    CFArrayGetCount, CFArrayGetTypeID, CFArrayGetValueAtIndex, CFArrayRef, CFStringRef,
    CFTypeRef,
};
use super::ensure_main_thread;
use crate::error::{MacToolsError, Result};
use crate::geometry::{Point, Rect, Size};
use crate::platform::{Accessibility, Element, NativeElement, Pid, WindowId};

type AXUIElementRef = *const c_void;
type AXValueRef = *const c_void;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXUIElementCreateSystemWide() -> AXUIElementRef;
    fn AXUIElementCreateApplication(pid: i32) -> AXUIElementRef;
    fn AXUIElementCopyAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: *mut CFTypeRef,
    ) -> i32;
    fn AXUIElementSetAttributeValue(
        element: AXUIElementRef,
        attribute: CFStringRef,
        value: CFTypeRef,
    ) -> i32;
    fn AXUIElementCopyElementAtPosition(
        application: AXUIElementRef,
        x: f32,
        y: f32,
        element: *mut AXUIElementRef,
    ) -> i32;
    fn AXUIElementGetPid(element: AXUIElementRef, pid: *mut i32) -> i32;
    fn AXUIElementGetTypeID() -> u64;
    fn AXValueCreate(value_type: i32, value: *const c_void) -> AXValueRef;
    fn AXValueGetValue(value: AXValueRef, value_type: i32, value_out: *mut c_void) -> bool;
    fn AXValueGetTypeID() -> u64;

    // Private, but stable since 10.5
    fn _AXUIElementGetWindow(element: AXUIElementRef, id: *mut u32) -> i32;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    static kCFBooleanTrue: CFTypeRef;
    fn CFBooleanGetTypeID() -> u64;
    fn CFBooleanGetValue(boolean: CFTypeRef) -> bool;
    fn CFURLGetTypeID() -> u64;
    fn CFURLGetString(url: CFTypeRef) -> CFStringRef;
}

const kAXValueTypeCGPoint: i32 = 1;
const kAXValueTypeCGSize: i32 = 2;
const kAXErrorSuccess: i32 = 0;

fn is_ax_element(raw: CFTypeRef) -> bool {
    cf_type_id(raw) == Some(unsafe { AXUIElementGetTypeID() })
}

fn is_ax_value(raw: CFTypeRef) -> bool {
    cf_type_id(raw) == Some(unsafe { AXValueGetTypeID() })
}

/// Owned, retained `AXUIElementRef`
pub struct AxElement(AXUIElementRef);

// AX references are CF objects; CF retain/release is thread-safe and every
// call through them is made on the main thread.
unsafe impl Send for AxElement {}
unsafe impl Sync for AxElement {}

impl AxElement {
    /// Take ownership of a +1 reference. Null yields None; anything that is
    /// not an AXUIElement is released and yields None.
    fn owned(raw: AXUIElementRef) -> Option<Self> {
        if raw.is_null() {
            return None;
        }
        if !is_ax_element(raw) {
            cf_release(raw);
            return None;
        }
        Some(Self(raw))
    }

    /// Retain a borrowed reference
    fn borrowed(raw: AXUIElementRef) -> Option<Self> {
        if !is_ax_element(raw) {
            return None;
        }
        Some(Self(cf_retain(raw)))
    }

    fn raw(&self) -> AXUIElementRef {
        self.0
    }
}

impl Drop for AxElement {
    fn drop(&mut self) {
        cf_release(self.0);
    }
}

impl fmt::Debug for AxElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AxElement({:p})", self.0)
    }
}

impl NativeElement for AxElement {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn raw_of(element: &Element) -> Option<AXUIElementRef> {
    element.downcast_ref::<AxElement>().map(AxElement::raw)
}

/// Copy an attribute value. The caller owns the result.
fn copy_attribute(element: AXUIElementRef, attribute: &str) -> Result<CFTypeRef> {
    let attr = create_cf_string(attribute)?;
    let mut value: CFTypeRef = std::ptr::null();
    let code = unsafe { AXUIElementCopyAttributeValue(element, attr, &mut value) };
    cf_release(attr);

    if code != kAXErrorSuccess || value.is_null() {
        return Err(MacToolsError::Accessibility {
            call: format!("copy {}", attribute),
            code,
        });
    }
    Ok(value)
}

fn set_attribute(element: AXUIElementRef, attribute: &str, value: CFTypeRef) -> Result<()> {
    let attr = create_cf_string(attribute)?;
    let code = unsafe { AXUIElementSetAttributeValue(element, attr, value) };
    cf_release(attr);

    if code != kAXErrorSuccess {
        return Err(MacToolsError::Accessibility {
            call: format!("set {}", attribute),
            code,
        });
    }
    Ok(())
}

fn string_attribute(element: AXUIElementRef, attribute: &str) -> Option<String> {
    let value = copy_attribute(element, attribute).ok()?;
    let result = cf_string_to_string(value as CFStringRef);
    cf_release(value);
    result
}

fn element_attribute(element: AXUIElementRef, attribute: &str) -> Option<Element> {
    let value = copy_attribute(element, attribute).ok()?;
    AxElement::owned(value).map(Element::new)
}

fn position_of(element: AXUIElementRef) -> Option<Point> {
    let value = copy_attribute(element, "AXPosition").ok()?;
    if !is_ax_value(value) {
        cf_release(value);
        return None;
    }
    let mut point = CGPoint::new(0.0, 0.0);
    let ok = unsafe {
        AXValueGetValue(
            value,
            kAXValueTypeCGPoint,
            &mut point as *mut _ as *mut c_void,
        )
    };
    cf_release(value);
    ok.then(|| Point::new(point.x, point.y))
}

fn size_of(element: AXUIElementRef) -> Option<Size> {
    let value = copy_attribute(element, "AXSize").ok()?;
    if !is_ax_value(value) {
        cf_release(value);
        return None;
    }
    let mut size = CGSize::new(0.0, 0.0);
    let ok = unsafe {
        AXValueGetValue(
            value,
            kAXValueTypeCGSize,
            &mut size as *mut _ as *mut c_void,
        )
    };
    cf_release(value);
    ok.then(|| Size::new(size.width, size.height))
}

/// AXURL as a string. Dock items report a CFURL; some elements hand back
/// the URL string itself. Anything else is a miss.
fn url_string(value: CFTypeRef) -> Option<String> {
    if cf_type_id(value) == Some(unsafe { CFURLGetTypeID() }) {
        // CFURLGetString follows the get rule; the string lives as long as the URL
        cf_string_to_string(unsafe { CFURLGetString(value) })
    } else if is_cf_string(value) {
        cf_string_to_string(value)
    } else {
        None
    }
}

fn app_element(pid: Pid) -> Option<AxElement> {
    AxElement::owned(unsafe { AXUIElementCreateApplication(pid) })
}

fn require(element: &Element, call: &str) -> Result<AXUIElementRef> {
    raw_of(element).ok_or_else(|| MacToolsError::Accessibility {
        call: call.to_string(),
        code: -1,
    })
}

#[derive(Debug, Default)]
pub struct MacAccessibility;

impl Accessibility for MacAccessibility {
    #[instrument(skip(self))]
    fn is_trusted(&self) -> bool {
        let granted = accessibility::application_is_trusted();
        debug!(granted, "Checked accessibility permission");
        granted
    }

    fn request_trust(&self) -> bool {
        info!("Requesting accessibility permission");
        accessibility::application_is_trusted_with_prompt()
    }

    fn element_at(&self, point: Point) -> Result<Option<Element>> {
        ensure_main_thread("AXUIElementCopyElementAtPosition");
        let Some(system) = AxElement::owned(unsafe { AXUIElementCreateSystemWide() }) else {
            return Ok(None);
        };
        let mut hit: AXUIElementRef = std::ptr::null();
        let code = unsafe {
            AXUIElementCopyElementAtPosition(system.raw(), point.x as f32, point.y as f32, &mut hit)
        };
        if code != kAXErrorSuccess {
            return Err(MacToolsError::Accessibility {
                call: "AXUIElementCopyElementAtPosition".to_string(),
                code,
            });
        }
        Ok(AxElement::owned(hit).map(Element::new))
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        element_attribute(raw_of(element)?, "AXParent")
    }

    fn url(&self, element: &Element) -> Option<String> {
        let value = copy_attribute(raw_of(element)?, "AXURL").ok()?;
        let result = url_string(value);
        cf_release(value);
        result
    }

    fn title(&self, element: &Element) -> Option<String> {
        string_attribute(raw_of(element)?, "AXTitle")
    }

    fn pid(&self, element: &Element) -> Option<Pid> {
        let mut pid = 0;
        let code = unsafe { AXUIElementGetPid(raw_of(element)?, &mut pid) };
        (code == kAXErrorSuccess && pid > 0).then_some(pid)
    }

    fn focused_window(&self, pid: Pid) -> Option<Element> {
        ensure_main_thread("AXFocusedWindow");
        let app = app_element(pid)?;
        element_attribute(app.raw(), "AXFocusedWindow")
    }

    fn windows(&self, pid: Pid) -> Vec<Element> {
        ensure_main_thread("AXWindows");
        let Some(app) = app_element(pid) else {
            return Vec::new();
        };
        let Ok(array) = copy_attribute(app.raw(), "AXWindows") else {
            return Vec::new();
        };
        if cf_type_id(array) != Some(unsafe { CFArrayGetTypeID() }) {
            cf_release(array);
            return Vec::new();
        }
        let count = unsafe { CFArrayGetCount(array as CFArrayRef) };
        let windows = (0..count)
            .filter_map(|i| {
                let raw = unsafe { CFArrayGetValueAtIndex(array as CFArrayRef, i) };
                AxElement::borrowed(raw).map(Element::new)
            })
            .collect();
        cf_release(array);
        windows
    }

    fn is_minimized(&self, window: &Element) -> Option<bool> {
        let value = copy_attribute(raw_of(window)?, "AXMinimized").ok()?;
        let minimized = (cf_type_id(value) == Some(unsafe { CFBooleanGetTypeID() }))
            .then(|| unsafe { CFBooleanGetValue(value) });
        cf_release(value);
        minimized
    }

    fn frame(&self, window: &Element) -> Option<Rect> {
        let raw = raw_of(window)?;
        let origin = position_of(raw)?;
        let size = size_of(raw)?;
        Some(Rect { origin, size })
    }

    fn window_id(&self, window: &Element) -> Option<WindowId> {
        let mut id = 0u32;
        let code = unsafe { _AXUIElementGetWindow(raw_of(window)?, &mut id) };
        (code == kAXErrorSuccess && id != 0).then_some(id)
    }

    fn set_position(&self, window: &Element, origin: Point) -> Result<()> {
        ensure_main_thread("set AXPosition");
        let raw = require(window, "set AXPosition")?;
        let point = CGPoint::new(origin.x, origin.y);
        let value = unsafe { AXValueCreate(kAXValueTypeCGPoint, &point as *const _ as *const c_void) };
        if value.is_null() {
            return Err(MacToolsError::Accessibility {
                call: "AXValueCreate(CGPoint)".to_string(),
                code: -1,
            });
        }
        let result = set_attribute(raw, "AXPosition", value);
        cf_release(value);
        result
    }

    fn set_size(&self, window: &Element, size: Size) -> Result<()> {
        ensure_main_thread("set AXSize");
        let raw = require(window, "set AXSize")?;
        let cg_size = CGSize::new(size.width, size.height);
        let value = unsafe { AXValueCreate(kAXValueTypeCGSize, &cg_size as *const _ as *const c_void) };
        if value.is_null() {
            return Err(MacToolsError::Accessibility {
                call: "AXValueCreate(CGSize)".to_string(),
                code: -1,
            });
        }
        let result = set_attribute(raw, "AXSize", value);
        cf_release(value);
        result
    }

    fn minimize(&self, window: &Element) -> Result<()> {
        ensure_main_thread("set AXMinimized");
        let raw = require(window, "set AXMinimized")?;
        set_attribute(raw, "AXMinimized", unsafe { kCFBooleanTrue })
    }
}
