//! Window server backend: CGWindowList enumeration, xcap capture, levels.

use std::ffi::c_void;

use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::display::{
    kCGNullWindowID, kCGWindowListExcludeDesktopElements, kCGWindowListOptionOnScreenOnly,
    CGWindowListCopyWindowInfo,
};
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::ImageEncoder;
use tracing::{debug, info, instrument};

use super::workspace::bundle_id_for_pid;
use crate::error::{MacToolsError, Result};
use crate::geometry::Rect;
use crate::platform::{
    CoordinateSpace, Pid, RawWindow, Thumbnail, ThumbnailSource, WindowId, WindowLevel,
    WindowServer,
};

type CGSConnectionID = i32;

// kCGFloatingWindowLevelKey / kCGNormalWindowLevelKey
const FLOATING_WINDOW_LEVEL_KEY: i32 = 5;
const NORMAL_WINDOW_LEVEL_KEY: i32 = 4;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGWindowLevelForKey(key: i32) -> i32;
    fn CGSMainConnectionID() -> CGSConnectionID;
    fn CGSSetWindowLevel(cid: CGSConnectionID, wid: u32, level: i32) -> i32;
}

type WindowDict = CFDictionary<CFString, CFType>;

fn number(dict: &WindowDict, key: &'static str) -> Option<i64> {
    let value = dict.find(CFString::from_static_string(key))?;
    let num: CFNumber = unsafe { CFNumber::wrap_under_get_rule(value.as_CFTypeRef() as _) };
    num.to_i64()
}

fn string(dict: &WindowDict, key: &'static str) -> Option<String> {
    let value = dict.find(CFString::from_static_string(key))?;
    let s: CFString = unsafe { CFString::wrap_under_get_rule(value.as_CFTypeRef() as _) };
    Some(s.to_string())
}

fn boolean(dict: &WindowDict, key: &'static str) -> bool {
    dict.find(CFString::from_static_string(key))
        .map(|value| {
            let b: CFBoolean = unsafe { CFBoolean::wrap_under_get_rule(value.as_CFTypeRef() as _) };
            bool::from(b)
        })
        .unwrap_or(false)
}

fn bounds(dict: &WindowDict) -> Option<Rect> {
    let value = dict.find(CFString::from_static_string("kCGWindowBounds"))?;
    let bounds: CFDictionary<CFString, CFNumber> =
        unsafe { CFDictionary::wrap_under_get_rule(value.as_CFTypeRef() as CFDictionaryRef) };
    let field = |key: &'static str| {
        bounds
            .find(CFString::from_static_string(key))
            .and_then(|n| n.to_f64())
    };
    Some(Rect::new(field("X")?, field("Y")?, field("Width")?, field("Height")?))
}

fn raw_window(dict: &WindowDict) -> Option<RawWindow> {
    let id = number(dict, "kCGWindowNumber")? as WindowId;
    let owner_pid = number(dict, "kCGWindowOwnerPID")? as Pid;
    Some(RawWindow {
        id,
        // Titles are only visible with screen recording permission
        title: string(dict, "kCGWindowName").unwrap_or_default(),
        owner_name: string(dict, "kCGWindowOwnerName").unwrap_or_default(),
        owner_pid,
        owner_bundle_id: bundle_id_for_pid(owner_pid),
        bounds: bounds(dict)?,
        space: CoordinateSpace::TopLeft,
        layer: number(dict, "kCGWindowLayer").unwrap_or(0) as i32,
        on_screen: boolean(dict, "kCGWindowIsOnscreen"),
    })
}

/// Scale `image` to `width`, keeping the aspect ratio, and encode as PNG
fn encode_thumbnail(image: &image::RgbaImage, width: u32) -> Result<Thumbnail> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(MacToolsError::Capture("empty capture".to_string()));
    }
    let height = ((h as f64) * (width as f64) / (w as f64)).round().max(1.0) as u32;
    let scaled = image::imageops::resize(image, width, height, FilterType::Triangle);

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&scaled, width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| MacToolsError::Capture(e.to_string()))?;

    Ok(Thumbnail {
        width,
        height,
        png,
        source: ThumbnailSource::Capture,
    })
}

#[derive(Debug, Default)]
pub struct MacWindowServer;

impl WindowServer for MacWindowServer {
    #[instrument(skip(self))]
    fn on_screen_windows(&self) -> Result<Vec<RawWindow>> {
        let list = unsafe {
            CGWindowListCopyWindowInfo(
                kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements,
                kCGNullWindowID,
            )
        };
        if list.is_null() {
            return Err(MacToolsError::Capture(
                "window list unavailable".to_string(),
            ));
        }
        let list: CFArray<*const c_void> =
            unsafe { CFArray::wrap_under_create_rule(list as CFArrayRef) };

        let windows: Vec<RawWindow> = list
            .iter()
            .filter_map(|item| {
                let dict: WindowDict =
                    unsafe { CFDictionary::wrap_under_get_rule(*item as CFDictionaryRef) };
                raw_window(&dict)
            })
            .collect();
        debug!(count = windows.len(), "Enumerated on-screen windows");
        Ok(windows)
    }

    fn capture_thumbnail(&self, id: WindowId, width: u32) -> Result<Thumbnail> {
        let windows = xcap::Window::all().map_err(|e| MacToolsError::Capture(e.to_string()))?;
        let window = windows
            .into_iter()
            .find(|w| w.id().ok() == Some(id))
            .ok_or_else(|| MacToolsError::Capture(format!("window {} not capturable", id)))?;
        let image = window
            .capture_image()
            .map_err(|e| MacToolsError::Capture(e.to_string()))?;
        encode_thumbnail(&image, width)
    }

    fn set_level(&self, id: WindowId, level: WindowLevel) -> Result<()> {
        let key = match level {
            WindowLevel::Floating => FLOATING_WINDOW_LEVEL_KEY,
            WindowLevel::Normal => NORMAL_WINDOW_LEVEL_KEY,
        };
        let code = unsafe {
            let cg_level = CGWindowLevelForKey(key);
            CGSSetWindowLevel(CGSMainConnectionID(), id, cg_level)
        };
        if code != 0 {
            return Err(MacToolsError::Accessibility {
                call: "CGSSetWindowLevel".to_string(),
                code,
            });
        }
        info!(window_id = id, ?level, "Window level set");
        Ok(())
    }
}
