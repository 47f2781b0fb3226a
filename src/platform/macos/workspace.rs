//! NSWorkspace / NSRunningApplication backend.

use std::ffi::CStr;
use std::process::Command;

use cocoa::base::{id, nil};
use cocoa::foundation::{NSRect, NSSize, NSString};
use objc::{class, msg_send, sel, sel_impl};
use tracing::{debug, error, instrument};

use super::ensure_main_thread;
use crate::error::{MacToolsError, Result};
use crate::geometry::Rect;
use crate::platform::{Pid, RunningApp, Workspace};

const NS_APPLICATION_ACTIVATE_IGNORING_OTHER_APPS: u64 = 1 << 1;
const NS_PNG_FILE_TYPE: u64 = 4;

unsafe fn ns_string_to_string(ns: id) -> Option<String> {
    if ns == nil {
        return None;
    }
    let utf8: *const std::os::raw::c_char = msg_send![ns, UTF8String];
    if utf8.is_null() {
        return None;
    }
    CStr::from_ptr(utf8).to_str().ok().map(str::to_string)
}

unsafe fn running_app(app: id) -> Option<RunningApp> {
    if app == nil {
        return None;
    }
    let pid: i32 = msg_send![app, processIdentifier];
    let bundle: id = msg_send![app, bundleIdentifier];
    let name: id = msg_send![app, localizedName];
    Some(RunningApp {
        pid,
        bundle_id: ns_string_to_string(bundle),
        name: ns_string_to_string(name),
    })
}

unsafe fn ns_running_app(pid: Pid) -> id {
    msg_send![class!(NSRunningApplication), runningApplicationWithProcessIdentifier: pid]
}

/// Bundle identifier of a running process
pub(super) fn bundle_id_for_pid(pid: Pid) -> Option<String> {
    unsafe {
        let app = ns_running_app(pid);
        if app == nil {
            return None;
        }
        let bundle: id = msg_send![app, bundleIdentifier];
        ns_string_to_string(bundle)
    }
}

unsafe fn shared_workspace() -> id {
    msg_send![class!(NSWorkspace), sharedWorkspace]
}

/// Run an AppleScript through osascript, waiting for it to finish
fn run_applescript(script: &str) -> Result<()> {
    debug!(script = %script, "Executing AppleScript");
    let output = Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()
        .map_err(|e| MacToolsError::AppleScript(e.to_string()))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(stderr = %stderr, "AppleScript execution failed");
        Err(MacToolsError::AppleScript(stderr.trim().to_string()))
    }
}

fn focus_script(pid: Pid) -> String {
    format!(
        "tell application \"System Events\" to set frontmost of (first process whose unix id is {}) to true",
        pid
    )
}

#[derive(Debug, Default)]
pub struct MacWorkspace;

impl Workspace for MacWorkspace {
    fn frontmost_app(&self) -> Option<RunningApp> {
        unsafe {
            let app: id = msg_send![shared_workspace(), frontmostApplication];
            running_app(app)
        }
    }

    fn running_apps(&self) -> Vec<RunningApp> {
        unsafe {
            let apps: id = msg_send![shared_workspace(), runningApplications];
            if apps == nil {
                return Vec::new();
            }
            let count: usize = msg_send![apps, count];
            (0..count)
                .filter_map(|i| {
                    let app: id = msg_send![apps, objectAtIndex: i];
                    running_app(app)
                })
                .collect()
        }
    }

    fn app_for_pid(&self, pid: Pid) -> Option<RunningApp> {
        unsafe { running_app(ns_running_app(pid)) }
    }

    fn bundle_id_for_url(&self, url: &str) -> Option<String> {
        unsafe {
            let ns_url_string = NSString::alloc(nil).init_str(url);
            let ns_url: id = msg_send![class!(NSURL), URLWithString: ns_url_string];
            let _: () = msg_send![ns_url_string, release];
            if ns_url == nil {
                return None;
            }
            let bundle: id = msg_send![class!(NSBundle), bundleWithURL: ns_url];
            if bundle == nil {
                return None;
            }
            let identifier: id = msg_send![bundle, bundleIdentifier];
            ns_string_to_string(identifier)
        }
    }

    #[instrument(skip(self))]
    fn activate(&self, pid: Pid) -> bool {
        ensure_main_thread("activateWithOptions");
        unsafe {
            let app = ns_running_app(pid);
            if app == nil {
                return false;
            }
            let ok: bool = msg_send![app, activateWithOptions: NS_APPLICATION_ACTIVATE_IGNORING_OTHER_APPS];
            ok
        }
    }

    fn host(&self) -> RunningApp {
        unsafe {
            let app: id = msg_send![class!(NSRunningApplication), currentApplication];
            running_app(app).unwrap_or(RunningApp {
                pid: std::process::id() as Pid,
                bundle_id: None,
                name: None,
            })
        }
    }

    fn main_screen(&self) -> Option<Rect> {
        unsafe {
            let screen: id = msg_send![class!(NSScreen), mainScreen];
            if screen == nil {
                return None;
            }
            let frame: NSRect = msg_send![screen, frame];
            let visible: NSRect = msg_send![screen, visibleFrame];
            let cocoa = Rect::new(
                visible.origin.x,
                visible.origin.y,
                visible.size.width,
                visible.size.height,
            );
            Some(cocoa.flipped(frame.size.height))
        }
    }

    fn app_icon_png(&self, pid: Pid, size: u32) -> Option<Vec<u8>> {
        unsafe {
            let app = ns_running_app(pid);
            if app == nil {
                return None;
            }
            let icon: id = msg_send![app, icon];
            if icon == nil {
                return None;
            }
            let _: () = msg_send![icon, setSize: NSSize::new(size as f64, size as f64)];

            let tiff: id = msg_send![icon, TIFFRepresentation];
            if tiff == nil {
                return None;
            }
            let bitmap: id = msg_send![class!(NSBitmapImageRep), imageRepWithData: tiff];
            if bitmap == nil {
                return None;
            }
            let props: id = msg_send![class!(NSDictionary), dictionary];
            let png: id = msg_send![bitmap, representationUsingType: NS_PNG_FILE_TYPE properties: props];
            if png == nil {
                return None;
            }
            let length: usize = msg_send![png, length];
            let bytes: *const u8 = msg_send![png, bytes];
            if bytes.is_null() || length == 0 {
                return None;
            }
            Some(std::slice::from_raw_parts(bytes, length).to_vec())
        }
    }

    fn restore_focus(&self, pid: Pid) -> Result<()> {
        run_applescript(&focus_script(pid))
    }
}
