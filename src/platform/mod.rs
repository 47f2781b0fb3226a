//! OS service seams.
//!
//! The core never calls macOS directly. It talks to these traits, which the
//! `macos` backend implements with Accessibility, AppKit, CoreGraphics and
//! Carbon, and which the test fakes implement with scripted state.
//!
//! All geometry crossing these traits uses the global top-left origin unless a
//! type says otherwise.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::config::PresetSize;
use crate::error::Result;
use crate::executor::Executor;
use crate::geometry::{Point, Rect, Size};
use crate::inventory::WindowRecord;
use crate::shortcuts::ShortcutBinding;

#[cfg(target_os = "macos")]
pub mod macos;

pub type Pid = i32;

/// CGWindowID
pub type WindowId = u32;

/// A running application as the workspace reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningApp {
    pub pid: Pid,
    pub bundle_id: Option<String>,
    /// Localized name as shown in the Dock
    pub name: Option<String>,
}

// ============================================================================
// Accessibility
// ============================================================================

/// Backend-owned accessibility element.
///
/// Backends keep the native reference alive for as long as any clone exists.
pub trait NativeElement: Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

#[derive(Clone)]
pub struct Element(Arc<dyn NativeElement>);

impl Element {
    pub fn new(native: impl NativeElement + 'static) -> Self {
        Self(Arc::new(native))
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub trait Accessibility: Send + Sync {
    /// Whether this process may use the Accessibility API
    fn is_trusted(&self) -> bool;

    /// Show the system prompt; returns the trust state afterwards
    fn request_trust(&self) -> bool;

    /// Hit-test the system-wide element under `point`
    fn element_at(&self, point: Point) -> Result<Option<Element>>;

    fn parent(&self, element: &Element) -> Option<Element>;

    /// `AXURL`, as a URL string
    fn url(&self, element: &Element) -> Option<String>;

    /// `AXTitle`
    fn title(&self, element: &Element) -> Option<String>;

    fn pid(&self, element: &Element) -> Option<Pid>;

    fn focused_window(&self, pid: Pid) -> Option<Element>;

    /// `AXWindows` of the application object for `pid`
    fn windows(&self, pid: Pid) -> Vec<Element>;

    fn is_minimized(&self, window: &Element) -> Option<bool>;

    /// Position and size as one rectangle
    fn frame(&self, window: &Element) -> Option<Rect>;

    /// Stable window-server id behind an AX window, when the OS exposes one
    fn window_id(&self, window: &Element) -> Option<WindowId>;

    fn set_position(&self, window: &Element, origin: Point) -> Result<()>;

    fn set_size(&self, window: &Element, size: Size) -> Result<()>;

    fn minimize(&self, window: &Element) -> Result<()>;
}

// ============================================================================
// Workspace
// ============================================================================

pub trait Workspace: Send + Sync {
    fn frontmost_app(&self) -> Option<RunningApp>;

    fn running_apps(&self) -> Vec<RunningApp>;

    fn app_for_pid(&self, pid: Pid) -> Option<RunningApp>;

    /// Bundle identifier of the bundle a file URL points at
    fn bundle_id_for_url(&self, url: &str) -> Option<String>;

    fn activate(&self, pid: Pid) -> bool;

    /// This process
    fn host(&self) -> RunningApp;

    /// Main screen frame, top-left origin
    fn main_screen(&self) -> Option<Rect>;

    /// Application icon encoded as PNG
    fn app_icon_png(&self, pid: Pid, size: u32) -> Option<Vec<u8>>;

    /// Bring `pid` frontmost again through System Events
    fn restore_focus(&self, pid: Pid) -> Result<()>;
}

// ============================================================================
// Window server
// ============================================================================

/// Which way the y axis of a rectangle grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSpace {
    /// y grows downward from the top of the main screen (CoreGraphics, AX)
    #[default]
    TopLeft,
    /// y grows upward from the bottom of the main screen (Cocoa)
    BottomLeft,
}

/// One entry of the window server's on-screen list
#[derive(Debug, Clone, PartialEq)]
pub struct RawWindow {
    pub id: WindowId,
    pub title: String,
    pub owner_name: String,
    pub owner_pid: Pid,
    pub owner_bundle_id: Option<String>,
    pub bounds: Rect,
    pub space: CoordinateSpace,
    pub layer: i32,
    pub on_screen: bool,
}

/// A downscaled PNG image
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    pub source: ThumbnailSource,
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.png.len())
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailSource {
    Capture,
    AppIcon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowLevel {
    Normal,
    Floating,
}

pub trait WindowServer: Send + Sync {
    /// On-screen windows front to back. Err when the service is unavailable
    /// or screen recording is not granted.
    fn on_screen_windows(&self) -> Result<Vec<RawWindow>>;

    /// Capture `id` scaled to `width`, height proportional
    fn capture_thumbnail(&self, id: WindowId, width: u32) -> Result<Thumbnail>;

    fn set_level(&self, id: WindowId, level: WindowLevel) -> Result<()>;
}

// ============================================================================
// Input taps
// ============================================================================

bitflags! {
    /// Event classes a tap listens for
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventMask: u32 {
        const LEFT_MOUSE_DOWN = 1 << 0;
        const KEY_DOWN = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Cursor location, top-left origin
    LeftMouseDown { location: Point },
    KeyDown { key_code: u16, flags: u64 },
}

impl InputEvent {
    pub fn mask(&self) -> EventMask {
        match self {
            InputEvent::LeftMouseDown { .. } => EventMask::LEFT_MOUSE_DOWN,
            InputEvent::KeyDown { .. } => EventMask::KEY_DOWN,
        }
    }
}

/// What a tap callback wants done with the event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDisposition {
    PassThrough,
    Consume,
}

pub type TapCallback = Box<dyn FnMut(&InputEvent) -> TapDisposition + Send + 'static>;

/// Native tap resource; owned by an `EventTapHandle`
pub trait InstalledTap: Send {
    fn set_enabled(&mut self, enabled: bool);

    /// Disable and detach from the run loop. Must be idempotent.
    fn uninstall(&mut self);
}

pub trait InputTaps: Send + Sync {
    /// Fails when the OS refuses tap creation, usually for lack of
    /// Accessibility permission.
    fn install(&self, mask: EventMask, callback: TapCallback) -> Result<Box<dyn InstalledTap>>;
}

// ============================================================================
// Hot keys
// ============================================================================

pub type HotKeyCallback = Arc<dyn Fn() + Send + Sync + 'static>;

pub trait RegisteredHotKey: Send {
    /// Must be idempotent
    fn unregister(&mut self);
}

pub trait HotKeys: Send + Sync {
    /// Register a bound shortcut; `on_press` runs on the main thread.
    fn register(
        &self,
        binding: &ShortcutBinding,
        on_press: HotKeyCallback,
    ) -> Result<Box<dyn RegisteredHotKey>>;
}

// ============================================================================
// Picker
// ============================================================================

/// External collaborator presenting the window and size pickers.
///
/// Calls block until the user answers and are made off the main thread.
pub trait Picker: Send + Sync {
    fn pick_window(&self, windows: &[WindowRecord]) -> Option<usize>;

    fn pick_size(&self, window: &WindowRecord, sizes: &[PresetSize]) -> Option<PresetSize>;
}

/// Every seam the core needs, bundled for construction
#[derive(Clone)]
pub struct Platform {
    pub accessibility: Arc<dyn Accessibility>,
    pub workspace: Arc<dyn Workspace>,
    pub window_server: Arc<dyn WindowServer>,
    pub input_taps: Arc<dyn InputTaps>,
    pub hot_keys: Arc<dyn HotKeys>,
    pub picker: Arc<dyn Picker>,
    pub executor: Arc<dyn Executor>,
}
