//! Scripted fakes for every platform seam.

use std::any::Any;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::PresetSize;
use crate::error::{MacToolsError, Result};
use crate::executor::{Executor, Task, Timer};
use crate::geometry::{Point, Rect, Size};
use crate::inventory::WindowRecord;
use crate::platform::*;
use crate::shortcuts::ShortcutBinding;

#[derive(Debug)]
pub struct FakeElement(pub u64);

impl NativeElement for FakeElement {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn el(key: u64) -> Element {
    Element::new(FakeElement(key))
}

fn key(element: &Element) -> u64 {
    element.downcast_ref::<FakeElement>().map(|e| e.0).unwrap_or(u64::MAX)
}

pub fn app(pid: Pid, bundle_id: &str, name: &str) -> RunningApp {
    RunningApp {
        pid,
        bundle_id: Some(bundle_id.to_string()),
        name: Some(name.to_string()),
    }
}

// ============================================================================
// Accessibility
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum AxCall {
    SetPosition(u64, Point),
    SetSize(u64, Size),
    Minimize(u64),
}

#[derive(Default)]
pub struct AxState {
    pub trusted: bool,
    pub prompt_grants: bool,
    pub hit: Option<u64>,
    pub hit_fails: bool,
    pub parents: HashMap<u64, u64>,
    pub urls: HashMap<u64, String>,
    pub titles: HashMap<u64, String>,
    pub pids: HashMap<u64, Pid>,
    pub focused: HashMap<Pid, u64>,
    pub windows: HashMap<Pid, Vec<u64>>,
    pub minimized: HashMap<u64, bool>,
    pub frames: HashMap<u64, Rect>,
    pub window_ids: HashMap<u64, WindowId>,
    pub calls: Vec<AxCall>,
}

#[derive(Default)]
pub struct FakeAccessibility {
    pub state: Mutex<AxState>,
}

impl FakeAccessibility {
    /// Give `pid` an AX window `key` with the given frame and visibility.
    pub fn add_window(&self, pid: Pid, key: u64, frame: Rect, minimized: bool) {
        let mut s = self.state.lock();
        s.windows.entry(pid).or_default().push(key);
        s.pids.insert(key, pid);
        s.frames.insert(key, frame);
        s.minimized.insert(key, minimized);
    }

    pub fn calls(&self) -> Vec<AxCall> {
        self.state.lock().calls.clone()
    }
}

impl Accessibility for FakeAccessibility {
    fn is_trusted(&self) -> bool {
        self.state.lock().trusted
    }

    fn request_trust(&self) -> bool {
        let mut s = self.state.lock();
        if s.prompt_grants {
            s.trusted = true;
        }
        s.trusted
    }

    fn element_at(&self, _point: Point) -> Result<Option<Element>> {
        let s = self.state.lock();
        if s.hit_fails {
            return Err(MacToolsError::Accessibility {
                call: "AXUIElementCopyElementAtPosition".to_string(),
                code: -25204,
            });
        }
        Ok(s.hit.map(el))
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        self.state.lock().parents.get(&key(element)).copied().map(el)
    }

    fn url(&self, element: &Element) -> Option<String> {
        self.state.lock().urls.get(&key(element)).cloned()
    }

    fn title(&self, element: &Element) -> Option<String> {
        self.state.lock().titles.get(&key(element)).cloned()
    }

    fn pid(&self, element: &Element) -> Option<Pid> {
        self.state.lock().pids.get(&key(element)).copied()
    }

    fn focused_window(&self, pid: Pid) -> Option<Element> {
        self.state.lock().focused.get(&pid).copied().map(el)
    }

    fn windows(&self, pid: Pid) -> Vec<Element> {
        self.state
            .lock()
            .windows
            .get(&pid)
            .map(|keys| keys.iter().copied().map(el).collect())
            .unwrap_or_default()
    }

    fn is_minimized(&self, window: &Element) -> Option<bool> {
        self.state.lock().minimized.get(&key(window)).copied()
    }

    fn frame(&self, window: &Element) -> Option<Rect> {
        self.state.lock().frames.get(&key(window)).copied()
    }

    fn window_id(&self, window: &Element) -> Option<WindowId> {
        self.state.lock().window_ids.get(&key(window)).copied()
    }

    fn set_position(&self, window: &Element, origin: Point) -> Result<()> {
        let mut s = self.state.lock();
        let k = key(window);
        s.calls.push(AxCall::SetPosition(k, origin));
        if let Some(frame) = s.frames.get_mut(&k) {
            frame.origin = origin;
        }
        Ok(())
    }

    fn set_size(&self, window: &Element, size: Size) -> Result<()> {
        let mut s = self.state.lock();
        let k = key(window);
        s.calls.push(AxCall::SetSize(k, size));
        if let Some(frame) = s.frames.get_mut(&k) {
            frame.size = size;
        }
        Ok(())
    }

    fn minimize(&self, window: &Element) -> Result<()> {
        let mut s = self.state.lock();
        let k = key(window);
        s.calls.push(AxCall::Minimize(k));
        s.minimized.insert(k, true);
        Ok(())
    }
}

// ============================================================================
// Workspace
// ============================================================================

pub struct WorkspaceState {
    pub frontmost: Option<RunningApp>,
    pub apps: Vec<RunningApp>,
    pub bundle_urls: HashMap<String, String>,
    pub host: RunningApp,
    pub screen: Option<Rect>,
    pub icons: HashMap<Pid, Vec<u8>>,
    pub activated: Vec<Pid>,
    pub focus_restored: Vec<Pid>,
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self {
            frontmost: None,
            apps: Vec::new(),
            bundle_urls: HashMap::new(),
            host: app(1, "com.mactools.app", "MacTools"),
            screen: Some(Rect::new(0.0, 0.0, 1440.0, 900.0)),
            icons: HashMap::new(),
            activated: Vec::new(),
            focus_restored: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct FakeWorkspace {
    pub state: Mutex<WorkspaceState>,
}

impl Workspace for FakeWorkspace {
    fn frontmost_app(&self) -> Option<RunningApp> {
        self.state.lock().frontmost.clone()
    }

    fn running_apps(&self) -> Vec<RunningApp> {
        self.state.lock().apps.clone()
    }

    fn app_for_pid(&self, pid: Pid) -> Option<RunningApp> {
        self.state.lock().apps.iter().find(|a| a.pid == pid).cloned()
    }

    fn bundle_id_for_url(&self, url: &str) -> Option<String> {
        self.state.lock().bundle_urls.get(url).cloned()
    }

    fn activate(&self, pid: Pid) -> bool {
        self.state.lock().activated.push(pid);
        true
    }

    fn host(&self) -> RunningApp {
        self.state.lock().host.clone()
    }

    fn main_screen(&self) -> Option<Rect> {
        self.state.lock().screen
    }

    fn app_icon_png(&self, pid: Pid, _size: u32) -> Option<Vec<u8>> {
        self.state.lock().icons.get(&pid).cloned()
    }

    fn restore_focus(&self, pid: Pid) -> Result<()> {
        self.state.lock().focus_restored.push(pid);
        Ok(())
    }
}

// ============================================================================
// Window server
// ============================================================================

#[derive(Default)]
pub struct WindowServerState {
    pub unavailable: bool,
    pub windows: Vec<RawWindow>,
    pub capture_fails: HashSet<WindowId>,
    pub captures: Vec<WindowId>,
    pub levels: Vec<(WindowId, WindowLevel)>,
    pub level_fails: bool,
}

#[derive(Default)]
pub struct FakeWindowServer {
    pub state: Mutex<WindowServerState>,
}

pub fn raw_window(id: WindowId, pid: Pid, bundle: &str, title: &str, bounds: Rect) -> RawWindow {
    RawWindow {
        id,
        title: title.to_string(),
        owner_name: bundle.rsplit('.').next().unwrap_or(bundle).to_string(),
        owner_pid: pid,
        owner_bundle_id: Some(bundle.to_string()),
        bounds,
        space: CoordinateSpace::TopLeft,
        layer: 0,
        on_screen: true,
    }
}

impl WindowServer for FakeWindowServer {
    fn on_screen_windows(&self) -> Result<Vec<RawWindow>> {
        let s = self.state.lock();
        if s.unavailable {
            return Err(MacToolsError::PermissionDenied {
                capability: "Screen Recording",
            });
        }
        Ok(s.windows.clone())
    }

    fn capture_thumbnail(&self, id: WindowId, width: u32) -> Result<Thumbnail> {
        let mut s = self.state.lock();
        s.captures.push(id);
        if s.capture_fails.contains(&id) {
            return Err(MacToolsError::Capture(format!("window {} refused", id)));
        }
        Ok(Thumbnail {
            width,
            height: width / 2,
            png: vec![0x89, b'P', b'N', b'G'],
            source: ThumbnailSource::Capture,
        })
    }

    fn set_level(&self, id: WindowId, level: WindowLevel) -> Result<()> {
        let mut s = self.state.lock();
        if s.level_fails {
            return Err(MacToolsError::Accessibility {
                call: "CGSSetWindowLevel".to_string(),
                code: 1000,
            });
        }
        s.levels.push((id, level));
        Ok(())
    }
}

// ============================================================================
// Input taps
// ============================================================================

pub struct FakeTap {
    pub mask: EventMask,
    pub callback: TapCallback,
    pub enabled: bool,
    pub uninstalled: bool,
}

#[derive(Default)]
pub struct FakeInputTaps {
    pub deny: AtomicBool,
    pub taps: Mutex<Vec<Arc<Mutex<FakeTap>>>>,
}

struct FakeTapHandle(Arc<Mutex<FakeTap>>);

impl InstalledTap for FakeTapHandle {
    fn set_enabled(&mut self, enabled: bool) {
        self.0.lock().enabled = enabled;
    }

    fn uninstall(&mut self) {
        let mut tap = self.0.lock();
        tap.enabled = false;
        tap.uninstalled = true;
    }
}

impl FakeInputTaps {
    /// Deliver `event` to every live tap whose mask covers it.
    pub fn fire(&self, event: InputEvent) -> Vec<TapDisposition> {
        let taps = self.taps.lock().clone();
        taps.iter()
            .filter_map(|tap| {
                let mut tap = tap.lock();
                if tap.enabled && !tap.uninstalled && tap.mask.contains(event.mask()) {
                    Some((tap.callback)(&event))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.taps.lock().iter().filter(|t| !t.lock().uninstalled).count()
    }

    pub fn installed_count(&self) -> usize {
        self.taps.lock().len()
    }
}

impl InputTaps for FakeInputTaps {
    fn install(&self, mask: EventMask, callback: TapCallback) -> Result<Box<dyn InstalledTap>> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(MacToolsError::EventTap { feature: "test" });
        }
        let tap = Arc::new(Mutex::new(FakeTap {
            mask,
            callback,
            enabled: false,
            uninstalled: false,
        }));
        self.taps.lock().push(tap.clone());
        Ok(Box::new(FakeTapHandle(tap)))
    }
}

// ============================================================================
// Hot keys
// ============================================================================

pub struct FakeHotKey {
    pub binding: ShortcutBinding,
    pub callback: HotKeyCallback,
    pub active: Arc<AtomicBool>,
}

#[derive(Default)]
pub struct FakeHotKeys {
    pub deny: AtomicBool,
    pub registered: Mutex<Vec<FakeHotKey>>,
}

struct FakeRegistration(Arc<AtomicBool>);

impl RegisteredHotKey for FakeRegistration {
    fn unregister(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl FakeHotKeys {
    pub fn press(&self, binding: ShortcutBinding) -> usize {
        let callbacks: Vec<HotKeyCallback> = self
            .registered
            .lock()
            .iter()
            .filter(|h| h.binding == binding && h.active.load(Ordering::SeqCst))
            .map(|h| h.callback.clone())
            .collect();
        for cb in &callbacks {
            cb();
        }
        callbacks.len()
    }

    pub fn active_bindings(&self) -> Vec<ShortcutBinding> {
        self.registered
            .lock()
            .iter()
            .filter(|h| h.active.load(Ordering::SeqCst))
            .map(|h| h.binding)
            .collect()
    }

    pub fn register_calls(&self) -> usize {
        self.registered.lock().len()
    }
}

impl HotKeys for FakeHotKeys {
    fn register(
        &self,
        binding: &ShortcutBinding,
        on_press: HotKeyCallback,
    ) -> Result<Box<dyn RegisteredHotKey>> {
        if self.deny.load(Ordering::SeqCst) {
            return Err(MacToolsError::HotKey {
                shortcut: binding.display(),
                message: "AlreadyRegistered".to_string(),
            });
        }
        let active = Arc::new(AtomicBool::new(true));
        self.registered.lock().push(FakeHotKey {
            binding: *binding,
            callback: on_press,
            active: active.clone(),
        });
        Ok(Box::new(FakeRegistration(active)))
    }
}

// ============================================================================
// Picker
// ============================================================================

#[derive(Default)]
pub struct PickerState {
    pub window_choice: Option<usize>,
    /// Index into the offered sizes
    pub size_choice: Option<usize>,
    pub offered_windows: Vec<WindowRecord>,
    pub offered_sizes: Vec<PresetSize>,
}

#[derive(Default)]
pub struct FakePicker {
    pub state: Mutex<PickerState>,
}

impl Picker for FakePicker {
    fn pick_window(&self, windows: &[WindowRecord]) -> Option<usize> {
        let mut s = self.state.lock();
        s.offered_windows = windows.to_vec();
        s.window_choice
    }

    fn pick_size(&self, _window: &WindowRecord, sizes: &[PresetSize]) -> Option<PresetSize> {
        let mut s = self.state.lock();
        s.offered_sizes = sizes.to_vec();
        s.size_choice.and_then(|i| sizes.get(i).copied())
    }
}

// ============================================================================
// Bundle
// ============================================================================

pub struct Fakes {
    pub ax: Arc<FakeAccessibility>,
    pub workspace: Arc<FakeWorkspace>,
    pub window_server: Arc<FakeWindowServer>,
    pub taps: Arc<FakeInputTaps>,
    pub hot_keys: Arc<FakeHotKeys>,
    pub picker: Arc<FakePicker>,
    pub executor: Arc<ManualExecutor>,
}

impl Fakes {
    pub fn new() -> Self {
        let fakes = Self {
            ax: Arc::new(FakeAccessibility::default()),
            workspace: Arc::new(FakeWorkspace::default()),
            window_server: Arc::new(FakeWindowServer::default()),
            taps: Arc::new(FakeInputTaps::default()),
            hot_keys: Arc::new(FakeHotKeys::default()),
            picker: Arc::new(FakePicker::default()),
            executor: ManualExecutor::new(),
        };
        fakes.ax.state.lock().trusted = true;
        fakes
    }

    pub fn platform(&self) -> Platform {
        Platform {
            accessibility: self.ax.clone(),
            workspace: self.workspace.clone(),
            window_server: self.window_server.clone(),
            input_taps: self.taps.clone(),
            hot_keys: self.hot_keys.clone(),
            picker: self.picker.clone(),
            executor: self.executor.clone(),
        }
    }
}

// ============================================================================
// Executor
// ============================================================================

struct Scheduled {
    due: Duration,
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

// BinaryHeap is a max-heap; reverse so the earliest (due, seq) pops first
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Scheduled>,
}

/// Deterministic executor driven by a virtual clock.
///
/// Nothing runs until the owner calls [`ManualExecutor::run_until_idle`] or
/// [`ManualExecutor::advance`]. Background tasks run inline on the caller.
#[derive(Default)]
pub struct ManualExecutor {
    state: Mutex<ManualState>,
}

impl ManualExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn schedule(&self, delay: Duration, task: Task) {
        let mut state = self.state.lock();
        let due = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        state.queue.push(Scheduled { due, seq, task });
    }

    /// Pop the next task due at or before `deadline`, moving the clock to it.
    fn pop_due(&self, deadline: Duration) -> Option<Task> {
        let mut state = self.state.lock();
        let due = state.queue.peek().map(|s| s.due)?;
        if due > deadline {
            return None;
        }
        let next = state.queue.pop()?;
        if next.due > state.now {
            state.now = next.due;
        }
        Some(next.task)
    }

    /// Run every task that is due now, including ones they enqueue.
    pub fn run_until_idle(&self) {
        loop {
            let now = self.now();
            match self.pop_due(now) {
                Some(task) => task(),
                None => break,
            }
        }
    }

    /// Move the clock forward by `by`, running tasks in due order.
    pub fn advance(&self, by: Duration) {
        let deadline = self.now() + by;
        while let Some(task) = self.pop_due(deadline) {
            task();
        }
        let mut state = self.state.lock();
        if state.now < deadline {
            state.now = deadline;
        }
    }
}

impl Executor for ManualExecutor {
    fn dispatch(&self, task: Task) {
        self.schedule(Duration::ZERO, task);
    }

    fn dispatch_after(&self, delay: Duration, task: Task) -> Timer {
        let (timer, guarded) = Timer::guard(task);
        self.schedule(delay, guarded);
        timer
    }

    fn spawn_background(&self, task: Task) {
        task();
    }

    fn is_main_thread(&self) -> bool {
        true
    }
}
