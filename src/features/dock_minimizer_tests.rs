use super::*;
use crate::features::test_support::services;
use crate::geometry::Rect;
use crate::testing::{app, AxCall, Fakes};
use std::sync::atomic::Ordering;
use tempfile::TempDir;

const SAFARI: Pid = 42;

fn click() -> InputEvent {
    InputEvent::LeftMouseDown {
        location: Point::new(700.0, 880.0),
    }
}

/// Safari frontmost with two visible windows, window 11 focused, and the
/// cursor over Safari's Dock tile.
fn setup() -> (Fakes, TempDir, DockMinimizer) {
    let fakes = Fakes::new();
    let dir = TempDir::new().unwrap();
    {
        let mut ws = fakes.workspace.state.lock();
        ws.frontmost = Some(app(SAFARI, "com.apple.Safari", "Safari"));
        ws.apps.push(app(SAFARI, "com.apple.Safari", "Safari"));
    }
    {
        let mut ax = fakes.ax.state.lock();
        ax.hit = Some(100);
        ax.parents.insert(100, 101);
        ax.titles.insert(101, "Safari".to_string());
        ax.focused.insert(SAFARI, 11);
    }
    let frame = Rect::new(0.0, 0.0, 800.0, 600.0);
    fakes.ax.add_window(SAFARI, 10, frame, false);
    fakes.ax.add_window(SAFARI, 11, frame, false);
    fakes.ax.add_window(SAFARI, 12, frame, true);

    let mut minimizer = DockMinimizer::new(services(&fakes, &dir));
    minimizer.start().unwrap();
    (fakes, dir, minimizer)
}

#[test]
fn test_click_never_consumed() {
    let (fakes, _dir, _m) = setup();
    assert_eq!(fakes.taps.fire(click()), vec![TapDisposition::PassThrough]);
}

#[test]
fn test_unchanged_windows_minimize_focused_one() {
    let (fakes, _dir, _m) = setup();
    fakes.taps.fire(click());
    fakes.executor.run_until_idle();
    assert!(fakes.ax.calls().is_empty());

    fakes.executor.advance(Duration::from_millis(250));
    assert_eq!(fakes.ax.calls(), vec![AxCall::Minimize(11)]);
}

#[test]
fn test_new_window_blocks_minimize() {
    let (fakes, _dir, _m) = setup();
    fakes.taps.fire(click());
    fakes.executor.run_until_idle();

    // the click opened a new document window
    fakes
        .ax
        .add_window(SAFARI, 13, Rect::new(0.0, 0.0, 800.0, 600.0), false);
    fakes.executor.advance(Duration::from_millis(250));
    assert!(fakes.ax.calls().is_empty());
}

#[test]
fn test_no_minimize_when_app_switched() {
    let (fakes, _dir, _m) = setup();
    fakes.taps.fire(click());
    fakes.executor.run_until_idle();
    fakes.workspace.state.lock().frontmost = Some(app(7, "com.apple.Notes", "Notes"));
    fakes.executor.advance(Duration::from_millis(250));
    assert!(fakes.ax.calls().is_empty());
}

#[test]
fn test_click_on_other_tile_is_ignored() {
    let (fakes, _dir, _m) = setup();
    fakes.workspace.state.lock().frontmost = Some(app(7, "com.apple.Notes", "Notes"));
    fakes.taps.fire(click());
    fakes.executor.advance(Duration::from_secs(1));
    assert!(fakes.ax.calls().is_empty());
    assert_eq!(fakes.executor.pending(), 0);
}

#[test]
fn test_no_visible_windows_schedules_nothing() {
    let (fakes, _dir, _m) = setup();
    {
        let mut ax = fakes.ax.state.lock();
        ax.minimized.insert(10, true);
        ax.minimized.insert(11, true);
    }
    fakes.taps.fire(click());
    fakes.executor.run_until_idle();
    assert_eq!(fakes.executor.pending(), 0);
}

#[test]
fn test_host_and_dock_frontmost_are_ignored() {
    let (fakes, _dir, _m) = setup();
    for front in [
        app(1, "com.mactools.app", "MacTools"),
        app(2, "com.apple.dock", "Dock"),
    ] {
        fakes.workspace.state.lock().frontmost = Some(front.clone());
        fakes.ax.state.lock().titles.insert(101, front.name.clone().unwrap());
        fakes.workspace.state.lock().apps.push(front);
        fakes.taps.fire(click());
        fakes.executor.advance(Duration::from_secs(1));
    }
    assert!(fakes.ax.calls().is_empty());
}

#[test]
fn test_disabled_flag_makes_clicks_inert() {
    let (fakes, _dir, m) = setup();
    m.services
        .settings
        .lock()
        .update(|s| s.dock_toggle_enabled = false)
        .unwrap();
    fakes.taps.fire(click());
    fakes.executor.advance(Duration::from_secs(1));
    assert!(fakes.ax.calls().is_empty());
}

#[test]
fn test_stop_cancels_pending_recheck() {
    let (fakes, _dir, mut m) = setup();
    fakes.taps.fire(click());
    fakes.executor.run_until_idle();
    m.stop();
    fakes.executor.advance(Duration::from_millis(250));
    assert!(fakes.ax.calls().is_empty());
    assert_eq!(fakes.taps.live_count(), 0);
    assert!(!m.is_running());
}

#[test]
fn test_stop_drops_click_still_queued() {
    let (fakes, _dir, mut m) = setup();
    fakes.taps.fire(click());
    m.stop();
    fakes.executor.run_until_idle();
    fakes.executor.advance(Duration::from_millis(250));
    assert!(fakes.ax.calls().is_empty());
    assert_eq!(fakes.executor.pending(), 0);
}

#[test]
fn test_restart_after_stop_handles_new_clicks() {
    let (fakes, _dir, mut m) = setup();
    fakes.taps.fire(click());
    m.stop();
    fakes.executor.run_until_idle();
    m.start().unwrap();
    fakes.taps.fire(click());
    fakes.executor.run_until_idle();
    fakes.executor.advance(Duration::from_millis(250));
    assert_eq!(fakes.ax.calls(), vec![AxCall::Minimize(11)]);
}

#[test]
fn test_restart_installs_single_tap() {
    let (fakes, _dir, mut m) = setup();
    m.start().unwrap();
    assert_eq!(fakes.taps.live_count(), 1);
    m.restart().unwrap();
    assert_eq!(fakes.taps.live_count(), 1);
    assert_eq!(fakes.taps.installed_count(), 2);
}

#[test]
fn test_refused_tap_leaves_feature_stopped() {
    let fakes = Fakes::new();
    let dir = TempDir::new().unwrap();
    fakes.taps.deny.store(true, Ordering::SeqCst);
    let mut m = DockMinimizer::new(services(&fakes, &dir));
    assert!(m.start().is_err());
    assert!(!m.is_running());

    fakes.taps.deny.store(false, Ordering::SeqCst);
    assert!(m.start().is_ok());
    assert!(m.is_running());
}

#[test]
fn test_untrusted_records_permission_denial() {
    let (fakes, _dir, m) = setup();
    fakes.ax.state.lock().trusted = false;
    fakes.taps.fire(click());
    fakes.executor.advance(Duration::from_secs(1));
    assert!(fakes.ax.calls().is_empty());
    assert_eq!(
        m.services
            .diagnostics
            .count(crate::error::ErrorKind::PermissionDenied),
        1
    );
}
