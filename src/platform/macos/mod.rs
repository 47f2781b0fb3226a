//! macOS implementations of the platform seams.

mod ax;
mod cf;
mod dispatch;
mod event_tap;
mod hotkeys;
mod picker;
mod window_server;
mod workspace;

use std::sync::Arc;

pub use ax::MacAccessibility;
pub use dispatch::{is_main_thread, GcdExecutor};
pub use event_tap::MacInputTaps;
pub use hotkeys::MacHotKeys;
pub use picker::AppleScriptPicker;
pub use window_server::MacWindowServer;
pub use workspace::MacWorkspace;

use crate::error::Result;
use crate::platform::Platform;

/// OS-facing calls must come from the main thread
pub(crate) fn ensure_main_thread(call: &str) {
    if !is_main_thread() {
        crate::debug_panic!("{} called off the main thread", call);
    }
}

/// Build the live platform. Must be called on the main thread.
pub fn macos_platform() -> Result<Platform> {
    Ok(Platform {
        accessibility: Arc::new(MacAccessibility),
        workspace: Arc::new(MacWorkspace),
        window_server: Arc::new(MacWindowServer),
        input_taps: Arc::new(MacInputTaps),
        hot_keys: Arc::new(MacHotKeys::new()?),
        picker: Arc::new(AppleScriptPicker),
        executor: Arc::new(GcdExecutor),
    })
}
