use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use mactools::config::{settings_path, SettingsStore};
use mactools::presets::PresetStore;
use mactools::shortcuts::ShortcutBinding;
use mactools::{logging, Feature};

#[derive(Parser)]
#[command(name = "mactools", version, about = "Dock minimizer, window resizer and window pin for macOS")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the menu-bar agent (default)
    Run,
    /// Show permission state, feature flags and shortcuts
    Status,
    /// List the windows the resize picker would offer
    Windows,
    /// Manage preset window sizes
    Presets {
        #[command(subcommand)]
        action: PresetAction,
    },
    /// Rebind a shortcut, e.g. `mactools shortcut pin cmd+shift+t` or `none`
    Shortcut { feature: Feature, binding: String },
    /// Turn a feature on
    Enable { feature: Feature },
    /// Turn a feature off
    Disable { feature: Feature },
}

#[derive(Subcommand)]
enum PresetAction {
    List,
    Add { width: u32, height: u32 },
    Delete { index: usize },
    /// Move the preset at FROM so it lands before position TO
    Move { from: usize, to: usize },
    Update { id: Uuid, width: u32, height: u32 },
    Reset,
}

fn open_store() -> Arc<Mutex<SettingsStore>> {
    Arc::new(Mutex::new(SettingsStore::open(settings_path())))
}

fn print_presets(presets: &PresetStore) {
    for (i, preset) in presets.list().iter().enumerate() {
        println!("{:>3}  {:<12} {}", i, preset.label(), preset.id);
    }
}

fn run_presets(action: PresetAction) -> Result<()> {
    let presets = PresetStore::new(open_store());
    match action {
        PresetAction::List => {}
        PresetAction::Add { width, height } => {
            let preset = presets.add(width, height)?;
            println!("Added {}", preset.label());
        }
        PresetAction::Delete { index } => {
            let removed = presets.delete(index)?;
            println!("Deleted {}", removed.label());
        }
        PresetAction::Move { from, to } => presets.move_items(&BTreeSet::from([from]), to)?,
        PresetAction::Update { id, width, height } => {
            if !presets.update(id, width, height)? {
                bail!("no preset with id {}", id);
            }
        }
        PresetAction::Reset => presets.reset_to_default()?,
    }
    print_presets(&presets);
    Ok(())
}

fn run_shortcut(feature: Feature, binding: &str) -> Result<()> {
    let binding = ShortcutBinding::parse(binding)
        .with_context(|| format!("invalid shortcut '{}'", binding))?;
    let store = open_store();
    store
        .lock()
        .update(|s| feature.set_shortcut(s, binding))??;
    let shown = if binding.is_bound() {
        binding.display()
    } else {
        "none".to_string()
    };
    println!("{}: {}", feature.display_name(), shown);
    Ok(())
}

fn run_toggle(feature: Feature, enabled: bool) -> Result<()> {
    let store = open_store();
    store.lock().update(|s| feature.set_enabled(s, enabled))?;
    println!(
        "{} {}",
        feature.display_name(),
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

#[cfg(target_os = "macos")]
mod agent {
    use super::*;
    use cocoa::appkit::{NSApplication, NSApplicationActivationPolicy};
    use cocoa::base::nil;
    use mactools::platform::macos::macos_platform;
    use mactools::{MacTools, PermissionState};

    fn mactools() -> Result<MacTools> {
        let platform = macos_platform().context("failed to set up platform services")?;
        Ok(MacTools::new(platform, SettingsStore::open(settings_path())))
    }

    pub fn run() -> Result<()> {
        let app = unsafe { NSApplication::sharedApplication(nil) };
        unsafe {
            app.setActivationPolicy_(
                NSApplicationActivationPolicy::NSApplicationActivationPolicyAccessory,
            );
        }

        let mut tools = mactools()?;
        if tools.permission_state() == PermissionState::Denied {
            warn!("Accessibility permission missing, prompting");
            tools.request_permission();
        }
        for (feature, error) in tools.start_all() {
            warn!(feature = feature.id(), "{}", error.user_message());
        }
        info!(settings = %tools.settings_path().display(), "MacTools running");

        unsafe { app.run() };
        tools.stop_all();
        Ok(())
    }

    pub fn status() -> Result<()> {
        let tools = mactools()?;
        let permission = match tools.permission_state() {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "not granted",
        };
        println!("Accessibility: {}", permission);
        for status in tools.status() {
            let shortcut = match status.shortcut.as_deref() {
                None => String::new(),
                Some("") => "  (no shortcut)".to_string(),
                Some(s) => format!("  {}", s),
            };
            println!(
                "{:<16} {}{}",
                status.feature.display_name(),
                if status.enabled { "on" } else { "off" },
                shortcut
            );
        }
        Ok(())
    }

    pub fn windows() -> Result<()> {
        let tools = mactools()?;
        for window in tools.windows() {
            let b = window.bounds;
            println!(
                "{:>6}  {:<48} {:>5.0},{:<5.0} {:>5.0}×{:<5.0}",
                window.id,
                window.name,
                b.origin.x,
                b.origin.y,
                b.width(),
                b.height()
            );
        }
        Ok(())
    }
}

#[cfg(not(target_os = "macos"))]
mod agent {
    use super::*;

    pub fn run() -> Result<()> {
        bail!("mactools only runs on macOS")
    }

    pub fn status() -> Result<()> {
        run()
    }

    pub fn windows() -> Result<()> {
        run()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => agent::run(),
        Command::Status => agent::status(),
        Command::Windows => agent::windows(),
        Command::Presets { action } => run_presets(action),
        Command::Shortcut { feature, binding } => run_shortcut(feature, &binding),
        Command::Enable { feature } => run_toggle(feature, true),
        Command::Disable { feature } => run_toggle(feature, false),
    }
}
