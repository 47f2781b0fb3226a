//! AppleScript `choose from list` pickers.

use std::process::Command;

use tracing::{debug, warn};

use crate::config::PresetSize;
use crate::inventory::WindowRecord;
use crate::platform::Picker;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Labels are prefixed with their 1-based position so duplicates stay distinct
fn numbered(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("{}. {}", i + 1, label))
        .collect()
}

fn choose_script(prompt: &str, items: &[String]) -> String {
    let list = items.iter().map(|s| quote(s)).collect::<Vec<_>>().join(", ");
    format!(
        "choose from list {{{}}} with prompt {} with title \"MacTools\"",
        list,
        quote(prompt)
    )
}

/// Index of the chosen item, None when the user cancelled
fn parse_choice(output: &str) -> Option<usize> {
    let output = output.trim();
    if output.is_empty() || output == "false" {
        return None;
    }
    let (number, _) = output.split_once(". ")?;
    number.parse::<usize>().ok()?.checked_sub(1)
}

fn choose(prompt: &str, labels: &[String]) -> Option<usize> {
    if labels.is_empty() {
        return None;
    }
    let items = numbered(labels);
    let output = Command::new("osascript")
        .arg("-e")
        .arg(choose_script(prompt, &items))
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let stdout = String::from_utf8_lossy(&out.stdout);
            debug!(choice = %stdout.trim(), "Picker answered");
            parse_choice(&stdout).filter(|&i| i < labels.len())
        }
        Ok(out) => {
            // Cancel also exits non-zero on some macOS versions
            debug!(stderr = %String::from_utf8_lossy(&out.stderr), "Picker dismissed");
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to run picker");
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct AppleScriptPicker;

impl Picker for AppleScriptPicker {
    fn pick_window(&self, windows: &[WindowRecord]) -> Option<usize> {
        let labels: Vec<String> = windows.iter().map(|w| w.name.clone()).collect();
        choose("Choose a window to resize", &labels)
    }

    fn pick_size(&self, window: &WindowRecord, sizes: &[PresetSize]) -> Option<PresetSize> {
        let labels: Vec<String> = sizes.iter().map(PresetSize::label).collect();
        let prompt = format!("Resize {} to", window.name);
        choose(&prompt, &labels).and_then(|i| sizes.get(i).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"Say "hi""#), r#""Say \"hi\"""#);
    }

    #[test]
    fn test_choice_round_trip() {
        let items = numbered(&["Safari - Apple".to_string(), "Notes - 1. todo".to_string()]);
        assert_eq!(parse_choice(&format!("{}\n", items[1])), Some(1));
        assert_eq!(parse_choice("false\n"), None);
        assert_eq!(parse_choice(""), None);
    }

    #[test]
    fn test_script_lists_items() {
        let script = choose_script("Pick", &["1. A".to_string(), "2. B".to_string()]);
        assert!(script.starts_with("choose from list {\"1. A\", \"2. B\"}"));
    }
}
