//! Launcher-entry progress over the D-Bus session bus
//!
//! Speaks the `com.canonical.Unity.LauncherEntry` protocol understood by
//! Unity, KDE Plasma and other docks: a broadcast `Update` signal carrying
//! the application's desktop-entry URI and a property map with the
//! visibility flag and the progress fraction.

use super::{ProgressPublisher, PublishError};
use crate::aggregate::Aggregate;
use std::collections::HashMap;
use zbus::blocking::Connection;
use zbus::zvariant::Value;

const LAUNCHER_ENTRY_PATH: &str = "/com/canonical/unity/launcherentry";
const LAUNCHER_ENTRY_INTERFACE: &str = "com.canonical.Unity.LauncherEntry";

/// Overrides the desktop-entry file name derived from the executable, for
/// hosts whose .desktop file is not named after their binary.
const DESKTOP_ID_ENV: &str = "TASKBAR_PROGRESS_DESKTOP_ID";

pub(crate) struct BusSignalPublisher {
    connection: Connection,
    app_uri: String,
}

/// The desktop-entry file name identifying this process to the dock.
fn desktop_entry_name() -> Option<String> {
    if let Ok(name) = std::env::var(DESKTOP_ID_ENV) {
        if !name.is_empty() {
            return Some(name);
        }
    }
    executable_entry_name()
}

fn executable_entry_name() -> Option<String> {
    let exe = std::env::current_exe().ok()?;
    let stem = exe.file_stem()?.to_str()?;
    Some(format!("{stem}.desktop"))
}

impl ProgressPublisher for BusSignalPublisher {
    fn initialize() -> Result<Self, PublishError> {
        let Some(name) = desktop_entry_name() else {
            return Err(PublishError::IdentityUnavailable);
        };
        let connection = Connection::session()?;
        Ok(BusSignalPublisher {
            connection,
            app_uri: format!("application://{name}"),
        })
    }

    fn publish(&mut self, aggregate: Aggregate) -> Result<(), PublishError> {
        let mut properties: HashMap<&str, Value<'_>> = HashMap::new();
        properties.insert("progress-visible", Value::from(aggregate.visible));
        properties.insert("progress", Value::from(aggregate.fraction));

        // Broadcast signal; no destination, any interested dock picks it up.
        self.connection.emit_signal(
            None::<&str>,
            LAUNCHER_ENTRY_PATH,
            LAUNCHER_ENTRY_INTERFACE,
            "Update",
            &(self.app_uri.as_str(), properties),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desktop_entry_name_prefers_the_override() {
        // Process-wide env var; restore it afterwards to keep tests isolated.
        let previous = std::env::var(DESKTOP_ID_ENV).ok();
        std::env::set_var(DESKTOP_ID_ENV, "org.example.Host.desktop");

        assert_eq!(
            desktop_entry_name().as_deref(),
            Some("org.example.Host.desktop")
        );

        match previous {
            Some(value) => std::env::set_var(DESKTOP_ID_ENV, value),
            None => std::env::remove_var(DESKTOP_ID_ENV),
        }
    }

    #[test]
    fn test_executable_entry_name_is_derived_from_the_binary() {
        let name = executable_entry_name().expect("test binary has a name");
        assert!(name.ends_with(".desktop"));
        assert_ne!(name, ".desktop");
    }
}
