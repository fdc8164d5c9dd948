//! Device and application metadata blob.

use crate::sanitize::{sanitize, FieldKind};
use crate::RECORD_SEPARATOR;

/// Bits reported in [`UserData::debug_flags`].
pub mod debug_flags {
    /// Built with debug assertions.
    pub const DEBUG: u32 = 1;
    /// Running on an emulator or simulator.
    pub const SIMULATOR: u32 = 2;
    /// Installed through an internal distribution channel.
    pub const INTERNAL: u32 = 4;
}

/// Host metadata attached to every record as one delimited string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserData {
    pub device: String,
    pub os: String,
    pub bundle_id: String,
    pub debug_flags: u32,
    pub version: String,
    pub language: String,
    /// Install time as unix seconds, empty when unknown.
    pub install_date: String,
}

impl UserData {
    /// Fill in what the current process can report about itself.
    pub fn detect() -> Self {
        let bundle_id = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_default();

        let mut flags = 0;
        if cfg!(debug_assertions) {
            flags |= debug_flags::DEBUG;
        }

        Self {
            device: std::env::consts::ARCH.to_string(),
            os: format!("{} ({})", std::env::consts::OS, std::env::consts::FAMILY),
            bundle_id,
            debug_flags: flags,
            version: String::new(),
            language: detect_language(),
            install_date: String::new(),
        }
    }

    /// Override the application identity fields.
    pub fn with_app(mut self, bundle_id: impl Into<String>, version: impl Into<String>) -> Self {
        self.bundle_id = bundle_id.into();
        self.version = version.into();
        self
    }

    /// Record-separated encoding:
    /// `device, os, bundleId, debugFlags, version, language, installDate`.
    pub fn encode(&self) -> String {
        let fields = [
            sanitize(&self.device, FieldKind::Plain),
            sanitize(&self.os, FieldKind::Plain),
            sanitize(&self.bundle_id, FieldKind::Plain),
            self.debug_flags.to_string(),
            sanitize(&self.version, FieldKind::Plain),
            sanitize(&self.language, FieldKind::Plain),
            sanitize(&self.install_date, FieldKind::Plain),
        ];
        fields.join(&RECORD_SEPARATOR.to_string())
    }
}

// LANG-style locales ("en_US.UTF-8") reduced to "en_US".
fn detect_language() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .map(|value| normalize_language(&value))
        .unwrap_or_default()
}

fn normalize_language(locale: &str) -> String {
    let base = locale.split(['.', '@']).next().unwrap_or_default();
    base.replace('-', "_")
}
