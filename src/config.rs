use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::theme::Theme;

/// Preferences that outlive a session. Draw history never lands here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub sound_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            sound_enabled: true,
        }
    }
}

/// Key-value access to persisted preferences. Reads never fail; a missing
/// or unreadable store yields the defaults.
pub trait PreferenceStore {
    fn load(&self) -> Preferences;
    fn save(&self, prefs: &Preferences) -> crate::Result<()>;

    fn theme(&self) -> Theme {
        self.load().theme
    }

    fn set_theme(&self, theme: Theme) -> crate::Result<()> {
        self.save(&Preferences {
            theme,
            ..self.load()
        })
    }

    fn sound_enabled(&self) -> bool {
        self.load().sound_enabled
    }

    fn set_sound_enabled(&self, enabled: bool) -> crate::Result<()> {
        self.save(&Preferences {
            sound_enabled: enabled,
            ..self.load()
        })
    }
}

#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "luckydraw") {
            pd.config_dir().join("preferences.json")
        } else {
            PathBuf::from("luckydraw_preferences.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FilePreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Preferences {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                log::warn!("ignoring unreadable {}: {err}", self.path.display());
                Preferences::default()
            }),
            Err(_) => Preferences::default(),
        }
    }

    fn save(&self, prefs: &Preferences) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(prefs)?)?;
        Ok(())
    }
}

/// Store that keeps preferences for the life of the process only.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    prefs: RefCell<Preferences>,
}

impl MemoryPreferenceStore {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            prefs: RefCell::new(prefs),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Preferences {
        *self.prefs.borrow()
    }

    fn save(&self, prefs: &Preferences) -> crate::Result<()> {
        *self.prefs.borrow_mut() = *prefs;
        Ok(())
    }
}
