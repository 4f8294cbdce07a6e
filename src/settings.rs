use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of integers a range may span.
pub const MAX_RANGE: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub start_number: i32,
    pub end_number: i32,
    pub draw_count: usize,
    pub allow_duplicates: bool,
    pub sound_enabled: bool,
}

pub const DEFAULT_SETTINGS: Settings = Settings {
    start_number: 1,
    end_number: 12,
    draw_count: 1,
    allow_duplicates: false,
    sound_enabled: true,
};

impl Default for Settings {
    fn default() -> Self {
        DEFAULT_SETTINGS
    }
}

/// Reasons a set of settings cannot be confirmed. The display strings are
/// shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("start number must be less than or equal to the end number")]
    StartAfterEnd,

    #[error("draw count must be at least 1")]
    NoDraws,

    #[error("draw count cannot exceed the range ({range})")]
    CountExceedsRange { range: i64 },

    #[error("range is too large ({range}); at most {} numbers are allowed", MAX_RANGE)]
    RangeTooLarge { range: i64 },
}

/// Check settings rule by rule; the first failing rule wins.
///
/// The draw count is bounded by the range even when duplicates are allowed,
/// matching [`crate::pool::can_draw`] which never lets a draw exceed it.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.start_number > settings.end_number {
        return Err(SettingsError::StartAfterEnd);
    }

    if settings.draw_count < 1 {
        return Err(SettingsError::NoDraws);
    }

    let range = settings.range();

    if settings.draw_count as i64 > range {
        return Err(SettingsError::CountExceedsRange { range });
    }

    if range > MAX_RANGE {
        return Err(SettingsError::RangeTooLarge { range });
    }

    Ok(())
}

impl Settings {
    /// Number of integers in `[start_number, end_number]`, zero when inverted.
    pub fn range(&self) -> i64 {
        crate::pool::total_range(self.start_number, self.end_number)
    }

    /// Largest draw count the current range supports.
    pub fn max_draw_count(&self) -> usize {
        self.range().clamp(1, MAX_RANGE) as usize
    }

    /// Apply a partial update. An edit that would put the start after the
    /// end swaps the two, so merged settings are always ordered.
    pub fn merge(&self, patch: &SettingsPatch) -> Self {
        let start = patch.start_number.unwrap_or(self.start_number);
        let end = patch.end_number.unwrap_or(self.end_number);

        Self {
            start_number: start.min(end),
            end_number: start.max(end),
            draw_count: patch.draw_count.unwrap_or(self.draw_count),
            allow_duplicates: patch.allow_duplicates.unwrap_or(self.allow_duplicates),
            sound_enabled: patch.sound_enabled.unwrap_or(self.sound_enabled),
        }
    }
}

/// Partial settings update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub start_number: Option<i32>,
    pub end_number: Option<i32>,
    pub draw_count: Option<usize>,
    pub allow_duplicates: Option<bool>,
    pub sound_enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn start_number(value: i32) -> Self {
        Self {
            start_number: Some(value),
            ..Self::default()
        }
    }

    pub fn end_number(value: i32) -> Self {
        Self {
            end_number: Some(value),
            ..Self::default()
        }
    }

    /// Edit the draw count, clamped to `[1, max_draw_count]`.
    pub fn draw_count(current: &Settings, value: usize) -> Self {
        Self {
            draw_count: Some(value.clamp(1, current.max_draw_count())),
            ..Self::default()
        }
    }

    pub fn allow_duplicates(value: bool) -> Self {
        Self {
            allow_duplicates: Some(value),
            ..Self::default()
        }
    }

    pub fn sound_enabled(value: bool) -> Self {
        Self {
            sound_enabled: Some(value),
            ..Self::default()
        }
    }
}
