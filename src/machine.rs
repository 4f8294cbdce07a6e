//! Draw lifecycle state machine.
//!
//! State changes go through [`transition`], a pure function from the current
//! state and an event to the next state. [`DrawMachine`] owns one state value
//! and exposes an entry point per event plus derived reads.
//!
//! Events that are not legal in the current phase leave the state untouched.

use crate::pool;
use crate::settings::{validate_settings, Settings, SettingsError, SettingsPatch};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    #[default]
    Initial,
    Settings,
    Ready,
    Drawing,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawState {
    pub phase: Phase,
    pub settings: Settings,
    pub settings_open: bool,
    /// Settings in effect when the dialog was opened, restored on close.
    pub saved_settings: Option<Settings>,
    pub history: Vec<i32>,
    /// Mirrors `history` while duplicates are disallowed, otherwise empty.
    pub excluded_numbers: Vec<i32>,
    pub current_result: Vec<i32>,
    pub display_number: Option<i32>,
    pub is_animating: bool,
}

impl Default for DrawState {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

impl DrawState {
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            phase: Phase::Initial,
            settings,
            settings_open: false,
            saved_settings: None,
            history: Vec::new(),
            excluded_numbers: Vec::new(),
            current_result: Vec::new(),
            display_number: None,
            is_animating: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawEvent {
    OpenSettings,
    CloseSettings,
    UpdateSettings(SettingsPatch),
    ConfirmSettings,
    StartDraw,
    UpdateDisplay(i32),
    FinishDraw(Vec<i32>),
    RestoreNumber(i32),
    DrawAgain,
    ResetAll,
}

impl DrawEvent {
    pub fn is_allowed_in(&self, phase: Phase) -> bool {
        match self {
            DrawEvent::OpenSettings => {
                matches!(phase, Phase::Initial | Phase::Ready | Phase::Result)
            }
            DrawEvent::CloseSettings
            | DrawEvent::UpdateSettings(_)
            | DrawEvent::ConfirmSettings => phase == Phase::Settings,
            DrawEvent::StartDraw => phase == Phase::Ready,
            DrawEvent::UpdateDisplay(_) | DrawEvent::FinishDraw(_) => phase == Phase::Drawing,
            DrawEvent::RestoreNumber(_) => matches!(phase, Phase::Ready | Phase::Result),
            DrawEvent::DrawAgain => phase == Phase::Result,
            DrawEvent::ResetAll => true,
        }
    }
}

pub fn transition(state: DrawState, event: DrawEvent) -> DrawState {
    if !event.is_allowed_in(state.phase) {
        log::debug!("ignoring {:?} in phase {}", event, state.phase);
        return state;
    }

    match event {
        DrawEvent::OpenSettings => DrawState {
            phase: Phase::Settings,
            settings_open: true,
            saved_settings: Some(state.settings),
            ..state
        },

        DrawEvent::CloseSettings => DrawState {
            phase: if state.history.is_empty() {
                Phase::Initial
            } else {
                Phase::Result
            },
            settings: state.saved_settings.unwrap_or(state.settings),
            settings_open: false,
            saved_settings: None,
            ..state
        },

        DrawEvent::UpdateSettings(patch) => DrawState {
            settings: state.settings.merge(&patch),
            ..state
        },

        DrawEvent::ConfirmSettings => match validate_settings(&state.settings) {
            Ok(()) => {
                log::info!(
                    "settings confirmed: {}..={} x{} (duplicates: {})",
                    state.settings.start_number,
                    state.settings.end_number,
                    state.settings.draw_count,
                    state.settings.allow_duplicates
                );
                DrawState {
                    phase: Phase::Ready,
                    settings_open: false,
                    saved_settings: None,
                    history: Vec::new(),
                    excluded_numbers: Vec::new(),
                    current_result: Vec::new(),
                    ..state
                }
            }
            Err(err) => {
                log::debug!("settings rejected: {err}");
                state
            }
        },

        DrawEvent::StartDraw => DrawState {
            phase: Phase::Drawing,
            is_animating: true,
            current_result: Vec::new(),
            ..state
        },

        DrawEvent::UpdateDisplay(n) => DrawState {
            display_number: Some(n),
            ..state
        },

        DrawEvent::FinishDraw(numbers) => {
            log::info!("drew {:?}", numbers);
            let mut history = state.history;
            history.extend_from_slice(&numbers);

            // numbers were sampled against the exclusion set, so no dedup is needed
            let mut excluded_numbers = state.excluded_numbers;
            if !state.settings.allow_duplicates {
                excluded_numbers.extend_from_slice(&numbers);
            }

            DrawState {
                phase: Phase::Result,
                history,
                excluded_numbers,
                current_result: numbers,
                display_number: None,
                is_animating: false,
                ..state
            }
        }

        // every occurrence of the value goes, not just the one picked
        DrawEvent::RestoreNumber(n) => {
            let mut history = state.history;
            history.retain(|&h| h != n);
            let mut excluded_numbers = state.excluded_numbers;
            excluded_numbers.retain(|&e| e != n);

            DrawState {
                history,
                excluded_numbers,
                ..state
            }
        }

        DrawEvent::DrawAgain => DrawState {
            phase: Phase::Ready,
            current_result: Vec::new(),
            display_number: None,
            ..state
        },

        DrawEvent::ResetAll => {
            log::info!("reset to defaults");
            DrawState::default()
        }
    }
}

/// Remaining-numbers summary for the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub remaining: i64,
    pub total: i64,
    pub unlimited: bool,
}

impl PoolStatus {
    pub fn is_low(&self) -> bool {
        !self.unlimited && self.remaining > 0 && self.remaining <= 3
    }

    pub fn is_exhausted(&self) -> bool {
        !self.unlimited && self.remaining == 0
    }
}

#[derive(Debug, Default)]
pub struct DrawMachine {
    state: DrawState,
}

impl DrawMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start in `Initial` with the given settings pre-filled in the dialog.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            state: DrawState::with_settings(settings),
        }
    }

    pub fn dispatch(&mut self, event: DrawEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state, event);
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn settings_open(&self) -> bool {
        self.state.settings_open
    }

    pub fn history(&self) -> &[i32] {
        &self.state.history
    }

    pub fn excluded_numbers(&self) -> &[i32] {
        &self.state.excluded_numbers
    }

    pub fn current_result(&self) -> &[i32] {
        &self.state.current_result
    }

    pub fn display_number(&self) -> Option<i32> {
        self.state.display_number
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_animating
    }

    pub fn open_settings(&mut self) {
        self.dispatch(DrawEvent::OpenSettings)
    }

    pub fn close_settings(&mut self) {
        self.dispatch(DrawEvent::CloseSettings)
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.dispatch(DrawEvent::UpdateSettings(patch))
    }

    pub fn confirm_settings(&mut self) {
        self.dispatch(DrawEvent::ConfirmSettings)
    }

    pub fn start_draw(&mut self) {
        self.dispatch(DrawEvent::StartDraw)
    }

    pub fn update_display(&mut self, n: i32) {
        self.dispatch(DrawEvent::UpdateDisplay(n))
    }

    pub fn finish_draw(&mut self, numbers: Vec<i32>) {
        self.dispatch(DrawEvent::FinishDraw(numbers))
    }

    pub fn restore_number(&mut self, n: i32) {
        self.dispatch(DrawEvent::RestoreNumber(n))
    }

    pub fn draw_again(&mut self) {
        self.dispatch(DrawEvent::DrawAgain)
    }

    pub fn reset_all(&mut self) {
        self.dispatch(DrawEvent::ResetAll)
    }

    pub fn total_range(&self) -> i64 {
        self.state.settings.range()
    }

    pub fn remaining_count(&self) -> i64 {
        let s = &self.state.settings;
        pool::remaining_count(
            s.start_number,
            s.end_number,
            &self.state.excluded_numbers,
            s.allow_duplicates,
        )
    }

    pub fn can_draw_now(&self) -> bool {
        let s = &self.state.settings;
        pool::can_draw(
            s.start_number,
            s.end_number,
            s.draw_count,
            &self.state.excluded_numbers,
            s.allow_duplicates,
        )
    }

    pub fn validation(&self) -> Result<(), SettingsError> {
        validate_settings(&self.state.settings)
    }

    pub fn pool_status(&self) -> PoolStatus {
        PoolStatus {
            remaining: self.remaining_count(),
            total: self.total_range(),
            unlimited: self.state.settings.allow_duplicates,
        }
    }

    /// History entries can be restored only when draws exclude earlier results.
    pub fn can_restore(&self) -> bool {
        !self.state.settings.allow_duplicates
            && matches!(self.state.phase, Phase::Ready | Phase::Result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_SETTINGS;
    use assert_matches::assert_matches;

    fn ready_machine(patch: SettingsPatch) -> DrawMachine {
        let mut m = DrawMachine::new();
        m.open_settings();
        m.update_settings(patch);
        m.confirm_settings();
        assert_eq!(m.phase(), Phase::Ready);
        m
    }

    fn drawn(m: &mut DrawMachine, numbers: &[i32]) {
        m.start_draw();
        m.finish_draw(numbers.to_vec());
    }

    #[test]
    fn test_initial_state() {
        let m = DrawMachine::new();
        assert_eq!(m.phase(), Phase::Initial);
        assert_eq!(*m.settings(), DEFAULT_SETTINGS);
        assert!(!m.settings_open());
        assert!(m.history().is_empty());
        assert!(m.excluded_numbers().is_empty());
        assert!(m.current_result().is_empty());
        assert_eq!(m.display_number(), None);
        assert!(!m.is_animating());
    }

    #[test]
    fn test_full_cycle_scenario() {
        let mut m = DrawMachine::new();

        m.open_settings();
        assert_eq!(m.phase(), Phase::Settings);
        assert!(m.settings_open());

        m.confirm_settings();
        assert_eq!(m.phase(), Phase::Ready);
        assert!(m.history().is_empty());
        assert!(!m.settings_open());

        m.start_draw();
        assert_eq!(m.phase(), Phase::Drawing);
        assert!(m.is_animating());

        m.update_display(9);
        assert_eq!(m.display_number(), Some(9));
        assert_eq!(m.phase(), Phase::Drawing);

        m.finish_draw(vec![5]);
        assert_eq!(m.phase(), Phase::Result);
        assert_eq!(m.history(), &[5]);
        assert_eq!(m.excluded_numbers(), &[5]);
        assert_eq!(m.current_result(), &[5]);
        assert!(!m.is_animating());
        assert_eq!(m.display_number(), None);

        m.restore_number(5);
        assert!(m.history().is_empty());
        assert!(m.excluded_numbers().is_empty());
        assert_eq!(m.phase(), Phase::Result);
    }

    #[test]
    fn test_close_settings_without_history_returns_to_initial() {
        let mut m = DrawMachine::new();
        m.open_settings();
        m.close_settings();
        assert_eq!(m.phase(), Phase::Initial);
        assert!(!m.settings_open());
    }

    #[test]
    fn test_close_settings_with_history_returns_to_result() {
        let mut m = ready_machine(SettingsPatch::default());
        drawn(&mut m, &[3]);
        m.draw_again();
        m.open_settings();
        m.close_settings();
        assert_eq!(m.phase(), Phase::Result);
        assert_eq!(m.history(), &[3]);
    }

    #[test]
    fn test_close_settings_discards_unconfirmed_edits() {
        let mut m = ready_machine(SettingsPatch::default());
        drawn(&mut m, &[3]);
        m.open_settings();
        m.update_settings(SettingsPatch::allow_duplicates(true));
        assert!(m.settings().allow_duplicates);
        m.close_settings();
        assert!(!m.settings().allow_duplicates);
        assert_eq!(m.excluded_numbers(), &[3]);
    }

    #[test]
    fn test_update_settings_merges_partial_fields() {
        let mut m = DrawMachine::new();
        m.open_settings();
        m.update_settings(SettingsPatch::end_number(45));
        m.update_settings(SettingsPatch {
            draw_count: Some(6),
            allow_duplicates: Some(true),
            ..SettingsPatch::default()
        });
        assert_eq!(m.phase(), Phase::Settings);
        assert_eq!(m.settings().start_number, 1);
        assert_eq!(m.settings().end_number, 45);
        assert_eq!(m.settings().draw_count, 6);
        assert!(m.settings().allow_duplicates);
    }

    #[test]
    fn test_confirm_clears_previous_draws() {
        let mut m = ready_machine(SettingsPatch::default());
        drawn(&mut m, &[4]);
        m.open_settings();
        m.update_settings(SettingsPatch::end_number(20));
        m.confirm_settings();
        assert_eq!(m.phase(), Phase::Ready);
        assert!(m.history().is_empty());
        assert!(m.excluded_numbers().is_empty());
        assert!(m.current_result().is_empty());
        assert_eq!(m.settings().end_number, 20);
    }

    #[test]
    fn test_confirm_rejects_invalid_settings() {
        let mut m = DrawMachine::new();
        m.open_settings();
        m.update_settings(SettingsPatch {
            end_number: Some(5),
            draw_count: Some(10),
            ..SettingsPatch::default()
        });
        let before = m.state().clone();
        m.confirm_settings();
        assert_eq!(*m.state(), before);
        assert_eq!(m.phase(), Phase::Settings);
        assert_matches!(m.validation(), Err(SettingsError::CountExceedsRange { range: 5 }));
    }

    #[test]
    fn test_start_draw_clears_current_result() {
        let mut m = ready_machine(SettingsPatch::default());
        drawn(&mut m, &[7]);
        m.draw_again();
        assert!(m.current_result().is_empty());
        m.start_draw();
        assert!(m.current_result().is_empty());
        assert_eq!(m.phase(), Phase::Drawing);
    }

    #[test]
    fn test_duplicates_allowed_keeps_exclusions_empty() {
        let mut m = ready_machine(SettingsPatch::allow_duplicates(true));
        drawn(&mut m, &[2, 2]);
        assert_eq!(m.history(), &[2, 2]);
        assert!(m.excluded_numbers().is_empty());
        assert_eq!(m.remaining_count(), 12);
        assert!(!m.can_restore());
    }

    #[test]
    fn test_history_accumulates_across_draws() {
        let mut m = ready_machine(SettingsPatch::draw_count(&DEFAULT_SETTINGS, 2));
        drawn(&mut m, &[1, 9]);
        m.draw_again();
        drawn(&mut m, &[4, 6]);
        assert_eq!(m.history(), &[1, 9, 4, 6]);
        assert_eq!(m.excluded_numbers(), &[1, 9, 4, 6]);
        assert_eq!(m.current_result(), &[4, 6]);
        assert_eq!(m.remaining_count(), 8);
    }

    #[test]
    fn test_restore_removes_every_occurrence() {
        let mut state = DrawState {
            phase: Phase::Result,
            history: vec![3, 5, 3, 8],
            excluded_numbers: vec![3, 5, 3, 8],
            ..DrawState::default()
        };
        state = transition(state, DrawEvent::RestoreNumber(3));
        assert_eq!(state.history, vec![5, 8]);
        assert_eq!(state.excluded_numbers, vec![5, 8]);
    }

    #[test]
    fn test_restore_allowed_in_ready() {
        let mut m = ready_machine(SettingsPatch::default());
        drawn(&mut m, &[11]);
        m.draw_again();
        assert!(m.can_restore());
        m.restore_number(11);
        assert!(m.history().is_empty());
        assert_eq!(m.phase(), Phase::Ready);
    }

    #[test]
    fn test_draw_again_returns_to_ready() {
        let mut m = ready_machine(SettingsPatch::default());
        drawn(&mut m, &[2]);
        m.draw_again();
        assert_eq!(m.phase(), Phase::Ready);
        assert!(m.current_result().is_empty());
        assert_eq!(m.display_number(), None);
        assert_eq!(m.history(), &[2]);
    }

    #[test]
    fn test_reset_all_from_any_phase() {
        for steps in 0..4 {
            let mut m = ready_machine(SettingsPatch::end_number(30));
            if steps > 0 {
                m.start_draw();
            }
            if steps > 1 {
                m.finish_draw(vec![17]);
            }
            if steps > 2 {
                m.draw_again();
            }
            m.reset_all();
            assert_eq!(*m.state(), DrawState::default());
        }
    }

    #[test]
    fn test_illegal_events_are_ignored() {
        let mut m = DrawMachine::new();
        let initial = m.state().clone();

        m.start_draw();
        m.finish_draw(vec![1]);
        m.update_display(4);
        m.draw_again();
        m.confirm_settings();
        m.update_settings(SettingsPatch::end_number(99));
        m.restore_number(1);
        assert_eq!(*m.state(), initial);

        let mut m = ready_machine(SettingsPatch::default());
        m.start_draw();
        m.open_settings();
        m.start_draw();
        assert_eq!(m.phase(), Phase::Drawing);
        assert!(!m.settings_open());
    }

    #[test]
    fn test_event_phase_table() {
        assert!(DrawEvent::OpenSettings.is_allowed_in(Phase::Initial));
        assert!(DrawEvent::OpenSettings.is_allowed_in(Phase::Result));
        assert!(!DrawEvent::OpenSettings.is_allowed_in(Phase::Drawing));
        assert!(DrawEvent::ResetAll.is_allowed_in(Phase::Drawing));
        assert!(!DrawEvent::RestoreNumber(1).is_allowed_in(Phase::Drawing));
        assert!(!DrawEvent::DrawAgain.is_allowed_in(Phase::Ready));
    }

    #[test]
    fn test_derived_reads() {
        let mut m = ready_machine(SettingsPatch {
            end_number: Some(5),
            draw_count: Some(2),
            ..SettingsPatch::default()
        });
        assert_eq!(m.total_range(), 5);
        assert_eq!(m.remaining_count(), 5);
        assert!(m.can_draw_now());

        drawn(&mut m, &[1, 2]);
        m.draw_again();
        drawn(&mut m, &[3, 4]);
        assert_eq!(m.remaining_count(), 1);
        assert!(!m.can_draw_now());

        let status = m.pool_status();
        assert_eq!(status.total, 5);
        assert!(status.is_low());
        assert!(!status.is_exhausted());

        m.draw_again();
        drawn(&mut m, &[5]);
        assert!(m.pool_status().is_exhausted());
    }

    #[test]
    fn test_pool_status_unlimited() {
        let status = PoolStatus {
            remaining: 0,
            total: 0,
            unlimited: true,
        };
        assert!(!status.is_low());
        assert!(!status.is_exhausted());
    }

    #[test]
    fn test_pool_status_on_oversized_range() {
        let m = DrawMachine::with_settings(Settings {
            start_number: i32::MIN,
            end_number: i32::MAX,
            ..DEFAULT_SETTINGS
        });
        let status = m.pool_status();
        assert_eq!(status.total, 1i64 << 32);
        assert_eq!(status.remaining, status.total);
        assert!(m.can_draw_now());
        assert!(m.validation().is_err());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Initial.to_string(), "Initial");
        assert_eq!(Phase::Result.to_string(), "Result");
    }
}
