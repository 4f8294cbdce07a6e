use clap::ValueEnum;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// User-facing theme preference.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// A theme after `System` has been settled against the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

impl Theme {
    /// Resolve against the terminal's background, read from `COLORFGBG`.
    pub fn resolve(self) -> Appearance {
        self.resolve_with(std::env::var("COLORFGBG").ok().as_deref())
    }

    pub fn resolve_with(self, colorfgbg: Option<&str>) -> Appearance {
        match self {
            Theme::Light => Appearance::Light,
            Theme::Dark => Appearance::Dark,
            Theme::System => colorfgbg
                .and_then(background_from_colorfgbg)
                .unwrap_or(Appearance::Dark),
        }
    }

    /// Flip to the opposite of what is currently shown. Toggling always
    /// leaves `System` for an explicit choice.
    pub fn toggle(self, current: Appearance) -> Theme {
        match current {
            Appearance::Light => Theme::Dark,
            Appearance::Dark => Theme::Light,
        }
    }
}

/// `COLORFGBG` looks like `"15;0"` or `"0;default;15"`; the last field is
/// the background palette index. Indices 7 and 9..=15 are light colors.
fn background_from_colorfgbg(value: &str) -> Option<Appearance> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match bg {
        7 | 9..=15 => Some(Appearance::Light),
        _ => Some(Appearance::Dark),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    pub dim: Color,
    pub accent: Color,
    pub highlight: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Appearance {
    pub fn palette(self) -> Palette {
        match self {
            Appearance::Dark => Palette {
                text: Color::White,
                dim: Color::DarkGray,
                accent: Color::Magenta,
                highlight: Color::Yellow,
                success: Color::Green,
                warning: Color::LightYellow,
                error: Color::Red,
            },
            Appearance::Light => Palette {
                text: Color::Black,
                dim: Color::Gray,
                accent: Color::Blue,
                highlight: Color::Magenta,
                success: Color::Green,
                warning: Color::Rgb(180, 110, 0),
                error: Color::Red,
            },
        }
    }
}
