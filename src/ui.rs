use itertools::Itertools;
use luckydraw::{machine::Phase, theme::Palette};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::{App, SettingsField};

const HORIZONTAL_MARGIN: u16 = 2;
const DIALOG_WIDTH: u16 = 46;
const DIALOG_HEIGHT: u16 = 11;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = self.appearance.palette();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        status_line(self, &palette).render(chunks[0], buf);
        pool_line(self, &palette).render(chunks[1], buf);
        self.render_stage(chunks[2], buf, &palette);
        history_block(self, &palette).render(chunks[3], buf);

        if let Some(notice) = &self.notice {
            Paragraph::new(Span::styled(
                notice.as_str(),
                Style::default().fg(palette.warning),
            ))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
        }

        Paragraph::new(Span::styled(
            footer_legend(self),
            Style::default()
                .fg(palette.dim)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

        if self.machine.settings_open() {
            self.render_settings(centered(area, DIALOG_WIDTH, DIALOG_HEIGHT), buf, &palette);
        }
    }
}

impl App {
    fn render_stage(&self, area: Rect, buf: &mut Buffer, palette: &Palette) {
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let (text, style) = match self.machine.phase() {
            Phase::Initial | Phase::Settings => (
                "Press enter to set up a draw".to_string(),
                Style::default().fg(palette.dim),
            ),
            Phase::Ready => (
                "Press space to draw".to_string(),
                Style::default().fg(palette.text),
            ),
            Phase::Drawing => (
                self.machine
                    .display_number()
                    .map_or_else(|| "…".to_string(), |n| n.to_string()),
                bold.fg(palette.highlight),
            ),
            Phase::Result if self.machine.current_result().is_empty() => (
                "Nothing left to draw".to_string(),
                Style::default().fg(palette.warning),
            ),
            Phase::Result => (
                self.machine.current_result().iter().join("   "),
                bold.fg(palette.success),
            ),
        };

        let top_padding = area.height.saturating_sub(1) / 2;
        let lines = std::iter::repeat(Line::from(""))
            .take(top_padding as usize)
            .chain(std::iter::once(Line::from(Span::styled(text, style))))
            .collect::<Vec<_>>();

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.accent)),
            )
            .render(area, buf);
    }

    fn render_settings(&self, area: Rect, buf: &mut Buffer, palette: &Palette) {
        let settings = self.machine.settings();
        let on_off = |b: bool| if b { "on" } else { "off" };

        let mut lines: Vec<Line> = SettingsField::ALL
            .iter()
            .map(|field| {
                let value = match field {
                    SettingsField::Start => settings.start_number.to_string(),
                    SettingsField::End => settings.end_number.to_string(),
                    SettingsField::Count => {
                        format!("{} (max {})", settings.draw_count, settings.max_draw_count())
                    }
                    SettingsField::Duplicates => on_off(settings.allow_duplicates).to_string(),
                    SettingsField::Sound => on_off(settings.sound_enabled).to_string(),
                };
                let focused = *field == self.settings_field;
                let style = if focused {
                    Style::default()
                        .fg(palette.highlight)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(palette.text)
                };
                Line::from(vec![
                    Span::styled(if focused { "> " } else { "  " }, style),
                    Span::styled(format!("{:<18}", field.label()), style),
                    Span::styled(format!("◀ {value} ▶"), style),
                ])
            })
            .collect();

        lines.push(Line::from(""));
        lines.push(match self.machine.validation() {
            Ok(()) => Line::from(Span::styled(
                format!("{} numbers in range", settings.range()),
                Style::default().fg(palette.dim),
            )),
            Err(err) => Line::from(Span::styled(
                err.to_string(),
                Style::default().fg(palette.error),
            )),
        });
        lines.push(Line::from(Span::styled(
            "↑/↓ field  ←/→ ±1  PgUp/PgDn ±10  enter ok  esc cancel",
            Style::default().fg(palette.dim),
        )));

        Clear.render(area, buf);
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Draw settings ")
                    .border_style(Style::default().fg(palette.accent)),
            )
            .render(area, buf);
    }
}

fn status_line<'a>(app: &App, palette: &Palette) -> Paragraph<'a> {
    let s = app.machine.settings();
    let mode = if s.allow_duplicates {
        "duplicates allowed"
    } else {
        "no duplicates"
    };
    let sound = if app.sound.enabled() { "♪" } else { "muted" };

    Paragraph::new(Line::from(vec![
        Span::styled(
            "luckydraw",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "  {}..={}  ×{}  {}  {}  {}",
                s.start_number,
                s.end_number,
                s.draw_count,
                mode,
                sound,
                app.machine.phase()
            ),
            Style::default().fg(palette.dim),
        ),
    ]))
}

fn pool_line<'a>(app: &App, palette: &Palette) -> Paragraph<'a> {
    let status = app.machine.pool_status();

    let (text, color) = if status.unlimited {
        (format!("{} numbers, unlimited draws", status.total), palette.dim)
    } else if status.is_exhausted() {
        (
            "All numbers drawn. Restore some or press r to reset.".to_string(),
            palette.error,
        )
    } else if status.is_low() {
        (
            format!("Only {} of {} left", status.remaining, status.total),
            palette.warning,
        )
    } else {
        (
            format!("{} of {} left", status.remaining, status.total),
            palette.text,
        )
    };

    Paragraph::new(Span::styled(text, Style::default().fg(color)))
}

fn history_block<'a>(app: &'a App, palette: &Palette) -> Paragraph<'a> {
    let history = app.machine.history();
    let restorable = app.machine.can_restore();

    let spans = if history.is_empty() {
        vec![Span::styled(
            "No draws yet",
            Style::default().fg(palette.dim),
        )]
    } else {
        history
            .iter()
            .enumerate()
            .flat_map(|(i, n)| {
                let style = if restorable && i == app.restore_cursor {
                    Style::default()
                        .fg(palette.highlight)
                        .add_modifier(Modifier::REVERSED | Modifier::BOLD)
                } else {
                    Style::default().fg(palette.text)
                };
                [Span::styled(n.to_string(), style), Span::raw(" ")]
            })
            .collect()
    };

    let title = if restorable && !history.is_empty() {
        format!(" History ({}) ←/→ select, x restore ", history.len())
    } else {
        format!(" History ({}) ", history.len())
    };

    Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .title(title)
            .border_style(Style::default().fg(palette.dim)),
    )
}

fn footer_legend(app: &App) -> &'static str {
    match app.machine.phase() {
        Phase::Initial => "(enter) set up  (t)heme  (m)ute  (q)uit",
        Phase::Settings => "(enter) confirm  (esc) cancel",
        Phase::Ready => "(space) draw  (s)ettings  (r)eset  (t)heme  (m)ute  (q)uit",
        Phase::Drawing => "(r)eset  (q)uit",
        Phase::Result => "(space) draw again  (a) back  (s)ettings  (r)eset  (q)uit",
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::Parser;
    use luckydraw::config::MemoryPreferenceStore;
    use luckydraw::settings::SettingsPatch;
    use luckydraw::sound::SilentPlayer;

    fn create_test_app(args: &[&str]) -> App {
        let mut argv = vec!["luckydraw", "--seed", "5", "-t", "dark"];
        argv.extend_from_slice(args);
        App::new(
            &Cli::parse_from(argv),
            Box::new(MemoryPreferenceStore::default()),
            Box::new(SilentPlayer),
        )
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_ui_initial_screen() {
        let app = create_test_app(&[]);
        let rendered = render(&app, 80, 24);
        assert!(rendered.contains("set up a draw"));
        assert!(rendered.contains("No draws yet"));
        assert!(rendered.contains("12 of 12 left"));
    }

    #[test]
    fn test_ui_settings_dialog_shows_validation() {
        let mut app = create_test_app(&[]);
        app.machine.open_settings();
        app.machine.update_settings(SettingsPatch {
            end_number: Some(3),
            draw_count: Some(5),
            ..SettingsPatch::default()
        });
        let rendered = render(&app, 80, 24);
        assert!(rendered.contains("Draw settings"));
        assert!(rendered.contains("cannot exceed the range"));
    }

    #[test]
    fn test_ui_result_and_history() {
        let mut app = create_test_app(&["-e", "45"]);
        app.machine.open_settings();
        app.machine.confirm_settings();
        app.machine.start_draw();
        app.machine.finish_draw(vec![7, 31]);

        let rendered = render(&app, 80, 24);
        assert!(rendered.contains("7   31"));
        assert!(rendered.contains("History (2)"));
        assert!(rendered.contains("43 of 45 left"));
    }

    #[test]
    fn test_ui_drawing_shows_display_number() {
        let mut app = create_test_app(&["-e", "99"]);
        app.machine.open_settings();
        app.machine.confirm_settings();
        app.machine.start_draw();
        app.machine.update_display(42);

        let rendered = render(&app, 80, 24);
        assert!(rendered.contains("42"));
        assert!(rendered.contains("(r)eset"));
    }

    #[test]
    fn test_ui_low_pool_warning() {
        let mut app = create_test_app(&["-e", "4"]);
        app.machine.open_settings();
        app.machine.confirm_settings();
        app.machine.start_draw();
        app.machine.finish_draw(vec![1, 2]);

        let rendered = render(&app, 80, 24);
        assert!(rendered.contains("Only 2 of 4 left"));
    }

    #[test]
    fn test_ui_small_area_does_not_panic() {
        let mut app = create_test_app(&[]);
        app.machine.open_settings();
        let rendered = render(&app, 20, 5);
        assert!(!rendered.trim().is_empty());
    }
}
