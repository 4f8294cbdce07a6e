mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use luckydraw::{
    animation::{Easing, ScheduleConfig},
    app_dirs::AppDirs,
    config::{FilePreferenceStore, PreferenceStore},
    logging,
    machine::{DrawMachine, Phase},
    orchestrator::{DrawObserver, DrawOrchestrator},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    settings::{validate_settings, Settings, SettingsError, SettingsPatch, DEFAULT_SETTINGS},
    sound::{BellPlayer, CuePlayer, SilentPlayer, Sound},
    theme::{Appearance, Theme},
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use serde::Serialize;
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    time::{Duration, Instant},
};

const MAX_DURATION_MS: u64 = 60_000;

/// draw random numbers with a slot-machine reveal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Draw random numbers from a range with a decelerating slot-machine reveal. Drawn numbers can be excluded from later draws and restored individually."
)]
pub struct Cli {
    /// first number of the range
    #[clap(short = 's', long, default_value_t = DEFAULT_SETTINGS.start_number, allow_negative_numbers = true)]
    start: i32,

    /// last number of the range (inclusive)
    #[clap(short = 'e', long, default_value_t = DEFAULT_SETTINGS.end_number, allow_negative_numbers = true)]
    end: i32,

    /// how many numbers each draw picks
    #[clap(short = 'n', long, default_value_t = DEFAULT_SETTINGS.draw_count)]
    count: usize,

    /// let numbers repeat within and across draws
    #[clap(short = 'd', long)]
    allow_duplicates: bool,

    /// length of the reveal animation in milliseconds (at most 60000)
    #[clap(long, default_value_t = 2000, value_parser = clap::value_parser!(u64).range(0..=MAX_DURATION_MS))]
    duration: u64,

    /// deceleration curve of the reveal
    #[clap(long, value_enum, default_value_t = Easing::EaseOutQuart)]
    easing: Easing,

    /// seed the random source for reproducible draws
    #[clap(long)]
    seed: Option<u64>,

    /// start with sound cues muted
    #[clap(short = 'm', long)]
    mute: bool,

    /// color theme; remembered for later runs
    #[clap(short = 't', long, value_enum)]
    theme: Option<Theme>,

    /// draw without the terminal UI and print the numbers
    #[clap(long)]
    headless: bool,

    /// number of consecutive draws in headless mode
    #[clap(long, default_value_t = 1, requires = "headless", value_parser = clap::value_parser!(u32).range(1..))]
    rounds: u32,

    /// print headless results as JSON
    #[clap(long, requires = "headless")]
    json: bool,

    /// write the log here instead of the state directory
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn settings(&self, sound_enabled: bool) -> Settings {
        Settings {
            start_number: self.start,
            end_number: self.end,
            draw_count: self.count,
            allow_duplicates: self.allow_duplicates,
            sound_enabled,
        }
    }

    /// Reject a range or count the draw could never honour before anything
    /// is built from it.
    fn validate(&self) -> Result<(), SettingsError> {
        validate_settings(&self.settings(false))
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig::with_duration(Duration::from_millis(self.duration))
    }

    fn orchestrator(&self) -> DrawOrchestrator<StdRng> {
        DrawOrchestrator::new(self.rng(), self.schedule(), self.easing)
    }
}

/// Forwards reveal callbacks into the state machine and the sound gate.
struct Reveal<'a, P: CuePlayer> {
    machine: &'a mut DrawMachine,
    sound: &'a mut Sound<P>,
}

impl<P: CuePlayer> DrawObserver for Reveal<'_, P> {
    fn on_tick(&mut self, display: i32, progress: f64) {
        self.machine.update_display(display);
        self.sound.tick(progress);
    }

    fn on_complete(&mut self, numbers: &[i32]) {
        self.machine.finish_draw(numbers.to_vec());
        if !numbers.is_empty() {
            self.sound.success();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsField {
    #[default]
    Start,
    End,
    Count,
    Duplicates,
    Sound,
}

impl SettingsField {
    pub const ALL: [SettingsField; 5] = [
        SettingsField::Start,
        SettingsField::End,
        SettingsField::Count,
        SettingsField::Duplicates,
        SettingsField::Sound,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Start => "Start number",
            SettingsField::End => "End number",
            SettingsField::Count => "Numbers per draw",
            SettingsField::Duplicates => "Allow duplicates",
            SettingsField::Sound => "Sound",
        }
    }

    /// Patch that moves this field by `delta` steps. Toggles flip on any step.
    fn adjust(self, current: &Settings, delta: i32) -> SettingsPatch {
        match self {
            SettingsField::Start => {
                SettingsPatch::start_number(current.start_number.saturating_add(delta))
            }
            SettingsField::End => SettingsPatch::end_number(current.end_number.saturating_add(delta)),
            SettingsField::Count => {
                let value = (current.draw_count as i64 + delta as i64).max(0) as usize;
                SettingsPatch::draw_count(current, value)
            }
            SettingsField::Duplicates => SettingsPatch::allow_duplicates(!current.allow_duplicates),
            SettingsField::Sound => SettingsPatch::sound_enabled(!current.sound_enabled),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub machine: DrawMachine,
    pub orchestrator: DrawOrchestrator<StdRng>,
    pub sound: Sound<Box<dyn CuePlayer>>,
    pub theme: Theme,
    pub appearance: Appearance,
    pub settings_field: SettingsField,
    pub restore_cursor: usize,
    pub notice: Option<String>,
    prefs: Box<dyn PreferenceStore>,
}

impl App {
    pub fn new(cli: &Cli, prefs: Box<dyn PreferenceStore>, player: Box<dyn CuePlayer>) -> Self {
        let stored = prefs.load();
        let theme = cli.theme.unwrap_or(stored.theme);
        let sound_enabled = stored.sound_enabled && !cli.mute;

        if cli.theme.is_some_and(|t| t != stored.theme) {
            if let Err(err) = prefs.set_theme(theme) {
                log::warn!("could not save theme: {err}");
            }
        }

        Self {
            machine: DrawMachine::with_settings(cli.settings(sound_enabled)),
            orchestrator: cli.orchestrator(),
            sound: Sound::new(player, sound_enabled),
            theme,
            appearance: theme.resolve(),
            settings_field: SettingsField::default(),
            restore_cursor: 0,
            notice: None,
            prefs,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        self.notice = None;

        if self.machine.settings_open() {
            self.handle_settings_key(key);
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char(' ') | KeyCode::Enter => self.draw(),
            KeyCode::Char('a') => self.machine.draw_again(),
            KeyCode::Char('s') => self.open_settings(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('m') => self.toggle_sound(),
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Backspace | KeyCode::Delete | KeyCode::Char('x') => self.restore_selected(),
            _ => {}
        }

        Flow::Continue
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        let current = *self.machine.settings();
        let field = self.settings_field;

        match key.code {
            KeyCode::Esc => self.machine.close_settings(),
            KeyCode::Enter => self.confirm_settings(),
            KeyCode::Up | KeyCode::BackTab => self.settings_field = field.prev(),
            KeyCode::Down | KeyCode::Tab => self.settings_field = field.next(),
            KeyCode::Left | KeyCode::Char('-') => {
                self.machine.update_settings(field.adjust(&current, -1))
            }
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char(' ') => {
                self.machine.update_settings(field.adjust(&current, 1))
            }
            KeyCode::PageDown => self.machine.update_settings(field.adjust(&current, -10)),
            KeyCode::PageUp => self.machine.update_settings(field.adjust(&current, 10)),
            _ => {}
        }
    }

    fn open_settings(&mut self) {
        self.machine.open_settings();
        if self.machine.settings_open() {
            self.machine
                .update_settings(SettingsPatch::sound_enabled(self.sound.enabled()));
            self.settings_field = SettingsField::default();
        }
    }

    fn confirm_settings(&mut self) {
        self.machine.confirm_settings();
        match self.machine.validation() {
            Ok(()) if self.machine.phase() == Phase::Ready => {
                let enabled = self.machine.settings().sound_enabled;
                if enabled != self.sound.enabled() {
                    self.set_sound(enabled);
                }
                self.restore_cursor = 0;
            }
            Ok(()) => {}
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    /// Space/Enter: set up from the start screen, draw when ready, and draw
    /// again straight from a result.
    fn draw(&mut self) {
        match self.machine.phase() {
            Phase::Initial => self.open_settings(),
            Phase::Ready => self.start_draw(),
            Phase::Result => {
                self.machine.draw_again();
                self.start_draw();
            }
            Phase::Settings | Phase::Drawing => {}
        }
    }

    fn start_draw(&mut self) {
        if !self.machine.can_draw_now() {
            self.notice = Some("Not enough numbers left. Restore some or reset.".to_string());
            return;
        }

        self.machine.start_draw();
        let settings = *self.machine.settings();
        let excluded = self.machine.excluded_numbers().to_vec();
        self.orchestrator.start(
            &settings,
            &excluded,
            &mut Reveal {
                machine: &mut self.machine,
                sound: &mut self.sound,
            },
        );
    }

    /// Advance a running reveal. Returns whether anything changed.
    pub fn on_frame(&mut self, now: Instant) -> bool {
        if !self.orchestrator.is_animating() {
            return false;
        }

        self.orchestrator.frame(
            now,
            &mut Reveal {
                machine: &mut self.machine,
                sound: &mut self.sound,
            },
        );

        if !self.orchestrator.is_animating() {
            self.restore_cursor = self.machine.history().len().saturating_sub(1);
        }
        true
    }

    fn move_cursor(&mut self, step: isize) {
        let len = self.machine.history().len();
        if len == 0 || !self.machine.can_restore() {
            return;
        }
        self.restore_cursor = self
            .restore_cursor
            .saturating_add_signed(step)
            .min(len - 1);
    }

    fn restore_selected(&mut self) {
        if !self.machine.can_restore() {
            return;
        }
        if let Some(&n) = self.machine.history().get(self.restore_cursor) {
            self.machine.restore_number(n);
            self.notice = Some(format!("{n} is back in the pool"));
            self.restore_cursor = self
                .restore_cursor
                .min(self.machine.history().len().saturating_sub(1));
        }
    }

    fn reset(&mut self) {
        self.orchestrator.stop();
        self.machine.reset_all();
        self.restore_cursor = 0;
        self.settings_field = SettingsField::default();
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle(self.appearance);
        self.appearance = self.theme.resolve();
        if let Err(err) = self.prefs.set_theme(self.theme) {
            log::warn!("could not save theme: {err}");
        }
    }

    fn toggle_sound(&mut self) {
        self.set_sound(!self.sound.enabled());
    }

    fn set_sound(&mut self, enabled: bool) {
        self.sound.set_enabled(enabled);
        if let Err(err) = self.prefs.set_sound_enabled(enabled) {
            log::warn!("could not save sound preference: {err}");
        }
    }

    pub fn shutdown(&mut self) {
        self.orchestrator.stop();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Err(err) = cli.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err).exit();
    }

    if cli.headless {
        logging::init_stderr()?;
        let stdout = io::stdout();
        if let Err(err) = run_headless(&cli, &mut stdout.lock()) {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, err).exit();
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        if let Err(err) = logging::init_file(&path) {
            eprintln!("logging disabled: {err}");
        }
    }

    let mut app = App::new(
        &cli,
        Box::new(FilePreferenceStore::new()),
        Box::new(BellPlayer::new(io::stdout())),
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let redraw = match runner.step() {
            AppEvent::Key(key) => {
                if app.handle_key(key) == Flow::Quit {
                    break;
                }
                true
            }
            AppEvent::Resize => true,
            AppEvent::Frame(now) => app.on_frame(now),
        };

        if redraw {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    log::info!("exiting");
    Ok(())
}

#[derive(Debug, Serialize)]
struct HeadlessReport {
    settings: Settings,
    rounds: Vec<Vec<i32>>,
    remaining: i64,
}

/// Run `--rounds` draws back to back without a terminal and print each
/// result. Running out of numbers ends the run early.
fn run_headless<W: Write>(cli: &Cli, out: &mut W) -> Result<(), Box<dyn Error>> {
    cli.validate()?;
    let settings = cli.settings(false);

    let mut machine = DrawMachine::with_settings(settings);
    machine.open_settings();
    machine.confirm_settings();

    let mut orchestrator = cli.orchestrator();
    let mut sound = Sound::new(SilentPlayer, false);
    let ticker = FixedTicker::default();
    let mut rounds = Vec::new();

    for round in 0..cli.rounds {
        if round > 0 {
            machine.draw_again();
        }
        if !machine.can_draw_now() {
            log::warn!("pool exhausted after {round} rounds");
            break;
        }

        machine.start_draw();
        let excluded = machine.excluded_numbers().to_vec();
        let mut reveal = Reveal {
            machine: &mut machine,
            sound: &mut sound,
        };
        orchestrator.start(&settings, &excluded, &mut reveal);
        orchestrator.play(&ticker, &mut reveal);

        let numbers = machine.current_result().to_vec();
        if !cli.json {
            writeln!(out, "{}", numbers.iter().join(" "))?;
        }
        rounds.push(numbers);
    }

    if cli.json {
        let report = HeadlessReport {
            settings,
            rounds,
            remaining: machine.remaining_count(),
        };
        serde_json::to_writer(&mut *out, &report)?;
        writeln!(out)?;
    }

    Ok(())
}
