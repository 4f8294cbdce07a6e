use std::io::Write;

const TICK_BASE_HZ: f64 = 440.0;
const TICK_MAX_HZ: f64 = 880.0;

/// Rising C major arpeggio played on a reveal.
pub const SUCCESS_NOTES_HZ: [f64; 3] = [523.25, 659.25, 783.99];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    Tick { progress: f64 },
    Success,
}

/// Pitch of a tick: A4 at the start of a reveal, A5 at the end.
pub fn tick_frequency(progress: f64) -> f64 {
    TICK_BASE_HZ + (TICK_MAX_HZ - TICK_BASE_HZ) * progress.clamp(0.0, 1.0)
}

/// Something that can voice a cue. Failures are swallowed; audio is never
/// allowed to interrupt a draw.
pub trait CuePlayer {
    fn play(&mut self, cue: Cue);
}

impl<P: CuePlayer + ?Sized> CuePlayer for Box<P> {
    fn play(&mut self, cue: Cue) {
        (**self).play(cue);
    }
}

/// Plays cues on a terminal: the success cue rings the bell, ticks are
/// only traced since a bell per tick would drown the reveal.
pub struct BellPlayer<W: Write> {
    out: W,
}

impl<W: Write> BellPlayer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CuePlayer for BellPlayer<W> {
    fn play(&mut self, cue: Cue) {
        match cue {
            Cue::Tick { progress } => {
                log::trace!("tick at {:.0} Hz", tick_frequency(progress));
            }
            Cue::Success => {
                log::trace!("success arpeggio {:?}", SUCCESS_NOTES_HZ);
                if let Err(err) = self.out.write_all(b"\x07").and_then(|_| self.out.flush()) {
                    log::debug!("bell failed: {err}");
                }
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play(&mut self, _cue: Cue) {}
}

/// Gate in front of a player, driven by the sound preference.
pub struct Sound<P: CuePlayer> {
    enabled: bool,
    player: P,
}

impl<P: CuePlayer> Sound<P> {
    pub fn new(player: P, enabled: bool) -> Self {
        Self { enabled, player }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn tick(&mut self, progress: f64) {
        if self.enabled {
            self.player.play(Cue::Tick { progress });
        }
    }

    pub fn success(&mut self) {
        if self.enabled {
            self.player.play(Cue::Success);
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }
}
