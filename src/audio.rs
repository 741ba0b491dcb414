//! Music cues
//!
//! Two looping tracks: the intro theme (every state but RUN) and the gameplay
//! theme (RUN). Playback backends sit behind [`AudioCue`].

use std::cell::RefCell;
use std::rc::Rc;

/// Which of the two looping tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Intro,
    Gameplay,
}

/// A streamed music track
pub trait AudioCue {
    fn play(&mut self);
    fn stop(&mut self);
    fn set_looping(&mut self, looping: bool);
    /// Volume in `0.0..=1.0`
    fn set_volume(&mut self, volume: f32);
    fn is_playing(&self) -> bool;
    fn dispose(&mut self);
}

/// Owns the intro and gameplay cues and keeps at most one of them playing
pub struct Soundtrack {
    intro: Box<dyn AudioCue>,
    gameplay: Box<dyn AudioCue>,
    disposed: bool,
}

impl Soundtrack {
    pub fn new(mut intro: Box<dyn AudioCue>, mut gameplay: Box<dyn AudioCue>) -> Self {
        intro.set_looping(true);
        gameplay.set_looping(true);
        Self {
            intro,
            gameplay,
            disposed: false,
        }
    }

    /// Stop gameplay music, start the intro theme
    pub fn play_intro(&mut self) {
        if self.disposed {
            return;
        }
        self.gameplay.stop();
        if !self.intro.is_playing() {
            self.intro.play();
        }
    }

    /// Stop the intro theme, start gameplay music
    pub fn play_gameplay(&mut self) {
        if self.disposed {
            return;
        }
        self.intro.stop();
        if !self.gameplay.is_playing() {
            self.gameplay.play();
        }
    }

    /// Set both cues to `volume`, clamped to `0.0..=1.0`
    pub fn set_volume(&mut self, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.intro.set_volume(volume);
        self.gameplay.set_volume(volume);
    }

    pub fn is_playing(&self, cue: Cue) -> bool {
        match cue {
            Cue::Intro => self.intro.is_playing(),
            Cue::Gameplay => self.gameplay.is_playing(),
        }
    }

    /// The cue currently playing, if any
    pub fn active(&self) -> Option<Cue> {
        if self.gameplay.is_playing() {
            Some(Cue::Gameplay)
        } else if self.intro.is_playing() {
            Some(Cue::Intro)
        } else {
            None
        }
    }

    /// Release both cues. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.gameplay.dispose();
        self.intro.dispose();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[derive(Debug, Default)]
struct CueState {
    playing: bool,
    looping: bool,
    volume: f32,
    plays: u32,
    disposals: u32,
}

/// Cue that tracks playback state without producing sound
#[derive(Debug, Clone)]
pub struct SilentCue {
    track: String,
    state: Rc<RefCell<CueState>>,
}

impl SilentCue {
    pub fn new(track: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            state: Rc::new(RefCell::new(CueState::default())),
        }
    }

    pub fn track(&self) -> &str {
        &self.track
    }

    pub fn is_looping(&self) -> bool {
        self.state.borrow().looping
    }

    pub fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    /// Number of times playback was started
    pub fn plays(&self) -> u32 {
        self.state.borrow().plays
    }

    pub fn disposals(&self) -> u32 {
        self.state.borrow().disposals
    }
}

impl AudioCue for SilentCue {
    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.disposals > 0 {
            log::warn!("play() on disposed cue {}", self.track);
            return;
        }
        log::debug!("Playing {}", self.track);
        state.playing = true;
        state.plays += 1;
    }

    fn stop(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn set_looping(&mut self, looping: bool) {
        self.state.borrow_mut().looping = looping;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    fn dispose(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = false;
        state.disposals += 1;
    }
}
