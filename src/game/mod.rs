//! Game coordinator
//!
//! Owns the lifecycle state machine and drives one frame at a time:
//! - `change_state` waits for persistence to go idle, commits the new state,
//!   runs its entry effect, refreshes the saved-session flag, then tells the
//!   peer
//! - `render` draws every entity in registry order (HUD last) and, in RUN
//!   only, advances physics on the fixed step and handles taps
//! - `pause`/`resume`/`dispose` are the host lifecycle hooks
//!
//! ```text
//!  START ──tap──> RUN ──pause()──> PAUSE ──tap──> RUN
//!    │             │ └─health 0──> GAMEOVER ──tap──> START
//!    │             └───score─────> WINNING  ──tap──> START
//!    └─tap (saved)──> LOADING ──tap──> RUN
//! ```

use glam::Vec2;
use thiserror::Error;

use crate::audio::{AudioCue, Soundtrack};
use crate::entities::{
    Background, CreateContext, Cthulhu, DamageOutcome, Hud, HudStatus, Obstacles, Saucer,
};
use crate::net::{NetError, PeerSession};
use crate::persistence::{PersistenceError, SessionStore};
use crate::platform::{Camera, Color, InputDevice, PressLatch, RenderTarget};
use crate::settings::Settings;
use crate::sim::{
    Aabb, DebugRenderer, EntityRegistry, GameState, Handle, NetState, PhysicsStepper,
    RegistryError, World,
};


/// Registry keys, in draw order
pub mod keys {
    pub const BACKGROUND: &str = "background";
    pub const OBSTACLES: &str = "obstacles";
    pub const PLAYER: &str = "player";
    pub const ANTAGONIST: &str = "cthulhu";
    pub const HUD: &str = "gui";
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("entity registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("persistence: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("peer session: {0}")]
    Net(#[from] NetError),
}

/// Everything the coordinator talks to but does not implement
pub struct Collaborators {
    pub target: Box<dyn RenderTarget>,
    pub input: Box<dyn InputDevice>,
    pub intro: Box<dyn AudioCue>,
    pub gameplay: Box<dyn AudioCue>,
    pub persistence: Box<dyn SessionStore>,
    /// Present for two-player sessions
    pub peer: Option<PeerSession>,
}

/// Typed handles to the entities the coordinator drives directly
#[derive(Debug, Clone, Copy)]
struct Handles {
    obstacles: Handle<Obstacles>,
    player: Handle<Saucer>,
    antagonist: Handle<Cthulhu>,
    hud: Handle<Hud>,
}

pub struct Game {
    settings: Settings,
    state: Option<GameState>,

    camera: Camera,
    world: World,
    stepper: PhysicsStepper,
    registry: EntityRegistry,
    handles: Handles,
    debug_renderer: DebugRenderer,
    soundtrack: Soundtrack,

    target: Box<dyn RenderTarget>,
    input: Box<dyn InputDevice>,
    latch: PressLatch,
    persistence: Box<dyn SessionStore>,
    peer: Option<PeerSession>,

    debug: bool,
    /// Cached `has_data` for the active session, refreshed on every transition
    file_exists: bool,
    created: bool,
    disposed: bool,
}

impl Game {
    /// Register the entities and wire the collaborators. Nothing is created
    /// until [`Game::create`].
    pub fn new(settings: Settings, collab: Collaborators) -> Result<Self, GameError> {
        let seed = settings.obstacle_seed.unwrap_or_else(rand::random);
        log::info!("Obstacle seed: {}", seed);

        let mut registry = EntityRegistry::new();
        registry.register(keys::BACKGROUND, Background::new())?;
        let handles = Handles {
            obstacles: registry.register(keys::OBSTACLES, Obstacles::new(seed))?,
            player: registry.register(keys::PLAYER, Saucer::new(settings.player_health))?,
            antagonist: registry.register(keys::ANTAGONIST, Cthulhu::new())?,
            hud: registry.register(keys::HUD, Hud::new())?,
        };

        let mut soundtrack = Soundtrack::new(collab.intro, collab.gameplay);
        soundtrack.set_volume(settings.music_volume);

        Ok(Self {
            camera: Camera::orthographic(settings.viewport_width, settings.viewport_height),
            world: World::new(settings.gravity),
            stepper: PhysicsStepper::new(),
            registry,
            handles,
            debug_renderer: DebugRenderer::new(),
            soundtrack,
            target: collab.target,
            input: collab.input,
            latch: PressLatch::new(),
            persistence: collab.persistence,
            peer: collab.peer,
            debug: settings.debug_overlay,
            file_exists: false,
            created: false,
            disposed: false,
            state: None,
            settings,
        })
    }

    /// One-time init: bounds, entities, peer connection, then START
    pub fn create(&mut self) {
        if self.created {
            log::warn!("create() called twice, ignoring");
            return;
        }
        log::info!("Creating game ({} entities)", self.registry.len());

        self.world
            .set_bounds(Aabb::new(Vec2::ZERO, self.camera.viewport()));
        self.registry.create_all(&mut CreateContext {
            target: self.target.as_mut(),
            camera: &self.camera,
            world: &mut self.world,
        });
        self.created = true;

        if let Some(peer) = self.peer.as_mut() {
            if let Err(e) = peer.connect() {
                log::warn!("Playing without peer: {}", e);
            }
        }

        self.change_state(GameState::Start);
    }

    /// Per-frame update with the real elapsed time (seconds)
    pub fn render(&mut self, delta: f64) {
        if self.disposed {
            return;
        }
        let Some(state) = self.state else {
            log::warn!("render() before create()");
            return;
        };

        self.camera.update();
        self.target.set_projection(self.camera.combined());
        self.target.clear(Color::SKY);

        if state == GameState::Run {
            self.registry.pre_render_all(&self.camera, &mut self.world);
        }

        self.target.begin();
        self.registry
            .render_all(self.target.as_mut(), &self.camera, Some(self.handles.hud));
        self.target.end();

        self.input.poll();
        let tapped = self.latch.sample(self.input.is_pressed());

        if state == GameState::Run {
            self.stepper.advance(delta, &mut self.world);
            self.react_to_step();
            if tapped && self.state == Some(GameState::Run) {
                self.tap_in_game();
            }
        } else if tapped {
            self.refresh_hud();
            let target = self
                .registry
                .get(self.handles.hud)
                .and_then(Hud::menu_target);
            if let Some(next) = target {
                self.change_state(next);
            }
        }

        if self.debug {
            self.target.clear(Color::BLACK);
            self.debug_renderer
                .render(&self.world, self.camera.combined(), self.target.as_mut());
        }

        self.refresh_hud();
        self.target.set_projection(self.camera.combined());
        self.target.begin();
        self.registry
            .render_one(self.handles.hud, self.target.as_mut(), &self.camera);
        self.target.end();

        self.sync_with_peer();
    }

    /// Transition to `next` and tell the peer about it
    pub fn change_state(&mut self, next: GameState) {
        self.transition(next, true);
    }

    fn transition(&mut self, next: GameState, announce: bool) {
        if self.disposed {
            log::warn!("Ignoring transition to {} after dispose", next.as_str());
            return;
        }

        // Never overlap a transition with an in-flight save
        self.persistence
            .wait_idle(self.settings.busy_poll_interval());

        let previous = self.state.replace(next);
        log::info!(
            "Game state: {} -> {}",
            previous.map_or("unset", |s| s.as_str()),
            next.as_str()
        );

        self.enter(next);
        self.file_exists = self.persistence.has_data(&self.settings.session_name);

        if announce {
            if let Some(peer) = self.peer.as_mut() {
                peer.notify(next, &self.settings.session_name);
            }
        }
    }

    /// Entry effect of `state`
    fn enter(&mut self, state: GameState) {
        let session = self.settings.session_name.clone();
        match state {
            GameState::Run => self.soundtrack.play_gameplay(),
            GameState::Start => {
                self.soundtrack.play_intro();
                self.reset();
            }
            GameState::Pause => {
                self.soundtrack.play_intro();
                self.save(&session);
            }
            GameState::GameOver | GameState::Winning => {
                self.soundtrack.play_intro();
                self.delete(&session);
            }
            GameState::Loading => {
                self.soundtrack.play_intro();
                if !self.load(&session) {
                    self.reset();
                }
            }
        }
    }

    /// Fresh run: layout, player at the viewport center, no banked time
    fn reset(&mut self) {
        self.debug = false;
        self.registry.reset_all(&mut self.world);
        let center = self.camera.viewport_center();
        if let Some(player) = self.registry.get_mut(self.handles.player) {
            player.set_position(center, &mut self.world);
        }
        self.stepper.reset();
        self.world.take_contacts();
    }

    /// Host lost focus. While playing this pauses and saves.
    pub fn pause(&mut self) {
        if self.state != Some(GameState::Run) {
            return;
        }
        self.change_state(GameState::Pause);
        let session = self.settings.session_name.clone();
        self.save(&session);
    }

    /// Host regained focus. The game stays paused until tapped.
    pub fn resume(&mut self) {
        log::debug!(
            "Resumed in state {}",
            self.state.map_or("unset", |s| s.as_str())
        );
    }

    /// Release everything once: registry, world, debug renderer, audio
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        log::info!("Disposing game");
        self.persistence
            .wait_idle(self.settings.busy_poll_interval());
        self.registry.dispose_all(self.target.as_mut());
        self.world.dispose();
        self.debug_renderer.dispose();
        self.soundtrack.dispose();
        self.disposed = true;
    }

    /// Damage the player; GAMEOVER when the last point of health goes
    pub fn apply_damage(&mut self, amount: u32) -> DamageOutcome {
        let Some(player) = self.registry.get_mut(self.handles.player) else {
            return DamageOutcome::AlreadyDestroyed;
        };
        let outcome = player.take_damage(amount);
        if outcome == DamageOutcome::Destroyed {
            log::info!("Player destroyed with score {}", player.score());
            self.change_state(GameState::GameOver);
        }
        outcome
    }

    /// Queue a snapshot of every entity under `name`
    ///
    /// Waits for any in-flight operation first so two saves never overlap.
    pub fn save(&mut self, name: &str) {
        self.persistence
            .wait_idle(self.settings.busy_poll_interval());
        let snapshot = self.registry.snapshot(name, &self.world);
        log::info!("Saving session '{}'", name);
        self.persistence.save(name, snapshot);
    }

    /// Restore the snapshot stored under `name`; false when there is none
    pub fn load(&mut self, name: &str) -> bool {
        self.persistence
            .wait_idle(self.settings.busy_poll_interval());
        match self.persistence.load(name) {
            Ok(snapshot) => {
                let restored = self.registry.restore(&snapshot, &mut self.world);
                self.stepper.reset();
                self.world.take_contacts();
                log::info!("Loaded session '{}' ({} entities)", name, restored);
                true
            }
            Err(PersistenceError::NotFound(_)) => {
                log::info!("No saved session '{}', starting fresh", name);
                false
            }
            Err(e) => {
                log::warn!("Cannot load session '{}': {}", name, e);
                false
            }
        }
    }

    pub fn delete(&mut self, name: &str) {
        log::info!("Deleting session '{}'", name);
        self.persistence.delete(name);
    }

    /// Contacts cost health, passed columns score, enough score wins
    fn react_to_step(&mut self) {
        let contacts = self.world.take_contacts();
        let Some(body) = self.player().and_then(Saucer::body) else {
            return;
        };

        for contact in contacts.iter().filter(|c| c.involves(body)) {
            log::debug!("Player contact: {:?}", contact);
            self.apply_damage(1);
            if self.state != Some(GameState::Run) {
                return;
            }
        }

        let Some(x) = self.world.position(body).map(|p| p.x) else {
            return;
        };
        let passed = self
            .registry
            .get_mut(self.handles.obstacles)
            .map_or(0, |o| o.take_newly_passed(x));
        if passed == 0 {
            return;
        }

        let Some(player) = self.registry.get_mut(self.handles.player) else {
            return;
        };
        player.add_score(u64::from(passed));
        if player.score() >= self.settings.winning_score {
            log::info!("Winning score {} reached", player.score());
            self.change_state(GameState::Winning);
        }
    }

    /// Fresh tap while playing: jump and punch toward the pointer
    fn tap_in_game(&mut self) {
        let aim = self.input.unproject(&self.camera);
        if let Some(player) = self.registry.get_mut(self.handles.player) {
            player.jump(&mut self.world);
        }
        if let Some(cthulhu) = self.registry.get_mut(self.handles.antagonist) {
            cthulhu.punch(aim, &mut self.world);
        }
    }

    fn refresh_hud(&mut self) {
        // Pick up deletes/saves that finished since the last transition
        if !self.persistence.is_busy() {
            self.file_exists = self.persistence.has_data(&self.settings.session_name);
        }
        let (health, max_health, score) = self
            .player()
            .map(|p| (p.health(), p.max_health(), p.score()))
            .unwrap_or_default();
        let status = HudStatus {
            state: self.state,
            health,
            max_health,
            score,
            net: self.net_state(),
            saved_session: self.file_exists,
        };
        if let Some(hud) = self.registry.get_mut(self.handles.hud) {
            hud.set_status(status);
        }
    }

    /// Apply transitions the peer announced, without echoing them back
    fn sync_with_peer(&mut self) {
        let Some(peer) = self.peer.as_mut() else { return };
        for notice in peer.poll() {
            if notice.session != self.settings.session_name {
                log::warn!(
                    "Ignoring peer notice for session '{}' (playing '{}')",
                    notice.session,
                    self.settings.session_name
                );
                continue;
            }
            if self.state == Some(notice.state) {
                continue;
            }
            log::info!("Peer moved to {}", notice.state.as_str());
            self.transition(notice.state, false);
        }
    }

    pub fn state(&self) -> Option<GameState> {
        self.state
    }

    pub fn net_state(&self) -> NetState {
        self.peer
            .as_ref()
            .map_or(NetState::Unset, PeerSession::net_state)
    }

    /// Whether a snapshot existed for the active session after the last
    /// transition
    pub fn has_saved_session(&self) -> bool {
        self.file_exists
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn soundtrack(&self) -> &Soundtrack {
        &self.soundtrack
    }

    pub fn persistence(&self) -> &dyn SessionStore {
        self.persistence.as_ref()
    }

    pub fn peer(&self) -> Option<&PeerSession> {
        self.peer.as_ref()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn stepper(&self) -> &PhysicsStepper {
        &self.stepper
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn debug_renderer(&self) -> &DebugRenderer {
        &self.debug_renderer
    }

    pub fn player(&self) -> Option<&Saucer> {
        self.registry.get(self.handles.player)
    }

    pub fn player_mut(&mut self) -> Option<&mut Saucer> {
        self.registry.get_mut(self.handles.player)
    }

    pub fn antagonist(&self) -> Option<&Cthulhu> {
        self.registry.get(self.handles.antagonist)
    }

    pub fn obstacles(&self) -> Option<&Obstacles> {
        self.registry.get(self.handles.obstacles)
    }

    pub fn hud(&self) -> Option<&Hud> {
        self.registry.get(self.handles.hud)
    }
}
