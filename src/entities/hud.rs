//! Heads-up display
//!
//! Drawn after everything else, in every state. Also decides where a tap
//! outside of gameplay leads.

use glam::Vec2;

use super::{CreateContext, GameObject, release};
use crate::platform::{Camera, RenderTarget, TextureId};
use crate::sim::{GameState, NetState, World};

/// What the HUD shows this frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudStatus {
    pub state: Option<GameState>,
    pub health: u32,
    pub max_health: u32,
    pub score: u64,
    pub net: NetState,
    /// A saved session is available to continue
    pub saved_session: bool,
}

#[derive(Debug, Default)]
pub struct Hud {
    font: Option<TextureId>,
    status: HudStatus,
    viewport: Vec2,
}

impl Hud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: HudStatus) {
        self.status = status;
    }

    pub fn status(&self) -> &HudStatus {
        &self.status
    }

    /// Banner for the current state
    pub fn banner(&self) -> Option<&'static str> {
        match self.status.state? {
            GameState::Start if self.status.saved_session => Some("TAP TO CONTINUE"),
            GameState::Start => Some("TAP TO START"),
            GameState::Run => None,
            GameState::Pause => Some("PAUSED - TAP TO RESUME"),
            GameState::GameOver => Some("GAME OVER"),
            GameState::Winning => Some("YOU WIN!"),
            GameState::Loading => Some("SESSION RESTORED - TAP TO PLAY"),
        }
    }

    /// Where a fresh tap leads while not playing
    pub fn menu_target(&self) -> Option<GameState> {
        match self.status.state? {
            GameState::Start if self.status.saved_session => Some(GameState::Loading),
            GameState::Start | GameState::Loading | GameState::Pause => Some(GameState::Run),
            GameState::GameOver | GameState::Winning => Some(GameState::Start),
            GameState::Run => None,
        }
    }
}

impl GameObject for Hud {
    fn create(&mut self, ctx: &mut CreateContext<'_>) {
        self.font = Some(ctx.target.load_texture("font.png"));
        self.viewport = ctx.camera.viewport();
    }

    fn pre_render(&mut self, _camera: &Camera, _world: &mut World) {}

    fn render(&self, target: &mut dyn RenderTarget, _camera: &Camera) {
        if self.font.is_none() {
            return;
        }
        let top_left = Vec2::new(1.0, self.viewport.y - 1.0);
        target.draw_text(
            top_left,
            &format!(
                "HP {}/{}  SCORE {}",
                self.status.health, self.status.max_health, self.status.score
            ),
        );
        if self.status.net != NetState::Unset {
            target.draw_text(
                top_left - Vec2::new(0.0, 2.0),
                &format!("PEER {:?}", self.status.net).to_uppercase(),
            );
        }
        if let Some(banner) = self.banner() {
            target.draw_text(self.viewport / 2.0, banner);
        }
    }

    fn dispose(&mut self, target: &mut dyn RenderTarget) {
        release(&mut self.font, target);
    }
}
