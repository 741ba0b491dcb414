//! Scrolling pillar columns
//!
//! Each column is a pair of kinematic pillars around a gap. Columns scroll
//! left and are recycled to the right edge with a fresh gap drawn from a
//! seeded RNG. The generator state is persisted with the columns so a
//! restored layout keeps drawing the same gaps.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{CreateContext, GameObject, release};
use crate::persistence::{ColumnRecord, EntityRecord};
use crate::platform::{Camera, RenderTarget, Sprite, TextureId};
use crate::sim::{BodyHandle, BodyKind, World};

pub const COLUMN_COUNT: usize = 3;
pub const PILLAR_HALF_WIDTH: f32 = 2.0;
/// Half height of the gap between pillars
pub const GAP_HALF: f32 = 8.0;
/// Leftward scroll speed (units/s)
pub const SCROLL_SPEED: f32 = 8.0;
/// Minimum pillar height around a gap
const GAP_MARGIN: f32 = 4.0;

#[derive(Debug)]
struct Column {
    x: f32,
    gap_y: f32,
    scored: bool,
    top: Option<BodyHandle>,
    bottom: Option<BodyHandle>,
}

#[derive(Debug)]
pub struct Obstacles {
    seed: u64,
    rng: Pcg32,
    draws: u64,
    passed: u64,
    columns: Vec<Column>,
    viewport: Vec2,
    spacing: f32,
    texture: Option<TextureId>,
}

impl Obstacles {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            draws: 0,
            passed: 0,
            columns: Vec::new(),
            viewport: Vec2::ZERO,
            spacing: 0.0,
            texture: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Columns the player has flown past since the last reset
    pub fn passed(&self) -> u64 {
        self.passed
    }

    /// Column positions as `(x, gap_y)`
    pub fn layout(&self) -> Vec<(f32, f32)> {
        self.columns.iter().map(|c| (c.x, c.gap_y)).collect()
    }

    /// Count columns whose trailing edge just moved behind `player_x`
    pub fn take_newly_passed(&mut self, player_x: f32) -> u32 {
        let mut newly = 0;
        for column in &mut self.columns {
            if !column.scored && column.x + PILLAR_HALF_WIDTH < player_x {
                column.scored = true;
                newly += 1;
            }
        }
        self.passed += u64::from(newly);
        newly
    }

    fn draw_gap(&mut self) -> f32 {
        self.draws = self.draws.saturating_add(1);
        let lo = GAP_HALF + GAP_MARGIN;
        let hi = self.viewport.y - GAP_HALF - GAP_MARGIN;
        if hi.is_nan() || hi <= lo {
            // No room to vary the gap
            return self.viewport.y / 2.0;
        }
        self.rng.random_range(lo..hi)
    }

    fn start_x(&self, index: usize) -> f32 {
        self.viewport.x + PILLAR_HALF_WIDTH + index as f32 * self.spacing
    }

    /// Lay the columns out as at the start of a run
    fn relayout(&mut self, world: &mut World) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.draws = 0;
        self.passed = 0;
        for i in 0..self.columns.len() {
            let gap_y = self.draw_gap();
            let x = self.start_x(i);
            let column = &mut self.columns[i];
            column.x = x;
            column.gap_y = gap_y;
            column.scored = false;
            place(column, self.viewport.y, world);
        }
    }
}

/// Move a column's pillar bodies to match its `x`/`gap_y`
fn place(column: &Column, height: f32, world: &mut World) {
    let gap_top = column.gap_y + GAP_HALF;
    let gap_bottom = column.gap_y - GAP_HALF;
    let velocity = Vec2::new(-SCROLL_SPEED, 0.0);

    if let Some(body) = column.top.and_then(|h| world.body_mut(h)) {
        body.pos = Vec2::new(column.x, (gap_top + height) / 2.0);
        body.half_extents = Vec2::new(PILLAR_HALF_WIDTH, ((height - gap_top) / 2.0).max(0.0));
        body.vel = velocity;
    }
    if let Some(body) = column.bottom.and_then(|h| world.body_mut(h)) {
        body.pos = Vec2::new(column.x, gap_bottom / 2.0);
        body.half_extents = Vec2::new(PILLAR_HALF_WIDTH, (gap_bottom / 2.0).max(0.0));
        body.vel = velocity;
    }
}

impl GameObject for Obstacles {
    fn create(&mut self, ctx: &mut CreateContext<'_>) {
        self.texture = Some(ctx.target.load_texture("pillar.png"));
        self.viewport = ctx.camera.viewport();
        self.spacing = (self.viewport.x + 2.0 * PILLAR_HALF_WIDTH) / COLUMN_COUNT as f32;

        self.columns = (0..COLUMN_COUNT)
            .map(|_| Column {
                x: 0.0,
                gap_y: 0.0,
                scored: false,
                top: Some(ctx.world.create_body(BodyKind::Kinematic, Vec2::ZERO, Vec2::ZERO)),
                bottom: Some(ctx.world.create_body(BodyKind::Kinematic, Vec2::ZERO, Vec2::ZERO)),
            })
            .collect();
        self.relayout(ctx.world);
    }

    fn pre_render(&mut self, _camera: &Camera, world: &mut World) {
        let cycle = self.spacing * COLUMN_COUNT as f32;
        for i in 0..self.columns.len() {
            let Some(x) = self.columns[i].top.and_then(|h| world.position(h)).map(|p| p.x) else {
                continue;
            };
            self.columns[i].x = x;
            if x + PILLAR_HALF_WIDTH < 0.0 {
                let gap_y = self.draw_gap();
                let column = &mut self.columns[i];
                column.x = x + cycle;
                column.gap_y = gap_y;
                column.scored = false;
                place(column, self.viewport.y, world);
            }
        }
    }

    fn render(&self, target: &mut dyn RenderTarget, _camera: &Camera) {
        let Some(texture) = self.texture else { return };
        let width = PILLAR_HALF_WIDTH * 2.0;
        for column in &self.columns {
            let gap_top = column.gap_y + GAP_HALF;
            let gap_bottom = column.gap_y - GAP_HALF;
            target.draw(&Sprite::new(
                texture,
                Vec2::new(column.x, (gap_top + self.viewport.y) / 2.0),
                Vec2::new(width, self.viewport.y - gap_top),
            ));
            target.draw(&Sprite::new(
                texture,
                Vec2::new(column.x, gap_bottom / 2.0),
                Vec2::new(width, gap_bottom),
            ));
        }
    }

    fn dispose(&mut self, target: &mut dyn RenderTarget) {
        release(&mut self.texture, target);
    }

    fn reset(&mut self, world: &mut World) {
        self.relayout(world);
    }

    fn snapshot(&self, _world: &World) -> Option<EntityRecord> {
        Some(EntityRecord::Obstacles {
            seed: self.seed,
            rng: self.rng.clone(),
            draws: self.draws,
            passed: self.passed,
            columns: self
                .columns
                .iter()
                .map(|c| ColumnRecord {
                    x: c.x,
                    gap_y: c.gap_y,
                    scored: c.scored,
                })
                .collect(),
        })
    }

    fn restore(&mut self, record: &EntityRecord, world: &mut World) -> bool {
        let EntityRecord::Obstacles {
            seed,
            rng,
            draws,
            passed,
            columns,
        } = record
        else {
            return false;
        };
        if columns.len() != self.columns.len() {
            log::warn!(
                "Obstacle snapshot has {} columns, expected {}",
                columns.len(),
                self.columns.len()
            );
            return false;
        }

        self.seed = *seed;
        self.rng = rng.clone();
        self.draws = *draws;
        self.passed = *passed;

        for (column, saved) in self.columns.iter_mut().zip(columns) {
            column.x = saved.x;
            column.gap_y = saved.gap_y;
            column.scored = saved.scored;
            place(column, self.viewport.y, world);
        }
        true
    }
}
