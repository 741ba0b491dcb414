//! Orthographic 2D camera

use glam::{Mat4, Vec2, Vec3};

/// Orthographic camera looking at a `viewport` sized window of the world,
/// shown on a `screen` sized surface (pixels, y down).
#[derive(Debug, Clone)]
pub struct Camera {
    /// World position of the view center
    pub position: Vec2,
    viewport: Vec2,
    screen: Vec2,
    combined: Mat4,
}

impl Camera {
    /// Camera showing `[0, width] x [0, height]`, y up
    pub fn orthographic(width: f32, height: f32) -> Self {
        let mut camera = Self {
            position: crate::viewport_center(width, height),
            viewport: Vec2::new(width, height),
            screen: Vec2::new(width, height),
            combined: Mat4::IDENTITY,
        };
        camera.update();
        camera
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn viewport_center(&self) -> Vec2 {
        crate::viewport_center(self.viewport.x, self.viewport.y)
    }

    /// Size of the surface pointer coordinates are reported in
    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen = Vec2::new(width.max(1.0), height.max(1.0));
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen
    }

    /// Recompute the combined projection-view matrix
    pub fn update(&mut self) {
        let half = self.viewport / 2.0;
        self.combined = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y - half.y,
            self.position.y + half.y,
            -1.0,
            1.0,
        );
    }

    pub fn combined(&self) -> Mat4 {
        self.combined
    }

    /// Screen pixel (origin top-left) to world coordinates
    pub fn unproject(&self, screen: Vec2) -> Vec2 {
        let ndc = Vec2::new(
            2.0 * screen.x / self.screen.x - 1.0,
            1.0 - 2.0 * screen.y / self.screen.y,
        );
        self.combined
            .inverse()
            .project_point3(Vec3::new(ndc.x, ndc.y, 0.0))
            .truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_unproject_corners_and_center() {
        let mut camera = Camera::orthographic(80.0, 48.0);
        camera.set_screen_size(800.0, 480.0);

        assert!(approx(camera.unproject(Vec2::new(400.0, 240.0)), Vec2::new(40.0, 24.0)));
        assert!(approx(camera.unproject(Vec2::new(0.0, 0.0)), Vec2::new(0.0, 48.0)));
        assert!(approx(camera.unproject(Vec2::new(800.0, 480.0)), Vec2::new(80.0, 0.0)));
    }

    #[test]
    fn test_unproject_follows_camera_position() {
        let mut camera = Camera::orthographic(80.0, 48.0);
        camera.position.x += 10.0;
        camera.update();

        // Default screen matches the viewport
        assert!(approx(camera.unproject(Vec2::new(40.0, 24.0)), Vec2::new(50.0, 24.0)));
    }

    #[test]
    fn test_zero_screen_is_guarded() {
        let mut camera = Camera::orthographic(80.0, 48.0);
        camera.set_screen_size(0.0, 0.0);
        assert_eq!(camera.screen_size(), Vec2::ONE);
    }
}
