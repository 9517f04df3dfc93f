use std::f32::consts::PI;

use glam::{uvec2, Mat4, UVec2};

/// Pinhole model of the camera delivering the frames.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraModel {
    width: u32,
    height: u32,
    fov_x: f32,
}

impl CameraModel {
    pub fn new(width: u32, height: u32, fov_x: f32) -> Self {
        assert!(width > 0 && height > 0, "camera resolution must not be empty");
        assert!(
            fov_x > 0.0 && fov_x < PI,
            "horizontal field of view out of range: {fov_x}"
        );

        Self {
            width,
            height,
            fov_x,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        uvec2(self.width, self.height)
    }

    pub fn fov_x(&self) -> f32 {
        self.fov_x
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn fov_y(&self) -> f32 {
        2.0 * ((self.fov_x / 2.0).tan() / self.aspect()).atan()
    }

    /// Perspective projection for this camera within the given clip bounds.
    pub fn projection(&self, near: f32, far: f32) -> Mat4 {
        assert!(near > 0.0 && far > near);

        Mat4::perspective_rh(self.fov_y(), self.aspect(), near, far)
    }

    /// Variant with a 20% larger viewport and an extra 20° of horizontal
    /// field of view; used to pre-texture a neighborhood around the actual
    /// view so that geometry entering the screen later pops less.
    pub fn widened(&self) -> Self {
        Self::new(
            self.width * 6 / 5,
            self.height * 6 / 5,
            self.fov_x + 20.0f32.to_radians(),
        )
    }
}
