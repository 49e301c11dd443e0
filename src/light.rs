//! The scene's single light and its drag controller.

use glam::{Mat4, Vec2, Vec3};

use crate::backend::LightingDesc;
use crate::options::{LightOptions, ShadowOptions};

/// Light type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightKind {
    /// Cone-shaped light; its cone is the shadow frustum.
    #[default]
    Spot,
}

/// A positioned light with ambient and diffuse colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// World-space position.
    pub position: Vec3,
    /// Point the light is aimed at.
    pub target: Vec3,
    /// Ambient color.
    pub ambient: Vec3,
    /// Diffuse color.
    pub diffuse: Vec3,
    /// Light type.
    pub kind: LightKind,
}

impl Light {
    /// Spot light configured from `options`.
    #[must_use]
    pub fn from_options(options: &LightOptions) -> Self {
        Self {
            position: Vec3::from_array(options.position),
            target: Vec3::from_array(options.target),
            ambient: Vec3::from_array(options.ambient),
            diffuse: Vec3::from_array(options.diffuse),
            kind: LightKind::Spot,
        }
    }

    /// Translate in the horizontal plane for a secondary-button drag:
    /// x follows vertical motion, z follows horizontal motion inversely.
    pub fn drag(&mut self, delta: Vec2, scale: f32) {
        self.position.x += delta.y * scale;
        self.position.z -= delta.x * scale;
    }

    /// World-to-light view matrix, aimed from `position` at `target`.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        let forward = self.target - self.position;
        // look_at is undefined when looking straight along the up axis.
        let up = if forward.normalize_or_zero().cross(Vec3::Y).length() < 1e-4 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.position, self.target, up)
    }

    /// Light view-projection for the shadow map.
    #[must_use]
    pub fn view_proj(&self, shadow: &ShadowOptions) -> Mat4 {
        let proj = Mat4::perspective_rh(
            shadow.fovy.to_radians(),
            1.0,
            shadow.znear,
            shadow.zfar,
        );
        proj * self.view()
    }

    /// Forward pass lighting inputs.
    #[must_use]
    pub fn lighting(&self, shadow: &ShadowOptions) -> LightingDesc {
        LightingDesc {
            position: self.position,
            ambient: self.ambient,
            diffuse: self.diffuse,
            view_proj: self.view_proj(shadow),
            depth_bias: shadow.depth_bias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_moves_in_horizontal_plane() {
        let mut light = Light::from_options(&LightOptions::default());
        light.drag(Vec2::new(4.0, 2.0), 0.5);
        assert_eq!(light.position, Vec3::new(31.0, 43.0, -28.0));
    }

    #[test]
    fn target_projects_to_shadow_map_center() {
        let light = Light::from_options(&LightOptions::default());
        let view_proj = light.view_proj(&ShadowOptions::default());
        let clip = view_proj * light.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn overhead_light_has_valid_view() {
        let mut light = Light::from_options(&LightOptions::default());
        light.position = Vec3::new(0.0, 40.0, 0.0);
        assert!(light.view().is_finite());
    }
}
