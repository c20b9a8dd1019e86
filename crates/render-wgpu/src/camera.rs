use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};

/// Polar angle is kept this far away from the poles so `look_at` stays valid.
const POLE_EPSILON: f32 = 1e-4;

/// Orbit camera around a target with damped rotate, pan and zoom.
///
/// Input accumulates into pending deltas; [`update`](Self::update) applies a
/// `damping` fraction of them each frame and decays the rest, so motion eases
/// out after the pointer stops.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    /// Azimuth around +Y, measured from +Z towards +X.
    pub theta: f32,
    /// Polar angle from +Y.
    pub phi: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub damping: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_pan: Vec3,
    pending_scale: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_at(Vec3::new(13.0, -3.0, -5.0), Vec3::ZERO)
    }
}

impl OrbitCamera {
    /// A camera at `position` orbiting `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let radius = offset.length().max(1e-3);
        Self {
            target,
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            fov: 35.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
            damping: 0.05,
            min_radius: 0.5,
            max_radius: 50.0,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_pan: Vec3::ZERO,
            pending_scale: 1.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        self.target + self.radius * Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta)
    }

    /// Rotate by a pointer drag of `dx, dy` pixels on a viewport `height`
    /// pixels tall. A drag across the full height turns a full circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, height: f32) {
        let height = height.max(1.0);
        self.pending_theta -= TAU * dx / height;
        self.pending_phi -= TAU * dy / height;
    }

    /// Pan so the point under the cursor follows it.
    pub fn pan(&mut self, dx: f32, dy: f32, height: f32) {
        let height = height.max(1.0);
        let view = self.view_matrix().inverse();
        let right = view.x_axis.truncate();
        let up = view.y_axis.truncate();
        let distance = self.radius * (self.fov * 0.5).tan();
        self.pending_pan += -right * (2.0 * dx * distance / height);
        self.pending_pan += up * (2.0 * dy * distance / height);
    }

    /// Dolly in for positive `steps`, out for negative ones.
    pub fn zoom(&mut self, steps: f32) {
        self.pending_scale *= 0.95_f32.powf(steps);
    }

    /// Apply pending input. Call once per frame.
    pub fn update(&mut self) {
        self.theta += self.pending_theta * self.damping;
        self.phi += self.pending_phi * self.damping;
        self.target += self.pending_pan * self.damping;
        self.radius = (self.radius * self.pending_scale).clamp(self.min_radius, self.max_radius);

        self.theta = self.theta.rem_euclid(TAU);
        self.phi = self.phi.clamp(POLE_EPSILON, PI - POLE_EPSILON);

        let decay = 1.0 - self.damping;
        self.pending_theta *= decay;
        self.pending_phi *= decay;
        self.pending_pan *= decay;
        self.pending_scale = 1.0;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_matches_scene() {
        let cam = OrbitCamera::default();
        assert!((cam.position() - Vec3::new(13.0, -3.0, -5.0)).length() < 1e-4);
        assert_eq!(cam.near, 0.1);
        assert_eq!(cam.far, 100.0);
        assert!((cam.fov.to_degrees() - 35.0).abs() < 1e-4);
    }

    #[test]
    fn target_projects_to_centre() {
        let cam = OrbitCamera::default();
        let ndc = cam.view_projection().project_point3(cam.target);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn rotation_keeps_distance_and_eases_out() {
        let mut cam = OrbitCamera::default();
        let start = cam.position();
        cam.rotate(120.0, 30.0, 720.0);
        cam.update();
        let after_one = cam.position();
        assert_ne!(after_one, start);
        assert!((after_one.length() - start.length()).abs() < 1e-3);

        let first_step = after_one.distance(start);
        for _ in 0..200 {
            cam.update();
        }
        let last = cam.position();
        cam.update();
        let tail_step = cam.position().distance(last);
        assert!(tail_step < first_step);
        assert!(tail_step < 1e-4);
    }

    #[test]
    fn zoom_changes_radius_within_limits() {
        let mut cam = OrbitCamera::default();
        let r = cam.radius;
        cam.zoom(3.0);
        cam.update();
        assert!(cam.radius < r);
        cam.zoom(-1000.0);
        cam.update();
        assert_eq!(cam.radius, cam.max_radius);
    }

    #[test]
    fn pan_moves_target_sideways() {
        let mut cam = OrbitCamera::default();
        let forward = (cam.target - cam.position()).normalize();
        cam.pan(50.0, 0.0, 720.0);
        for _ in 0..300 {
            cam.update();
        }
        assert!(cam.target.length() > 0.1);
        assert!(cam.target.normalize().dot(forward).abs() < 1e-3);
    }

    #[test]
    fn phi_never_reaches_pole() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, -100_000.0, 720.0);
        for _ in 0..50 {
            cam.update();
        }
        assert!(cam.phi > 0.0 && cam.phi < PI);
        assert!(!cam.view_matrix().is_nan());
    }
}
