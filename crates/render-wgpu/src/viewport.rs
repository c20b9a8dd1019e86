/// Window size and the pixel ratio the scene renders at.
///
/// High-DPI screens are capped at `max_pixel_ratio` device pixels per
/// logical pixel; beyond that the wobble shader costs more than it shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub physical_width: u32,
    pub physical_height: u32,
    pub scale_factor: f32,
    pub max_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f32, max_pixel_ratio: f32) -> Self {
        Self {
            physical_width,
            physical_height,
            scale_factor: if scale_factor > 0.0 { scale_factor } else { 1.0 },
            max_pixel_ratio: max_pixel_ratio.max(1.0),
        }
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.scale_factor.min(self.max_pixel_ratio)
    }

    pub fn logical_size(&self) -> (f32, f32) {
        (
            self.physical_width as f32 / self.scale_factor,
            self.physical_height as f32 / self.scale_factor,
        )
    }

    /// Size of the render targets, never zero.
    pub fn render_size(&self) -> (u32, u32) {
        let (w, h) = self.logical_size();
        let ratio = self.pixel_ratio();
        (
            ((w * ratio).round() as u32).max(1),
            ((h * ratio).round() as u32).max(1),
        )
    }

    /// Size of the swapchain, which always matches the window.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.physical_width.max(1), self.physical_height.max(1))
    }

    pub fn aspect(&self) -> f32 {
        let (w, h) = self.render_size();
        w as f32 / h as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_dpi_renders_at_window_size() {
        let vp = Viewport::new(1280, 720, 1.0, 2.0);
        assert_eq!(vp.render_size(), (1280, 720));
        assert!((vp.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn high_dpi_is_capped() {
        // A 3x screen with a 1000x500 logical window renders at 2x.
        let vp = Viewport::new(3000, 1500, 3.0, 2.0);
        assert_eq!(vp.pixel_ratio(), 2.0);
        assert_eq!(vp.render_size(), (2000, 1000));
        assert_eq!(vp.surface_size(), (3000, 1500));
    }

    #[test]
    fn retina_under_the_cap_is_untouched() {
        let vp = Viewport::new(2560, 1440, 2.0, 2.0);
        assert_eq!(vp.render_size(), (2560, 1440));
    }

    #[test]
    fn minimised_window_never_zero() {
        let vp = Viewport::new(0, 0, 1.0, 2.0);
        assert_eq!(vp.render_size(), (1, 1));
        let odd = Viewport::new(800, 600, 0.0, 0.0);
        assert_eq!(odd.scale_factor, 1.0);
        assert_eq!(odd.max_pixel_ratio, 1.0);
    }
}
