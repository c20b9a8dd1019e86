use wobble_shading::ShadowSettings;

pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Square depth map rendered from the directional light.
pub struct ShadowMap {
    pub view: wgpu::TextureView,
    /// Comparison sampler for hardware PCF taps.
    pub sampler: wgpu::Sampler,
    pub resolution: u32,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device, settings: &ShadowSettings) -> Self {
        let resolution = settings.map_size.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow_map"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("shadow_map_view"),
            aspect: wgpu::TextureAspect::DepthOnly,
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        tracing::debug!("shadow map {resolution}x{resolution}");
        Self {
            view,
            sampler,
            resolution,
        }
    }

    /// Size of one texel in UV space, the PCF tap spacing.
    pub fn texel_size(&self) -> f32 {
        texel_size(self.resolution)
    }
}

pub(crate) fn texel_size(resolution: u32) -> f32 {
    1.0 / resolution.max(1) as f32
}
