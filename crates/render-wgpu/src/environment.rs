use wgpu::util::DeviceExt;
use wobble_assets::EnvironmentMap;

/// The environment map on the GPU, with its full mip chain.
pub struct EnvironmentTexture {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub mip_count: u32,
}

impl EnvironmentTexture {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, map: &EnvironmentMap) -> Self {
        let mip_count = map.mips.len().max(1) as u32;
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("environment"),
                size: wgpu::Extent3d {
                    width: map.width().max(1),
                    height: map.height().max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: mip_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &map.level_major_bytes(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Longitude wraps, latitude does not.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("environment_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        tracing::info!(
            "environment uploaded: {}x{}, {mip_count} mips",
            map.width(),
            map.height()
        );
        Self {
            view,
            sampler,
            mip_count,
        }
    }
}
