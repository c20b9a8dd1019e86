//! WGSL sources.
//!
//! The surface and shadow-depth shaders are concatenated from the same
//! uniform block and displacement chunk, so the shadow always matches the
//! visible silhouette.

/// Uniform block shared by every pipeline (group 0).
macro_rules! scene_block {
    () => {
        r#"
const PI: f32 = 3.141592653589793;
const TAU: f32 = 6.283185307179586;

struct Scene {
    view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
    color_a: vec4<f32>,
    color_b: vec4<f32>,
    // time, position frequency, time frequency, strength
    wobble_a: vec4<f32>,
    // warp position frequency, warp time frequency, warp strength, neighbour shift
    wobble_b: vec4<f32>,
    // metalness, roughness, transmission, ior
    material: vec4<f32>,
    // thickness, shadow normal bias, shadow texel size, exposure
    shading: vec4<f32>,
    // environment mip count
    env: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> scene: Scene;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) tangent: vec4<f32>,
};
"#
    };
}

/// 4D simplex noise, the wobble function and neighbour-based normals.
macro_rules! wobble_chunk {
    () => {
        r#"
fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_1(x: f32) -> f32 {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute_4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn permute_1(x: f32) -> f32 {
    return mod289_1(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt(r: f32) -> f32 {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn grad4(j: f32, ip: vec4<f32>) -> vec4<f32> {
    let pxyz = floor(fract(vec3<f32>(j) * ip.xyz) * 7.0) * ip.z - 1.0;
    let pw = 1.5 - dot(abs(pxyz), vec3<f32>(1.0));
    let p = vec4<f32>(pxyz, pw);
    let s = select(vec4<f32>(0.0), vec4<f32>(1.0), p < vec4<f32>(0.0));
    return vec4<f32>(pxyz + (s.xyz * 2.0 - 1.0) * s.www, pw);
}

fn simplex4(v: vec4<f32>) -> f32 {
    let c = vec4<f32>(0.138196601125011, 0.276393202250021, 0.414589803375032, -0.447213595499958);
    let f4 = 0.309016994374947451;

    var i = floor(v + dot(v, vec4<f32>(f4)));
    let x0 = v - i + dot(i, vec4<f32>(c.x));

    let is_x = step(x0.yzw, x0.xxx);
    let is_yz = step(x0.zww, x0.yyz);
    var i0 = vec4<f32>(is_x.x + is_x.y + is_x.z, 1.0 - is_x);
    i0.y += is_yz.x + is_yz.y;
    i0.z += 1.0 - is_yz.x;
    i0.w += 1.0 - is_yz.y;
    i0.z += is_yz.z;
    i0.w += 1.0 - is_yz.z;

    let i3 = clamp(i0, vec4<f32>(0.0), vec4<f32>(1.0));
    let i2 = clamp(i0 - 1.0, vec4<f32>(0.0), vec4<f32>(1.0));
    let i1 = clamp(i0 - 2.0, vec4<f32>(0.0), vec4<f32>(1.0));

    let x1 = x0 - i1 + c.x;
    let x2 = x0 - i2 + c.y;
    let x3 = x0 - i3 + c.z;
    let x4 = x0 + c.w;

    i = mod289_4(i);
    let j0 = permute_1(permute_1(permute_1(permute_1(i.w) + i.z) + i.y) + i.x);
    let j1 = permute_4(permute_4(permute_4(permute_4(
        i.w + vec4<f32>(i1.w, i2.w, i3.w, 1.0))
        + i.z + vec4<f32>(i1.z, i2.z, i3.z, 1.0))
        + i.y + vec4<f32>(i1.y, i2.y, i3.y, 1.0))
        + i.x + vec4<f32>(i1.x, i2.x, i3.x, 1.0));

    let ip = vec4<f32>(1.0 / 294.0, 1.0 / 49.0, 1.0 / 7.0, 0.0);
    var p0 = grad4(j0, ip);
    var p1 = grad4(j1.x, ip);
    var p2 = grad4(j1.y, ip);
    var p3 = grad4(j1.z, ip);
    var p4 = grad4(j1.w, ip);
    p0 *= taylor_inv_sqrt(dot(p0, p0));
    p1 *= taylor_inv_sqrt(dot(p1, p1));
    p2 *= taylor_inv_sqrt(dot(p2, p2));
    p3 *= taylor_inv_sqrt(dot(p3, p3));
    p4 *= taylor_inv_sqrt(dot(p4, p4));

    var m0 = max(0.6 - vec3<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2)), vec3<f32>(0.0));
    var m1 = max(0.6 - vec2<f32>(dot(x3, x3), dot(x4, x4)), vec2<f32>(0.0));
    m0 = m0 * m0;
    m1 = m1 * m1;
    return 49.0 * (dot(m0 * m0, vec3<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2)))
        + dot(m1 * m1, vec2<f32>(dot(p3, x3), dot(p4, x4))));
}

fn wobble_at(position: vec3<f32>) -> f32 {
    let time = scene.wobble_a.x;
    let warp = simplex4(vec4<f32>(position * scene.wobble_b.x, time * scene.wobble_b.y)) * scene.wobble_b.z;
    let warped = position + vec3<f32>(warp);
    return simplex4(vec4<f32>(warped * scene.wobble_a.y, time * scene.wobble_a.z)) * scene.wobble_a.w;
}

fn normalize_or_zero(v: vec3<f32>) -> vec3<f32> {
    let len = length(v);
    if (len > 0.0) {
        return v / len;
    }
    return vec3<f32>(0.0);
}

struct Displaced {
    position: vec3<f32>,
    normal: vec3<f32>,
    wobble: f32,
};

fn displace(position: vec3<f32>, normal: vec3<f32>, tangent: vec3<f32>) -> Displaced {
    let bitangent = cross(normal, tangent);
    let shift = scene.wobble_b.w;

    let wobble = wobble_at(position);
    let moved = position + normal * wobble;

    var a = position + tangent * shift;
    var b = position + bitangent * shift;
    a += normal * wobble_at(a);
    b += normal * wobble_at(b);

    let rebuilt = normalize_or_zero(cross(normalize_or_zero(a - moved), normalize_or_zero(b - moved)));

    var out: Displaced;
    out.position = moved;
    out.normal = select(rebuilt, normal, all(rebuilt == vec3<f32>(0.0)));
    out.wobble = wobble;
    return out;
}

fn equirect_uv(direction: vec3<f32>) -> vec2<f32> {
    let d = normalize(direction);
    return vec2<f32>(atan2(d.z, d.x) / TAU + 0.5, 0.5 - asin(clamp(d.y, -1.0, 1.0)) / PI);
}
"#
    };
}

/// Environment and shadow bindings (group 1).
macro_rules! lighting_block {
    () => {
        r#"
@group(1) @binding(0)
var env_texture: texture_2d<f32>;
@group(1) @binding(1)
var env_sampler: sampler;
@group(1) @binding(2)
var shadow_map: texture_depth_2d;
@group(1) @binding(3)
var shadow_sampler: sampler_comparison;

fn sample_env(direction: vec3<f32>, lod: f32) -> vec3<f32> {
    let max_lod = max(scene.env.x - 1.0, 0.0);
    return textureSampleLevel(env_texture, env_sampler, equirect_uv(direction), clamp(lod, 0.0, max_lod)).rgb;
}
"#
    };
}

/// Visible wobble surface: displaced, lit, shadowed and tone mapped.
pub const SURFACE_SHADER: &str = concat!(
    scene_block!(),
    wobble_chunk!(),
    lighting_block!(),
    r#"
struct SurfaceVarying {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) wobble: f32,
};

@vertex
fn vs_surface(vertex: VertexInput) -> SurfaceVarying {
    let d = displace(vertex.position, vertex.normal, vertex.tangent.xyz);
    var out: SurfaceVarying;
    out.clip_position = scene.view_proj * vec4<f32>(d.position, 1.0);
    out.world_position = d.position;
    out.normal = d.normal;
    // Zero strength leaves the ramp at its midpoint.
    out.wobble = select(d.wobble / scene.wobble_a.w, 0.0, scene.wobble_a.w == 0.0);
    return out;
}

fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let d = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return a2 / (PI * d * d);
}

fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = r * r / 8.0;
    let gv = n_dot_v / (n_dot_v * (1.0 - k) + k);
    let gl = n_dot_l / (n_dot_l * (1.0 - k) + k);
    return gv * gl;
}

fn fresnel_schlick(cos_theta: f32, f0: vec3<f32>) -> vec3<f32> {
    return f0 + (1.0 - f0) * pow(clamp(1.0 - cos_theta, 0.0, 1.0), 5.0);
}

fn fresnel_schlick_roughness(cos_theta: f32, f0: vec3<f32>, roughness: f32) -> vec3<f32> {
    return f0 + (max(vec3<f32>(1.0 - roughness), f0) - f0) * pow(clamp(1.0 - cos_theta, 0.0, 1.0), 5.0);
}

fn shadow_factor(world_position: vec3<f32>, normal: vec3<f32>) -> f32 {
    let biased = world_position + normal * scene.shading.y;
    let clip = scene.light_view_proj * vec4<f32>(biased, 1.0);
    let ndc = clip.xyz / clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    if (any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || ndc.z > 1.0) {
        return 1.0;
    }
    let texel = scene.shading.z;
    var sum = 0.0;
    for (var y = -1; y <= 1; y++) {
        for (var x = -1; x <= 1; x++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            sum += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, ndc.z);
        }
    }
    return sum / 9.0;
}

fn rrt_and_odt_fit(v: vec3<f32>) -> vec3<f32> {
    let a = v * (v + 0.0245786) - 0.000090537;
    let b = v * (0.983729 * v + 0.4329510) + 0.238081;
    return a / b;
}

fn aces_filmic(color: vec3<f32>, exposure: f32) -> vec3<f32> {
    let aces_input = mat3x3<f32>(
        vec3<f32>(0.59719, 0.07600, 0.02840),
        vec3<f32>(0.35458, 0.90834, 0.13383),
        vec3<f32>(0.04823, 0.01566, 0.83777),
    );
    let aces_output = mat3x3<f32>(
        vec3<f32>(1.60475, -0.10208, -0.00327),
        vec3<f32>(-0.53108, 1.10813, -0.07276),
        vec3<f32>(-0.07367, -0.00605, 1.07602),
    );
    var c = color * (exposure / 0.6);
    c = aces_input * c;
    c = rrt_and_odt_fit(c);
    c = aces_output * c;
    return clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_surface(in: SurfaceVarying) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let v = normalize(scene.camera_pos.xyz - in.world_position);
    let l = scene.light_dir.xyz;

    let albedo = mix(scene.color_a.rgb, scene.color_b.rgb, smoothstep(-1.0, 1.0, in.wobble));
    let metalness = scene.material.x;
    let roughness = clamp(scene.material.y, 0.04, 1.0);
    let transmission = scene.material.z;
    let ior = scene.material.w;
    let thickness = scene.shading.x;
    let mips = scene.env.x;

    let r0 = (ior - 1.0) / (ior + 1.0);
    let dielectric = r0 * r0;
    let f0 = mix(vec3<f32>(min(dielectric, 1.0)), albedo, metalness);

    // Direct light
    let h = normalize(l + v);
    let n_dot_l = max(dot(n, l), 0.0);
    let n_dot_v = max(dot(n, v), 1e-4);
    let n_dot_h = max(dot(n, h), 0.0);
    let v_dot_h = max(dot(v, h), 0.0);
    let f = fresnel_schlick(v_dot_h, f0);
    let specular = distribution_ggx(n_dot_h, roughness) * geometry_smith(n_dot_v, n_dot_l, roughness) * f
        / (4.0 * n_dot_v * n_dot_l + 1e-4);
    let kd = (1.0 - f) * (1.0 - metalness);
    let irradiance = scene.light_color.rgb * n_dot_l * shadow_factor(in.world_position, n);
    let direct_diffuse = kd * albedo / PI * irradiance;
    let direct_specular = specular * irradiance;

    // Image-based light
    let f_env = fresnel_schlick_roughness(n_dot_v, f0, roughness);
    let env_diffuse = (1.0 - f_env) * (1.0 - metalness) * albedo * sample_env(n, mips - 2.0);
    let env_specular = f_env * sample_env(reflect(-v, n), roughness * (mips - 1.0));

    // Transmission bends the view ray by the refraction, scaled by thickness.
    let straight = -v;
    var refracted = refract(straight, n, 1.0 / max(ior, 1e-3));
    if (all(refracted == vec3<f32>(0.0))) {
        refracted = straight;
    }
    let through = normalize_or_zero(straight + (refracted - straight) * thickness);
    let transmitted = albedo * sample_env(select(through, straight, all(through == vec3<f32>(0.0))), roughness * (mips - 1.0));

    let diffuse = mix(direct_diffuse + env_diffuse, transmitted * (1.0 - metalness), transmission);
    let color = diffuse + direct_specular + env_specular;
    return vec4<f32>(aces_filmic(color, scene.shading.w), 1.0);
}
"#
);

/// Depth-only shader for rendering the wobble from the light.
pub const DEPTH_SHADER: &str = concat!(
    scene_block!(),
    wobble_chunk!(),
    r#"
@vertex
fn vs_depth(vertex: VertexInput) -> @builtin(position) vec4<f32> {
    let d = displace(vertex.position, vertex.normal, vertex.tangent.xyz);
    return scene.light_view_proj * vec4<f32>(d.position, 1.0);
}
"#
);

/// Fullscreen equirectangular background.
pub const BACKGROUND_SHADER: &str = concat!(
    scene_block!(),
    wobble_chunk!(),
    lighting_block!(),
    r#"
struct BackgroundVarying {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_background(@builtin(vertex_index) index: u32) -> BackgroundVarying {
    let corner = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    let ndc = corner * 2.0 - 1.0;
    var out: BackgroundVarying;
    out.clip_position = vec4<f32>(ndc, 1.0, 1.0);
    out.ndc = ndc;
    return out;
}

@fragment
fn fs_background(in: BackgroundVarying) -> @location(0) vec4<f32> {
    let far = scene.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let direction = far.xyz / far.w - scene.camera_pos.xyz;
    return vec4<f32>(sample_env(direction, 0.0), 1.0);
}
"#
);

/// Stretches the scene target over the window-sized swapchain.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var scene_color: texture_2d<f32>;
@group(0) @binding(1)
var scene_sampler: sampler;

struct BlitVarying {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitVarying {
    let corner = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: BlitVarying;
    out.clip_position = vec4<f32>(corner * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}

@fragment
fn fs_blit(in: BlitVarying) -> @location(0) vec4<f32> {
    return textureSample(scene_color, scene_sampler, in.uv);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_and_depth_share_the_displacement() {
        let chunk = wobble_chunk!();
        assert!(SURFACE_SHADER.contains(chunk));
        assert!(DEPTH_SHADER.contains(chunk));
        assert!(chunk.contains("fn displace("));
        assert!(chunk.contains("fn simplex4("));
    }

    #[test]
    fn entry_points_exist() {
        assert!(SURFACE_SHADER.contains("fn vs_surface("));
        assert!(SURFACE_SHADER.contains("fn fs_surface("));
        assert!(DEPTH_SHADER.contains("fn vs_depth("));
        assert!(!DEPTH_SHADER.contains("@fragment"));
        assert!(BACKGROUND_SHADER.contains("fn vs_background("));
        assert!(BACKGROUND_SHADER.contains("fn fs_background("));
        assert!(BLIT_SHADER.contains("fn vs_blit("));
        assert!(BLIT_SHADER.contains("fn fs_blit("));
    }

    #[test]
    fn only_lit_shaders_bind_group_one() {
        assert!(SURFACE_SHADER.contains("@group(1)"));
        assert!(BACKGROUND_SHADER.contains("@group(1)"));
        assert!(!DEPTH_SHADER.contains("@group(1)"));
    }

    fn validate(source: &str) {
        use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
        let module = wgpu::naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(source)));
        Validator::new(ValidationFlags::all(), Capabilities::empty())
            .validate(&module)
            .unwrap_or_else(|e| panic!("{}", e.emit_to_string(source)));
    }

    #[test]
    fn surface_shader_validates() {
        validate(SURFACE_SHADER);
    }

    #[test]
    fn depth_shader_validates() {
        validate(DEPTH_SHADER);
    }

    #[test]
    fn background_shader_validates() {
        validate(BACKGROUND_SHADER);
    }

    #[test]
    fn blit_shader_validates() {
        validate(BLIT_SHADER);
    }

    #[test]
    fn neighbour_shift_comes_from_uniforms() {
        assert!(wobble_chunk!().contains("scene.wobble_b.w"));
    }
}
