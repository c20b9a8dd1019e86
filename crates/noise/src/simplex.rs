use glam::Vec4;

/// Skew factor for 4D: (sqrt(5) - 1) / 4.
const F4: f32 = 0.309_017;

/// Unskew offsets: G4, 2*G4, 3*G4, -1 + 4*G4 with G4 = (5 - sqrt(5)) / 20.
const C: Vec4 = Vec4::new(0.138_196_6, 0.276_393_2, 0.414_589_8, -0.447_213_6);

fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(v: Vec4) -> Vec4 {
    Vec4::new(mod289(v.x), mod289(v.y), mod289(v.z), mod289(v.w))
}

/// Polynomial hash over integers in `[0, 289)`. Exact in f32.
fn permute(x: f32) -> f32 {
    mod289(((x * 34.0) + 1.0) * x)
}

fn taylor_inv_sqrt(r: f32) -> f32 {
    1.792_842_9 - 0.853_734_7 * r
}

/// GLSL/WGSL `step`: 0 when `x < edge`, else 1.
fn step(edge: f32, x: f32) -> f32 {
    if x < edge { 0.0 } else { 1.0 }
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn grad4(j: f32, ip: Vec4) -> Vec4 {
    let px = (fract(j * ip.x) * 7.0).floor() * ip.z - 1.0;
    let py = (fract(j * ip.y) * 7.0).floor() * ip.z - 1.0;
    let pz = (fract(j * ip.z) * 7.0).floor() * ip.z - 1.0;
    let pw = 1.5 - (px.abs() + py.abs() + pz.abs());

    let s = Vec4::new(
        less_than_zero(px),
        less_than_zero(py),
        less_than_zero(pz),
        less_than_zero(pw),
    );
    Vec4::new(
        px + (s.x * 2.0 - 1.0) * s.w,
        py + (s.y * 2.0 - 1.0) * s.w,
        pz + (s.z * 2.0 - 1.0) * s.w,
        pw,
    )
}

fn less_than_zero(x: f32) -> f32 {
    if x < 0.0 { 1.0 } else { 0.0 }
}

/// Corner hash for the lattice point `i + offset`, hashed w, z, y, x.
fn corner_hash(i: Vec4, offset: Vec4) -> f32 {
    let w = permute(i.w + offset.w);
    let z = permute(w + i.z + offset.z);
    let y = permute(z + i.y + offset.y);
    permute(y + i.x + offset.x)
}

/// 4D simplex noise.
///
/// Space goes in `xyz` and time in `w`, so a 3D field can evolve smoothly.
/// The result lies roughly in `[-1, 1]`.
pub fn simplex4(v: Vec4) -> f32 {
    // First corner
    let i = (v + Vec4::splat(v.dot(Vec4::splat(F4)))).floor();
    let x0 = v - i + Vec4::splat(i.dot(Vec4::splat(C.x)));

    // Rank the components of x0 to find the simplex we are in.
    let is_x = [step(x0.y, x0.x), step(x0.z, x0.x), step(x0.w, x0.x)];
    let is_yz = [step(x0.z, x0.y), step(x0.w, x0.y), step(x0.w, x0.z)];
    let mut i0 = Vec4::new(
        is_x[0] + is_x[1] + is_x[2],
        1.0 - is_x[0],
        1.0 - is_x[1],
        1.0 - is_x[2],
    );
    i0.y += is_yz[0] + is_yz[1];
    i0.z += 1.0 - is_yz[0];
    i0.w += 1.0 - is_yz[1];
    i0.z += is_yz[2];
    i0.w += 1.0 - is_yz[2];

    let i3 = i0.clamp(Vec4::ZERO, Vec4::ONE);
    let i2 = (i0 - Vec4::ONE).clamp(Vec4::ZERO, Vec4::ONE);
    let i1 = (i0 - Vec4::splat(2.0)).clamp(Vec4::ZERO, Vec4::ONE);

    let x1 = x0 - i1 + Vec4::splat(C.x);
    let x2 = x0 - i2 + Vec4::splat(C.y);
    let x3 = x0 - i3 + Vec4::splat(C.z);
    let x4 = x0 + Vec4::splat(C.w);

    // Permutations
    let i = mod289_4(i);
    let j0 = corner_hash(i, Vec4::ZERO);
    let j1 = Vec4::new(
        corner_hash(i, i1),
        corner_hash(i, i2),
        corner_hash(i, i3),
        corner_hash(i, Vec4::ONE),
    );

    // Gradients: 7x7x6 points over a cube, mapped onto a 4-cross polytope.
    let ip = Vec4::new(1.0 / 294.0, 1.0 / 49.0, 1.0 / 7.0, 0.0);
    let mut p0 = grad4(j0, ip);
    let mut p1 = grad4(j1.x, ip);
    let mut p2 = grad4(j1.y, ip);
    let mut p3 = grad4(j1.z, ip);
    let mut p4 = grad4(j1.w, ip);

    p0 *= taylor_inv_sqrt(p0.dot(p0));
    p1 *= taylor_inv_sqrt(p1.dot(p1));
    p2 *= taylor_inv_sqrt(p2.dot(p2));
    p3 *= taylor_inv_sqrt(p3.dot(p3));
    p4 *= taylor_inv_sqrt(p4.dot(p4));

    // Mix contributions from the five corners.
    let falloff = |x: Vec4| {
        let m = (0.6 - x.dot(x)).max(0.0);
        let m2 = m * m;
        m2 * m2
    };
    49.0 * (falloff(x0) * p0.dot(x0)
        + falloff(x1) * p1.dot(x1)
        + falloff(x2) * p2.dot(x2)
        + falloff(x3) * p3.dot(x3)
        + falloff(x4) * p4.dot(x4))
}
