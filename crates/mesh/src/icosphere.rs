use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// Non-indexed triangles: every three consecutive vertices form one face.
#[derive(Debug, Clone, Default)]
pub struct TriangleSoup {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
}

impl TriangleSoup {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn push(&mut self, p: Vec3) {
        self.positions.push(p);
    }
}

/// The 12 vertices of a regular icosahedron (unnormalised).
fn base_vertices() -> [Vec3; 12] {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
}

#[rustfmt::skip]
const BASE_FACES: [[usize; 3]; 20] = [
    [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
    [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
    [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
    [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
];

/// Subdivided icosahedron of the given radius.
///
/// Each base face is split into `(detail + 1)^2` triangles, then every
/// vertex is pushed out onto the sphere. Normals point away from the centre
/// and UVs are a spherical projection with the seam and poles corrected.
pub fn icosahedron(radius: f32, detail: u32) -> TriangleSoup {
    let base = base_vertices();
    let mut soup = TriangleSoup::default();
    for [a, b, c] in BASE_FACES {
        subdivide_face(&mut soup, base[a], base[b], base[c], detail);
    }

    for p in &mut soup.positions {
        *p = p.normalize() * radius;
    }
    soup.normals = soup.positions.iter().map(|p| p.normalize()).collect();
    soup.uvs = generate_uvs(&soup.positions);
    soup
}

fn subdivide_face(soup: &mut TriangleSoup, a: Vec3, b: Vec3, c: Vec3, detail: u32) {
    let cols = detail as usize + 1;

    // Rows of points from edge ab up to apex c.
    let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);
    for i in 0..=cols {
        let t = i as f32 / cols as f32;
        let aj = a.lerp(c, t);
        let bj = b.lerp(c, t);
        let rows = cols - i;
        let row = (0..=rows)
            .map(|j| {
                if j == 0 && i == cols {
                    aj
                } else {
                    aj.lerp(bj, j as f32 / rows as f32)
                }
            })
            .collect();
        grid.push(row);
    }

    for i in 0..cols {
        for j in 0..2 * (cols - i) - 1 {
            let k = j / 2;
            if j % 2 == 0 {
                soup.push(grid[i][k + 1]);
                soup.push(grid[i + 1][k]);
                soup.push(grid[i][k]);
            } else {
                soup.push(grid[i][k + 1]);
                soup.push(grid[i + 1][k + 1]);
                soup.push(grid[i + 1][k]);
            }
        }
    }
}

fn azimuth(v: Vec3) -> f32 {
    v.z.atan2(-v.x)
}

fn inclination(v: Vec3) -> f32 {
    (-v.y).atan2((v.x * v.x + v.z * v.z).sqrt())
}

fn generate_uvs(positions: &[Vec3]) -> Vec<Vec2> {
    let mut uvs: Vec<Vec2> = positions
        .iter()
        .map(|&p| {
            let u = azimuth(p) / 2.0 / PI + 0.5;
            let v = inclination(p) / PI + 0.5;
            Vec2::new(u, 1.0 - v)
        })
        .collect();

    // Pole vertices have no azimuth of their own; borrow the face's.
    for (tri, uv) in positions.chunks_exact(3).zip(uvs.chunks_exact_mut(3)) {
        let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
        let azi = azimuth(centroid);
        for (p, uv) in tri.iter().zip(uv.iter_mut()) {
            if azi < 0.0 && uv.x == 1.0 {
                uv.x -= 1.0;
            }
            if p.x == 0.0 && p.z == 0.0 {
                uv.x = azi / 2.0 / PI + 0.5;
            }
        }
    }

    // Faces straddling the u = 0/1 seam wrap their small u values.
    for uv in uvs.chunks_exact_mut(3) {
        let max = uv[0].x.max(uv[1].x).max(uv[2].x);
        let min = uv[0].x.min(uv[1].x).min(uv[2].x);
        if max > 0.9 && min < 0.1 {
            for corner in uv.iter_mut() {
                if corner.x < 0.2 {
                    corner.x += 1.0;
                }
            }
        }
    }

    uvs
}
