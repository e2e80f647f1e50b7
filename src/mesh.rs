// mesh.rs — panoramic sphere geometry
//
// Triangles are wound so their front faces point at the sphere center: with
// counter-clockwise front faces and back-face culling, only the inside of the
// sphere is drawn, which is where the camera sits.

/// Radius of the projection sphere; must stay below the camera far plane.
pub const SPHERE_RADIUS: f32 = 500.0;
pub const WIDTH_SEGMENTS: usize = 60;
pub const HEIGHT_SEGMENTS: usize = 40;

#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Builds an inward-facing UV sphere for equirectangular textures.
///
/// `u` grows left-to-right as seen from inside, `v = 0` is the top row of the
/// image (zenith), matching wgpu's texture origin.
pub fn build_sphere(radius: f32, lat: usize, lon: usize) -> SphereMesh {
    let mut positions = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut uvs = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut indices = Vec::with_capacity(lat * lon * 6);

    for i in 0..=lat {
        let v = i as f32 / lat as f32;
        let theta = std::f32::consts::PI * v;
        let y = radius * theta.cos();
        let sin_t = theta.sin();

        for j in 0..=lon {
            let u = j as f32 / lon as f32;
            let phi = std::f32::consts::TAU * u;

            positions.push([radius * phi.cos() * sin_t, y, radius * phi.sin() * sin_t]);
            uvs.push([u, v]);
        }
    }

    let stride = (lon + 1) as u32;
    for i in 0..lat as u32 {
        for j in 0..lon as u32 {
            let a = i * stride + j;
            let b = a + stride;

            indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
        }
    }

    SphereMesh {
        positions,
        uvs,
        indices,
    }
}
