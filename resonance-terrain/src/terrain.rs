//! Animated terrain grid.
//!
//! A `(segments + 1)²` vertex lattice on the XZ plane, centered on the origin.
//! Every tick the whole height field is resampled from fBm simplex noise at a drifting
//! offset, then vertex colors and smooth normals are rebuilt. Topology never changes:
//! the index buffer is built once.
//!
//! Buffers are plain `[f32; 3]` / `u32` arrays so a renderer can upload them directly
//! (see the `*_bytes` views).

use glam::Vec3;
use log::{debug, warn};

use crate::fbm::{fbm_with, FbmParams};
use crate::palette::Palette;
use crate::simplex::Simplex2;

/// Tunables for [`TerrainGrid`].
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainParams {
    /// Cells per side.
    pub segments: u32,
    /// World-space edge length.
    pub size: f64,
    /// Peak displacement; heights lie in `[-height_scale, height_scale]`.
    pub height_scale: f64,
    pub seed: u32,
    /// Spatial frequency applied to world coordinates before sampling.
    pub frequency: f64,
    pub fbm: FbmParams,
    /// Noise-space drift per second of frame time.
    pub time_rate: f64,
    /// Drift on z relative to x.
    pub z_drift: f64,
    /// Vertical placement of the mesh in the scene. Vertex positions stay mesh-local;
    /// the renderer applies this through [`TerrainGrid::translation`].
    pub offset_y: f32,
    pub palette: Palette,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            segments: 128,
            size: 40.0,
            height_scale: 2.8,
            seed: 77,
            frequency: 0.08,
            fbm: FbmParams::default(),
            time_rate: 0.02,
            z_drift: 0.6,
            offset_y: -3.0,
            palette: Palette::default(),
        }
    }
}

impl TerrainParams {
    /// Replace unusable values with defaults so the grid is always buildable.
    fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.segments == 0 {
            warn!("terrain: segments must be >= 1, using {}", d.segments);
            self.segments = d.segments;
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            warn!("terrain: size {} is not positive, using {}", self.size, d.size);
            self.size = d.size;
        }
        if !(self.height_scale.is_finite() && self.height_scale > 0.0) {
            warn!("terrain: height_scale {} is not positive, using {}", self.height_scale, d.height_scale);
            self.height_scale = d.height_scale;
        }
        if !self.frequency.is_finite() { self.frequency = d.frequency; }
        if !self.time_rate.is_finite() { self.time_rate = d.time_rate; }
        if !self.z_drift.is_finite() { self.z_drift = d.z_drift; }
        if !self.offset_y.is_finite() {
            warn!("terrain: offset_y {} is not finite, using {}", self.offset_y, d.offset_y);
            self.offset_y = d.offset_y;
        }
        if !(self.fbm.lacunarity.is_finite() && self.fbm.gain.is_finite()) { self.fbm = d.fbm; }
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        let n = self.segments as usize + 1;
        n * n
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        let s = self.segments as usize;
        s * s * 6
    }
}

/// The animated height-field mesh.
pub struct TerrainGrid {
    params: TerrainParams,
    noise: Simplex2,
    time: f64,
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
    revision: u64,
    dirty: bool,
}

impl core::fmt::Debug for TerrainGrid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TerrainGrid")
            .field("segments", &self.params.segments)
            .field("time", &self.time)
            .field("revision", &self.revision)
            .finish()
    }
}

impl Default for TerrainGrid {
    fn default() -> Self { Self::new(TerrainParams::default()) }
}

impl TerrainGrid {
    pub fn new(params: TerrainParams) -> Self {
        let params = params.sanitized();
        let seg = params.segments as usize;
        let row = seg + 1;
        let half = params.size / 2.0;

        let mut positions = Vec::with_capacity(params.vertex_count());
        for iz in 0..=seg {
            for ix in 0..=seg {
                let (x, z) = lattice_xz(ix, iz, seg, params.size, half);
                positions.push([x as f32, 0.0, z as f32]);
            }
        }

        let mut indices = Vec::with_capacity(params.index_count());
        for iz in 0..seg {
            for ix in 0..seg {
                let a = (iz * row + ix) as u32;
                let b = a + 1;
                let c = a + row as u32;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        let count = positions.len();
        let mut grid = Self {
            noise: Simplex2::new(params.seed),
            params,
            time: 0.0,
            positions,
            colors: vec![[0.0; 3]; count],
            normals: vec![[0.0, 1.0, 0.0]; count],
            indices,
            revision: 0,
            dirty: false,
        };
        grid.rebuild();
        debug!(
            "terrain: {} vertices, {} triangles, seed {}",
            grid.vertex_count(),
            grid.triangle_count(),
            grid.params.seed
        );
        grid
    }

    #[inline] pub fn params(&self) -> &TerrainParams { &self.params }
    #[inline] pub fn time(&self) -> f64 { self.time }
    #[inline] pub fn vertex_count(&self) -> usize { self.positions.len() }
    #[inline] pub fn triangle_count(&self) -> usize { self.indices.len() / 3 }

    /// Height at world `(x, z)` for noise time `t`, before the scene offset.
    #[inline]
    pub fn height_at(&self, x: f64, z: f64, t: f64) -> f64 {
        let p = &self.params;
        let n = &self.noise;
        fbm_with(
            |u, v| n.sample(u, v),
            x * p.frequency + t,
            z * p.frequency + t * p.z_drift,
            &p.fbm,
        ) * p.height_scale
    }

    /// Advance by one frame of `delta_s` seconds and regenerate.
    ///
    /// Negative or non-finite deltas do not move time; the frame is still rebuilt.
    pub fn tick(&mut self, delta_s: f64) {
        let d = if delta_s.is_finite() && delta_s >= 0.0 {
            delta_s
        } else {
            warn!("terrain: ignoring frame delta {delta_s}");
            0.0
        };
        self.time += d * self.params.time_rate;
        self.rebuild();
    }

    /// Regenerate the mesh at noise time `t`. Same `t` gives identical buffers.
    pub fn regenerate_at(&mut self, t: f64) {
        if t.is_finite() {
            self.time = t;
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let seg = self.params.segments as usize;
        let row = seg + 1;
        let size = self.params.size;
        let half = size / 2.0;
        let hs = self.params.height_scale;
        let t = self.time;

        for iz in 0..=seg {
            for ix in 0..=seg {
                let i = iz * row + ix;
                let (x, z) = lattice_xz(ix, iz, seg, size, half);
                let h = self.height_at(x, z, t);
                self.positions[i][1] = h as f32;
                let c = self.params.palette.sample((h / hs + 1.0) * 0.5);
                self.colors[i] = c.to_array();
            }
        }

        compute_normals(&self.positions, &self.indices, &mut self.normals);
        self.revision = self.revision.wrapping_add(1);
        self.dirty = true;
    }

    // ---- Buffers ----

    #[inline] pub fn positions(&self) -> &[[f32; 3]] { &self.positions }
    #[inline] pub fn colors(&self) -> &[[f32; 3]] { &self.colors }
    #[inline] pub fn normals(&self) -> &[[f32; 3]] { &self.normals }
    #[inline] pub fn indices(&self) -> &[u32] { &self.indices }

    #[inline] pub fn positions_bytes(&self) -> &[u8] { bytemuck::cast_slice(&self.positions) }
    #[inline] pub fn colors_bytes(&self) -> &[u8] { bytemuck::cast_slice(&self.colors) }
    #[inline] pub fn normals_bytes(&self) -> &[u8] { bytemuck::cast_slice(&self.normals) }
    #[inline] pub fn indices_bytes(&self) -> &[u8] { bytemuck::cast_slice(&self.indices) }

    /// Model translation to place the mesh in the scene.
    #[inline] pub fn translation(&self) -> [f32; 3] { [0.0, self.params.offset_y, 0.0] }

    // ---- Redraw signalling ----

    /// Bumped on every regeneration.
    #[inline] pub fn revision(&self) -> u64 { self.revision }

    /// True if buffers changed since the last [`mark_uploaded`](Self::mark_uploaded).
    #[inline] pub fn needs_redraw(&self) -> bool { self.dirty }

    #[inline] pub fn mark_uploaded(&mut self) { self.dirty = false; }

    /// Lowest and highest vertex height of the current frame.
    pub fn height_range(&self) -> (f32, f32) {
        self.positions.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[1]), hi.max(p[1]))
        })
    }
}

#[inline]
fn lattice_xz(ix: usize, iz: usize, seg: usize, size: f64, half: f64) -> (f64, f64) {
    let s = seg as f64;
    ((ix as f64 / s) * size - half, (iz as f64 / s) * size - half)
}

/// Area-weighted smooth normals. Vertices whose accumulated normal vanishes get +Y.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32], out: &mut [[f32; 3]]) {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let pa = Vec3::from_array(positions[a]);
        let pb = Vec3::from_array(positions[b]);
        let pc = Vec3::from_array(positions[c]);
        let n = (pc - pb).cross(pa - pb);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    for (dst, n) in out.iter_mut().zip(acc) {
        *dst = n.try_normalize().unwrap_or(Vec3::Y).to_array();
    }
}
