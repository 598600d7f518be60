//! C ABI for the Resonance soundscape engine and the animated terrain field.
//!
//! ABI notes
//! - All functions are `extern "C"` and `#[no_mangle]`.
//! - Opaque handles: `ResonanceEngine` and `ResonanceTerrain` (heap-allocated; destroy
//!   them with the matching `*_destroy`).
//! - Status codes: `>= 0` success, `-1` invalid handle / argument / closed engine.
//! - Buffer getters return borrowed pointers that stay valid until the next
//!   `resonance_terrain_tick` or `resonance_terrain_destroy`.
//!
//! Threading
//! - Handles are NOT thread-safe; drive each one from a single thread. An engine either
//!   pulls frames through `resonance_engine_render_interleaved_f32` or plays through
//!   `resonance_engine_open_output`, not both.

use std::ffi::{c_char, CString};
use std::ptr;

use log::warn;
use resonance_engine::{AudioEngine, EngineConfig};
use resonance_terrain::prelude::{TerrainGrid, TerrainParams};

/// Opaque engine handle.
pub struct ResonanceEngine {
    inner: AudioEngine,
    labels: Vec<CString>,
    colors: Vec<CString>,
}

/// Opaque terrain handle.
pub struct ResonanceTerrain {
    grid: TerrainGrid,
}

#[inline]
fn engine_mut<'a>(e: *mut ResonanceEngine) -> Option<&'a mut ResonanceEngine> {
    // SAFETY: callers pass either null or a pointer from `resonance_engine_create`.
    unsafe { e.as_mut() }
}

#[inline]
fn terrain_mut<'a>(t: *mut ResonanceTerrain) -> Option<&'a mut ResonanceTerrain> {
    // SAFETY: callers pass either null or a pointer from `resonance_terrain_create`.
    unsafe { t.as_mut() }
}

fn to_cstrings<'a>(items: impl Iterator<Item = &'a str>) -> Vec<CString> {
    items.map(|s| CString::new(s).unwrap_or_default()).collect()
}

// --- Engine: creation / destruction -----------------------------------------------

/// Create a running engine with every layer off.
/// Returns null if the configuration is rejected.
#[no_mangle]
pub extern "C" fn resonance_engine_create(sample_rate: f32, seed: u64) -> *mut ResonanceEngine {
    let config = EngineConfig { sample_rate, seed, ..EngineConfig::default() };
    let mut inner = match AudioEngine::new(config) {
        Ok(e) => e,
        Err(e) => {
            warn!("ffi: engine create failed: {e}");
            return ptr::null_mut();
        }
    };
    if let Err(e) = inner.resume() {
        warn!("ffi: engine resume failed: {e}");
        return ptr::null_mut();
    }
    let snaps = inner.snapshots();
    let labels = to_cstrings(snaps.iter().map(|s| s.label));
    let colors = to_cstrings(snaps.iter().map(|s| s.color));
    Box::into_raw(Box::new(ResonanceEngine { inner, labels, colors }))
}

/// Free an engine. An engine still open is stopped at once without waiting for the
/// fade; call `resonance_engine_dispose` first to let it ring out.
#[no_mangle]
pub extern "C" fn resonance_engine_destroy(engine: *mut ResonanceEngine) {
    if !engine.is_null() {
        // SAFETY: pointer came from `Box::into_raw` in `resonance_engine_create`.
        unsafe { drop(Box::from_raw(engine)); }
    }
}

/// Fade out, stop, and free every voice. Safe to call more than once.
///
/// With a live output and audible layers this blocks for the configured grace period.
#[no_mangle]
pub extern "C" fn resonance_engine_dispose(engine: *mut ResonanceEngine) -> i32 {
    match engine_mut(engine) {
        Some(e) => { e.inner.dispose(); 0 }
        None => -1,
    }
}

/// Open the default output device and start playing.
#[cfg(feature = "realtime")]
#[no_mangle]
pub extern "C" fn resonance_engine_open_output(engine: *mut ResonanceEngine) -> i32 {
    let Some(e) = engine_mut(engine) else { return -1 };
    match e.inner.open_output(&resonance_engine::OutputOptions::default()) {
        Ok(_) => 0,
        Err(err) => { warn!("ffi: open output failed: {err}"); -1 }
    }
}

// --- Engine: layer control --------------------------------------------------------

#[no_mangle]
pub extern "C" fn resonance_engine_layer_count(engine: *mut ResonanceEngine) -> i32 {
    engine_mut(engine).map_or(-1, |e| e.inner.layer_count() as i32)
}

/// Flip a layer. Returns the new active flag (0/1), or -1.
#[no_mangle]
pub extern "C" fn resonance_engine_toggle_layer(engine: *mut ResonanceEngine, index: u32) -> i32 {
    let Some(e) = engine_mut(engine) else { return -1 };
    match e.inner.toggle_layer(index as usize) {
        Ok(active) => i32::from(active),
        Err(err) => { warn!("ffi: toggle rejected: {err}"); -1 }
    }
}

/// 1 if the layer is active, 0 if not, -1 for a bad index.
#[no_mangle]
pub extern "C" fn resonance_engine_layer_active(engine: *mut ResonanceEngine, index: u32) -> i32 {
    let Some(e) = engine_mut(engine) else { return -1 };
    e.inner.layer_states().get(index as usize).map_or(-1, |&a| i32::from(a))
}

/// Current smoothed layer volume (0 for a bad index).
#[no_mangle]
pub extern "C" fn resonance_engine_layer_level(engine: *mut ResonanceEngine, index: u32) -> f32 {
    let Some(e) = engine_mut(engine) else { return 0.0 };
    e.inner.snapshots().get(index as usize).map_or(0.0, |s| s.level)
}

/// NUL-terminated layer label owned by the engine, or null.
#[no_mangle]
pub extern "C" fn resonance_engine_layer_label(engine: *mut ResonanceEngine, index: u32) -> *const c_char {
    engine_mut(engine)
        .and_then(|e| e.labels.get(index as usize))
        .map_or(ptr::null(), |s| s.as_ptr())
}

/// NUL-terminated `#rrggbb` layer color owned by the engine, or null.
#[no_mangle]
pub extern "C" fn resonance_engine_layer_color(engine: *mut ResonanceEngine, index: u32) -> *const c_char {
    engine_mut(engine)
        .and_then(|e| e.colors.get(index as usize))
        .map_or(ptr::null(), |s| s.as_ptr())
}

#[no_mangle]
pub extern "C" fn resonance_engine_set_master_gain(engine: *mut ResonanceEngine, gain: f32) -> i32 {
    let Some(e) = engine_mut(engine) else { return -1 };
    match e.inner.set_master_gain(gain) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

// --- Engine: rendering ------------------------------------------------------------

/// Render `frames` interleaved frames with `channels` channels (1 = mono mid, 2 = L/R,
/// more = L/R then mid). Returns frames written, 0 on error.
#[no_mangle]
pub extern "C" fn resonance_engine_render_interleaved_f32(
    engine: *mut ResonanceEngine,
    out_interleaved: *mut f32,
    frames: u32,
    channels: u32,
) -> u32 {
    if out_interleaved.is_null() || frames == 0 || channels == 0 { return 0; }
    let Some(e) = engine_mut(engine) else { return 0 };
    let len = frames as usize * channels as usize;
    // SAFETY: the caller provides `frames * channels` writable floats.
    let out = unsafe { std::slice::from_raw_parts_mut(out_interleaved, len) };
    match e.inner.render_interleaved(out, channels as usize) {
        Ok(()) => frames,
        Err(_) => 0,
    }
}

// --- Terrain ----------------------------------------------------------------------

/// Create the default 128 x 128 grid with `seed`.
#[no_mangle]
pub extern "C" fn resonance_terrain_create(seed: u32) -> *mut ResonanceTerrain {
    let grid = TerrainGrid::new(TerrainParams { seed, ..TerrainParams::default() });
    Box::into_raw(Box::new(ResonanceTerrain { grid }))
}

/// Create a grid with explicit segment count and side length.
#[no_mangle]
pub extern "C" fn resonance_terrain_create_with(seed: u32, segments: u32, size: f64) -> *mut ResonanceTerrain {
    let params = TerrainParams { seed, segments, size, ..TerrainParams::default() };
    Box::into_raw(Box::new(ResonanceTerrain { grid: TerrainGrid::new(params) }))
}

#[no_mangle]
pub extern "C" fn resonance_terrain_destroy(terrain: *mut ResonanceTerrain) {
    if !terrain.is_null() {
        // SAFETY: pointer came from `Box::into_raw` in a `resonance_terrain_create*`.
        unsafe { drop(Box::from_raw(terrain)); }
    }
}

/// Advance the animation by `delta_s` seconds and rebuild the mesh.
#[no_mangle]
pub extern "C" fn resonance_terrain_tick(terrain: *mut ResonanceTerrain, delta_s: f64) -> i32 {
    match terrain_mut(terrain) {
        Some(t) => { t.grid.tick(delta_s); 0 }
        None => -1,
    }
}

#[no_mangle]
pub extern "C" fn resonance_terrain_vertex_count(terrain: *mut ResonanceTerrain) -> u32 {
    terrain_mut(terrain).map_or(0, |t| t.grid.vertex_count() as u32)
}

#[no_mangle]
pub extern "C" fn resonance_terrain_index_count(terrain: *mut ResonanceTerrain) -> u32 {
    terrain_mut(terrain).map_or(0, |t| t.grid.indices().len() as u32)
}

/// `vertex_count * 3` floats (x, y, z).
#[no_mangle]
pub extern "C" fn resonance_terrain_positions(terrain: *mut ResonanceTerrain) -> *const f32 {
    terrain_mut(terrain).map_or(ptr::null(), |t| t.grid.positions().as_ptr().cast())
}

/// `vertex_count * 3` floats (linear r, g, b).
#[no_mangle]
pub extern "C" fn resonance_terrain_colors(terrain: *mut ResonanceTerrain) -> *const f32 {
    terrain_mut(terrain).map_or(ptr::null(), |t| t.grid.colors().as_ptr().cast())
}

/// `vertex_count * 3` floats (unit normals).
#[no_mangle]
pub extern "C" fn resonance_terrain_normals(terrain: *mut ResonanceTerrain) -> *const f32 {
    terrain_mut(terrain).map_or(ptr::null(), |t| t.grid.normals().as_ptr().cast())
}

/// `index_count` triangle-list indices.
#[no_mangle]
pub extern "C" fn resonance_terrain_indices(terrain: *mut ResonanceTerrain) -> *const u32 {
    terrain_mut(terrain).map_or(ptr::null(), |t| t.grid.indices().as_ptr())
}

/// Write the mesh's model translation (x, y, z) into `out` (3 floats).
#[no_mangle]
pub extern "C" fn resonance_terrain_translation(terrain: *mut ResonanceTerrain, out: *mut f32) -> i32 {
    if out.is_null() { return -1; }
    let Some(t) = terrain_mut(terrain) else { return -1 };
    // SAFETY: the caller provides 3 writable floats.
    let dst = unsafe { std::slice::from_raw_parts_mut(out, 3) };
    dst.copy_from_slice(&t.grid.translation());
    0
}

/// 1 if the buffers changed since the last `resonance_terrain_mark_uploaded`.
#[no_mangle]
pub extern "C" fn resonance_terrain_needs_redraw(terrain: *mut ResonanceTerrain) -> i32 {
    terrain_mut(terrain).map_or(-1, |t| i32::from(t.grid.needs_redraw()))
}

#[no_mangle]
pub extern "C" fn resonance_terrain_mark_uploaded(terrain: *mut ResonanceTerrain) -> i32 {
    match terrain_mut(terrain) {
        Some(t) => { t.grid.mark_uploaded(); 0 }
        None => -1,
    }
}

/// Library version as a static NUL-terminated string.
#[no_mangle]
pub extern "C" fn resonance_version() -> *const c_char {
    const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr().cast()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn engine_round_trip_through_the_c_surface() {
        let e = resonance_engine_create(8_000.0, 77);
        assert!(!e.is_null());
        assert_eq!(resonance_engine_layer_count(e), 5);
        assert_eq!(resonance_engine_toggle_layer(e, 2), 1);
        assert_eq!(resonance_engine_layer_active(e, 2), 1);
        assert_eq!(resonance_engine_toggle_layer(e, 7), -1);

        let label = unsafe { CStr::from_ptr(resonance_engine_layer_label(e, 2)) };
        assert_eq!(label.to_str().unwrap(), "Pulse Sequence");

        let mut buf = vec![0.0f32; 256 * 2];
        assert_eq!(resonance_engine_render_interleaved_f32(e, buf.as_mut_ptr(), 256, 2), 256);

        assert_eq!(resonance_engine_dispose(e), 0);
        assert_eq!(resonance_engine_dispose(e), 0);
        assert_eq!(resonance_engine_render_interleaved_f32(e, buf.as_mut_ptr(), 256, 2), 0);
        resonance_engine_destroy(e);
    }

    #[test]
    fn bad_sample_rate_yields_null() {
        assert!(resonance_engine_create(f32::NAN, 1).is_null());
    }

    #[test]
    fn null_handles_are_rejected() {
        assert_eq!(resonance_engine_toggle_layer(ptr::null_mut(), 0), -1);
        assert_eq!(resonance_terrain_tick(ptr::null_mut(), 0.016), -1);
        assert!(resonance_terrain_positions(ptr::null_mut()).is_null());
        resonance_engine_destroy(ptr::null_mut());
        resonance_terrain_destroy(ptr::null_mut());
    }

    #[test]
    fn terrain_buffers_match_counts() {
        let t = resonance_terrain_create_with(77, 8, 40.0);
        assert_eq!(resonance_terrain_vertex_count(t), 81);
        assert_eq!(resonance_terrain_index_count(t), 8 * 8 * 6);
        assert_eq!(resonance_terrain_tick(t, 1.0 / 60.0), 0);
        assert_eq!(resonance_terrain_needs_redraw(t), 1);
        assert_eq!(resonance_terrain_mark_uploaded(t), 0);
        assert_eq!(resonance_terrain_needs_redraw(t), 0);
        let idx = unsafe { std::slice::from_raw_parts(resonance_terrain_indices(t), 384) };
        assert!(idx.iter().all(|&i| i < 81));
        let mut offset = [1.0f32; 3];
        assert_eq!(resonance_terrain_translation(t, offset.as_mut_ptr()), 0);
        assert_eq!(offset, [0.0, -3.0, 0.0]);
        assert_eq!(resonance_terrain_translation(t, ptr::null_mut()), -1);
        resonance_terrain_destroy(t);
    }
}
