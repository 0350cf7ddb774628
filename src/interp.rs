// src/interp.rs
//
// Linear interpolation over monotonic grids. Shared by the lookup tables
// (accel limits, braking distance) and the trajectory resampling between
// the model grid and the solver grid.
//
// Queries outside the grid clamp to the nearest endpoint value. Non-finite
// queries never reach the segment search: +inf and -inf clamp like any
// other out-of-range value, NaN falls back to the first table value.

use ::interp::{interp as interp_segment, interp_slice, InterpMode};

/// Interpolate `fp` (sampled at increasing `xp`) at `x`.
///
/// Returns 0.0 for an empty grid. Uses the shorter of the two slices when
/// lengths disagree.
pub fn interp(x: f32, xp: &[f32], fp: &[f32]) -> f32 {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return 0.0;
    }
    let (xp, fp) = (&xp[..n], &fp[..n]);

    if x.is_nan() || n == 1 || x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    interp_segment(xp, fp, x, &InterpMode::FirstLast)
}

/// Resample `fp` from grid `xp` onto every point of `x`.
pub fn interp_many(x: &[f32], xp: &[f32], fp: &[f32]) -> Vec<f32> {
    let n = xp.len().min(fp.len());
    if n < 2 || !x.iter().all(|v| v.is_finite()) {
        return x.iter().map(|&xi| interp(xi, xp, fp)).collect();
    }
    interp_slice(&xp[..n], &fp[..n], x, &InterpMode::FirstLast)
}

/// `num` evenly spaced samples from `start` to `end`, inclusive.
pub fn linspace(start: f32, end: f32, num: usize) -> Vec<f32> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num - 1) as f32;
            (0..num).map(|i| start + step * i as f32).collect()
        }
    }
}

/// Forward difference quotient `(f[i+1] - f[i]) / (t[i+1] - t[i])`.
/// Result is one element shorter than the input.
pub fn finite_difference(t: &[f32], f: &[f32]) -> Vec<f32> {
    let n = t.len().min(f.len());
    (1..n)
        .map(|i| {
            let dt = t[i] - t[i - 1];
            if dt > 0.0 {
                (f[i] - f[i - 1]) / dt
            } else {
                0.0
            }
        })
        .collect()
}

pub fn clip(x: f32, lo: f32, hi: f32) -> f32 {
    x.max(lo).min(hi)
}
