use crate::{
    error::{GlowError, GlowResult},
    raster::Raster,
};

/// Kernel half-width used for a given sigma: three standard deviations, rounded up.
pub fn kernel_radius(sigma: f32) -> u32 {
    if sigma <= 0.0 {
        return 0;
    }
    (3.0 * sigma).ceil() as u32
}

/// Separable Gaussian blur over premultiplied RGBA8. `sigma == 0` returns a copy of `src`.
/// Samples beyond the edges clamp to the nearest edge pixel.
pub fn gaussian_blur(src: &Raster, sigma: f32) -> GlowResult<Raster> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(GlowError::config("blur sigma must be finite and >= 0"));
    }
    let radius = kernel_radius(sigma);
    if radius == 0 || src.width == 0 || src.height == 0 {
        return Ok(src.clone());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = Raster::new(src.width, src.height)?;
    let mut out = Raster::new(src.width, src.height)?;

    convolve(src, &mut tmp, &kernel, Axis::X);
    convolve(&tmp, &mut out, &kernel, Axis::Y);
    Ok(out)
}

/// Normalized kernel in Q16 fixed point; the taps always sum to exactly `1 << 16`.
fn gaussian_kernel_q16(radius: u32, sigma: f32) -> GlowResult<Vec<u32>> {
    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(GlowError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn convolve(src: &Raster, dst: &mut Raster, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(src.width);
    let h = i64::from(src.height);

    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                if kw == 0 {
                    continue;
                }
                let d = ki as i64 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + d).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (a, &s) in acc.iter_mut().zip(&src.data[idx..idx + 4]) {
                    *a += u64::from(kw) * u64::from(s);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for (d, a) in dst.data[out_idx..out_idx + 4].iter_mut().zip(acc) {
                *d = q16_to_u8(a);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}
