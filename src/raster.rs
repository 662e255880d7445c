use crate::{
    composite::{PremulRgba8, over},
    error::{GlowError, GlowResult},
};

/// Row-major premultiplied RGBA8 pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

pub(crate) fn rgba8_len(width: u32, height: u32) -> GlowResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| GlowError::render("raster buffer size overflow"))
}

impl Raster {
    /// Fully transparent raster.
    pub fn new(width: u32, height: u32) -> GlowResult<Self> {
        Ok(Self {
            width,
            height,
            data: vec![0u8; rgba8_len(width, height)?],
        })
    }

    pub fn filled(width: u32, height: u32, px: PremulRgba8) -> GlowResult<Self> {
        let mut out = Self::new(width, height)?;
        out.fill(px);
        Ok(out)
    }

    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> GlowResult<Self> {
        if data.len() != rgba8_len(width, height)? {
            return Err(GlowError::render(
                "raster data must match width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build from straight (non-premultiplied) RGBA8, as decoded by the `image` crate.
    pub fn from_straight(width: u32, height: u32, mut data: Vec<u8>) -> GlowResult<Self> {
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul(width, height, data)
    }

    /// Straight RGBA8 bytes, as expected by PNG encoders.
    pub fn to_straight(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} raster",
            self.width,
            self.height
        );
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Premultiplied pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn pixel(&self, x: u32, y: u32) -> PremulRgba8 {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: PremulRgba8) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    pub fn fill(&mut self, px: PremulRgba8) {
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    /// Source-over `src` onto `self` with its top-left corner at `(dx, dy)`. Parts of `src`
    /// that fall outside `self` are dropped.
    pub fn draw_over(&mut self, src: &Raster, dx: i64, dy: i64) {
        let x0 = dx.max(0);
        let y0 = dy.max(0);
        let x1 = (dx + i64::from(src.width)).min(i64::from(self.width));
        let y1 = (dy + i64::from(src.height)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for y in y0..y1 {
            let sy = (y - dy) as u32;
            for x in x0..x1 {
                let sx = (x - dx) as u32;
                let s = src.pixel(sx, sy);
                if s[3] == 0 {
                    continue;
                }
                let d = self.pixel(x as u32, y as u32);
                self.set_pixel(x as u32, y as u32, over(d, s));
            }
        }
    }

    /// Copy `src` verbatim into `self` at `(dx, dy)`, replacing whatever was there.
    pub fn blit(&mut self, src: &Raster, dx: u32, dy: u32) {
        let w = src.width.min(self.width.saturating_sub(dx)) as usize;
        if w == 0 {
            return;
        }
        for sy in 0..src.height {
            let y = dy + sy;
            if y >= self.height {
                break;
            }
            let s = src.index(0, sy);
            let d = self.index(dx, y);
            self.data[d..d + w * 4].copy_from_slice(&src.data[s..s + w * 4]);
        }
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_premul_checks_length() {
        assert!(Raster::from_premul(2, 2, vec![0; 15]).is_err());
        assert!(Raster::from_premul(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn straight_roundtrip_keeps_opaque_pixels_exact() {
        let straight = vec![10, 20, 30, 255, 200, 100, 50, 255];
        let r = Raster::from_straight(2, 1, straight.clone()).unwrap();
        assert_eq!(r.data, straight);
        assert_eq!(r.to_straight(), straight);
    }

    #[test]
    fn from_straight_premultiplies_and_clears_transparent() {
        let r = Raster::from_straight(2, 1, vec![200, 100, 50, 128, 9, 9, 9, 0]).unwrap();
        assert_eq!(r.pixel(0, 0), [100, 50, 25, 128]);
        assert_eq!(r.pixel(1, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn draw_over_clips_negative_and_overflowing_offsets() {
        let mut dst = Raster::filled(4, 4, [0, 0, 0, 255]).unwrap();
        let src = Raster::filled(3, 3, [255, 0, 0, 255]).unwrap();

        dst.draw_over(&src, -1, 2);
        assert_eq!(dst.pixel(0, 2), [255, 0, 0, 255]);
        assert_eq!(dst.pixel(1, 3), [255, 0, 0, 255]);
        assert_eq!(dst.pixel(2, 2), [0, 0, 0, 255]);
        assert_eq!(dst.pixel(0, 1), [0, 0, 0, 255]);

        dst.draw_over(&src, 10, 10);
        dst.draw_over(&src, -3, 0);
        assert_eq!(dst.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn blit_replaces_including_transparent() {
        let mut dst = Raster::filled(3, 3, [1, 2, 3, 4]).unwrap();
        let src = Raster::new(2, 2).unwrap();
        dst.blit(&src, 2, 2);
        assert_eq!(dst.pixel(2, 2), [0, 0, 0, 0]);
        assert_eq!(dst.pixel(1, 1), [1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "outside 3x2 raster")]
    fn pixel_out_of_bounds_panics() {
        let r = Raster::new(3, 2).unwrap();
        let _ = r.pixel(3, 0);
    }
}
