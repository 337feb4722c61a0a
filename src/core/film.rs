use std::path::Path;

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::core::common::{clamp, gamma_correct, CompensatedSum, Float};
use crate::core::spectrum::xyz_to_rgb;

/// Full-resolution XYZ accumulator shared by all workers. Eye-side
/// samples arrive through disjoint tiles, so the lock only orders
/// independent writes; light-tracing splats cover arbitrary pixels and
/// are merged per worker after each round.
pub struct Film {
    width: usize,
    height: usize,
    pixels: Mutex<Vec<[CompensatedSum; 3]>>,
}

impl Film {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: Mutex::new(vec![[CompensatedSum::default(); 3]; width * height]),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn merge_tile(&self, tile: &FilmTile) {
        let mut pixels = self.pixels.lock();

        for ty in 0..tile.height {
            for tx in 0..tile.width {
                let src = tile.pixels[ty * tile.width + tx];
                let dst = &mut pixels[(tile.y0 + ty) * self.width + (tile.x0 + tx)];
                for c in 0..3 {
                    dst[c].add(src[c]);
                }
            }
        }
    }

    pub fn merge_splats(&self, buf: &SplatBuffer) {
        let mut pixels = self.pixels.lock();

        for (dst, src) in pixels.iter_mut().zip(buf.pixels.iter()) {
            for c in 0..3 {
                dst[c].add(src[c]);
            }
        }
    }

    /// Scaled XYZ of one pixel; `scale` is typically `1 / samples`.
    pub fn pixel_xyz(&self, x: usize, y: usize, scale: Float) -> [Float; 3] {
        let pixels = self.pixels.lock();
        let p = &pixels[y * self.width + x];
        [
            p[0].value() * scale,
            p[1].value() * scale,
            p[2].value() * scale,
        ]
    }

    /// Converts the accumulated image to 8-bit sRGB; `scale` folds the
    /// sample count and any brightness adjustment together.
    pub fn develop(&self, scale: Float) -> image::RgbImage {
        let pixels = self.pixels.lock();
        let mut img = image::RgbImage::new(self.width as u32, self.height as u32);

        for y in 0..self.height {
            for x in 0..self.width {
                let p = &pixels[y * self.width + x];
                let xyz = [
                    p[0].value() * scale,
                    p[1].value() * scale,
                    p[2].value() * scale,
                ];
                let rgb = xyz_to_rgb(xyz);
                let mut out = [0u8; 3];
                for c in 0..3 {
                    let v = gamma_correct(clamp(rgb[c], 0.0, 1.0));
                    out[c] = clamp(v * 255.0 + 0.5, 0.0, 255.0) as u8;
                }
                img.put_pixel(x as u32, y as u32, image::Rgb(out));
            }
        }

        img
    }

    pub fn write_image(&self, scale: Float, path: &Path) -> Result<()> {
        self.develop(scale)
            .save(path)
            .with_context(|| format!("failed to write image {}", path.display()))
    }
}

/// Worker-private eye-image tile; coordinates are absolute pixel
/// positions within the film.
pub struct FilmTile {
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
    pixels: Vec<[Float; 3]>,
}

impl FilmTile {
    pub fn new(x0: usize, y0: usize, width: usize, height: usize) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
            pixels: vec![[0.0; 3]; width * height],
        }
    }

    pub fn x0(&self) -> usize {
        self.x0
    }

    pub fn y0(&self) -> usize {
        self.y0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn add_sample(&mut self, x: usize, y: usize, xyz: [Float; 3]) {
        let p = &mut self.pixels[(y - self.y0) * self.width + (x - self.x0)];
        for c in 0..3 {
            p[c] += xyz[c];
        }
    }
}

/// Worker-private full-resolution buffer for light-tracing splats.
/// Each worker owns one; buffers are merged in worker order once a
/// round completes so accumulation stays deterministic.
pub struct SplatBuffer {
    width: usize,
    pixels: Vec<[Float; 3]>,
}

impl SplatBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            pixels: vec![[0.0; 3]; width * height],
        }
    }

    pub fn add_splat(&mut self, x: usize, y: usize, xyz: [Float; 3]) {
        let p = &mut self.pixels[y * self.width + x];
        for c in 0..3 {
            p[c] += xyz[c];
        }
    }

    pub fn clear(&mut self) {
        for p in self.pixels.iter_mut() {
            *p = [0.0; 3];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_and_splat_accumulate_into_film() {
        let film = Film::new(4, 4);

        let mut tile = FilmTile::new(0, 0, 2, 2);
        tile.add_sample(1, 1, [1.0, 2.0, 3.0]);
        film.merge_tile(&tile);

        let mut buf = SplatBuffer::new(4, 4);
        buf.add_splat(1, 1, [0.5, 0.5, 0.5]);
        film.merge_splats(&buf);

        let xyz = film.pixel_xyz(1, 1, 1.0);
        assert_eq!(xyz, [1.5, 2.5, 3.5]);
    }

    #[test]
    fn develop_scales_by_sample_count() {
        let film = Film::new(1, 1);
        let mut tile = FilmTile::new(0, 0, 1, 1);
        // Two samples of equal luminance average back to Y = 1.
        tile.add_sample(0, 0, [0.9505, 1.0, 1.089]);
        tile.add_sample(0, 0, [0.9505, 1.0, 1.089]);
        film.merge_tile(&tile);

        let xyz = film.pixel_xyz(0, 0, 0.5);
        assert!((xyz[1] - 1.0).abs() < 1.0e-6);
    }
}
