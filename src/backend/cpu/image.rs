use glam::{Vec2, Vec4};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Floating point RGBA image, row-major, origin at the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
}

impl Image {
    /// Black image; each axis is at least one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Vec4::ZERO)
    }

    pub fn filled(width: u32, height: u32, color: Vec4) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Evaluates `f` at every pixel center in uv space.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(Vec2) -> Vec4 + Sync) -> Self {
        let mut image = Self::new(width, height);
        let (w, h) = (image.width as f32, image.height as f32);
        let row_len = image.width as usize;
        let fill_row = |(y, row): (usize, &mut [Vec4])| {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = f(Vec2::new((x as f32 + 0.5) / w, (y as f32 + 0.5) / h));
            }
        };

        #[cfg(feature = "parallel")]
        image
            .pixels
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(fill_row);
        #[cfg(not(feature = "parallel"))]
        image.pixels.chunks_mut(row_len).enumerate().for_each(fill_row);

        image
    }

    /// Single-channel depth image; the value is stored in every channel.
    pub fn depth_from_fn(width: u32, height: u32, f: impl Fn(Vec2) -> f32 + Sync) -> Self {
        Self::from_fn(width, height, |uv| Vec4::splat(f(uv)))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn texel_size(&self) -> Vec2 {
        Vec2::new(1.0 / self.width as f32, 1.0 / self.height as f32)
    }

    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    /// Clamp-to-edge texel fetch.
    pub fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels[y * self.width as usize + x]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Vec4) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    /// Bilinear sample with clamp-to-edge addressing.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let p = uv * Vec2::new(self.width as f32, self.height as f32) - Vec2::splat(0.5);
        let base = p.floor();
        let t = p - base;
        let (x, y) = (base.x as i64, base.y as i64);

        let top = self.texel(x, y).lerp(self.texel(x + 1, y), t.x);
        let bottom = self.texel(x, y + 1).lerp(self.texel(x + 1, y + 1), t.x);
        top.lerp(bottom, t.y)
    }

    pub fn average(&self) -> Vec4 {
        self.pixels.iter().copied().sum::<Vec4>() / self.pixels.len() as f32
    }

    pub fn max_element(&self) -> f32 {
        self.pixels
            .iter()
            .map(|p| p.truncate().max_element())
            .fold(0.0, f32::max)
    }
}
