use std::path::Path;

use anyhow::Context;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,

    /// Opacity.
    pub a: f32,
}

/// A buffer of color data, with the bottom-left being `(0,0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    buffer: Vec<Color>,
}

/// Characters for the ascii preview, from darkest to lightest.
const ASCII_RAMP: &[u8] = b"@%#*+=-:. ";

impl Color {
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1. }
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    /// Build an opaque color from a `0xRRGGBB` value.
    pub fn hex(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    pub fn black() -> Self {
        Self::new(0., 0., 0.)
    }

    pub fn white() -> Self {
        Self::new(1., 1., 1.)
    }

    pub fn to_u8(&self) -> [u8; 4] {
        let convert = |x: f32| (x * 255.0).round().clamp(0.0, 255.0) as u8;
        [
            convert(self.r),
            convert(self.g),
            convert(self.b),
            convert(self.a),
        ]
    }

    /// Perceptual brightness.
    pub fn to_grayscale(&self) -> f32 {
        0.3 * self.r + 0.59 * self.g + 0.11 * self.b
    }
}

impl Canvas {
    /// A transparent black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![Color::default(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (self.width as usize) * (y as usize) + (x as usize)
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> &mut Color {
        let ix = self.index(x, y);
        &mut self.buffer[ix]
    }

    pub fn get(&self, x: u32, y: u32) -> &Color {
        &self.buffer[self.index(x, y)]
    }

    /// Iterate the `(x, y)` coordinates of every pixel, in storage order.
    pub fn coords(&self) -> impl Iterator<Item = (u32, u32)> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }

    /// Mutable access to every pixel, in the same order as [`Canvas::coords`].
    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut Color> {
        self.buffer.iter_mut()
    }

    /// Copy `chunk` into this canvas with its bottom-left corner at `(x, y)`. Anything falling
    /// outside of the canvas is dropped.
    pub fn blit(&mut self, x: u32, y: u32, chunk: &Canvas) {
        for (cx, cy) in chunk.coords() {
            let (tx, ty) = (x + cx, y + cy);
            if tx < self.width && ty < self.height {
                *self.get_mut(tx, ty) = *chunk.get(cx, cy);
            }
        }
    }

    /// The rows of the image from the top down, which is the order image files expect.
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.buffer.chunks_exact(self.width.max(1) as usize).rev()
    }

    /// Raw RGBA8 data for the image, top row first.
    pub fn data(&self) -> Vec<u8> {
        self.rows().flatten().flat_map(Color::to_u8).collect()
    }

    /// Write the canvas out as an image, with the format picked from the extension of `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        image::save_buffer(
            path,
            &self.data(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )
        .with_context(|| format!("failed to write `{}`", path.display()))
    }

    /// Render the canvas as text, one character per pixel.
    pub fn to_ascii(&self) -> String {
        let bound = (ASCII_RAMP.len() - 1) as f32;
        let mut buf = String::with_capacity((self.width as usize + 1) * self.height as usize);

        for row in self.rows() {
            buf.extend(row.iter().map(|color| {
                let g = color.to_grayscale().clamp(0., 1.);
                ASCII_RAMP[(g * bound).round() as usize] as char
            }));
            buf.push('\n');
        }

        buf
    }
}
