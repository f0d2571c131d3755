//! Software rasterizer
//!
//! Renders strokes into a grayscale bitmap by stamping a round brush along
//! each line segment. Strokes use a fixed width and a single foreground level
//! against a contrasting background so the raster comes out binary-ish, which
//! is what a digit classifier trained on normalized high-contrast images
//! expects.

use super::surface::StrokeCanvas;
use super::types::Point;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A grayscale bitmap: one byte per pixel, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Create a bitmap filled with `fill`
    pub fn new(width: u32, height: u32, fill: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel bytes, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel value at (x, y); out-of-bounds reads return `None`
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Set a pixel; out-of-bounds writes are ignored
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = value;
        }
    }

    /// Check if the bitmap covers no pixels
    pub fn is_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Mean pixel value (0 for a zero-area bitmap)
    pub fn mean(&self) -> f32 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.pixels.iter().map(|&p| p as u64).sum();
        sum as f32 / self.pixels.len() as f32
    }

    /// Downscale to `new_width` x `new_height` with a box filter.
    ///
    /// Each output pixel averages the input rectangle it covers. Used to
    /// shrink the canvas raster to a model's input dimensions.
    pub fn downscale(&self, new_width: u32, new_height: u32) -> Result<Bitmap> {
        if self.is_zero_area() {
            return Err(Error::Image("cannot downscale a zero-area bitmap".into()));
        }
        if new_width == 0 || new_height == 0 {
            return Err(Error::Image("target dimensions must be non-zero".into()));
        }
        if new_width > self.width || new_height > self.height {
            return Err(Error::Image(format!(
                "downscale target {}x{} exceeds source {}x{}",
                new_width, new_height, self.width, self.height
            )));
        }

        let mut out = Bitmap::new(new_width, new_height, 0);
        for oy in 0..new_height {
            let y0 = (oy as u64 * self.height as u64 / new_height as u64) as u32;
            let y1 = (((oy as u64 + 1) * self.height as u64).div_ceil(new_height as u64)) as u32;
            for ox in 0..new_width {
                let x0 = (ox as u64 * self.width as u64 / new_width as u64) as u32;
                let x1 =
                    (((ox as u64 + 1) * self.width as u64).div_ceil(new_width as u64)) as u32;

                let mut sum: u64 = 0;
                let mut count: u64 = 0;
                for y in y0..y1.max(y0 + 1) {
                    for x in x0..x1.max(x0 + 1) {
                        if let Some(v) = self.get(x, y) {
                            sum += v as u64;
                            count += 1;
                        }
                    }
                }
                let avg = if count > 0 { (sum / count) as u8 } else { 0 };
                out.set(ox, oy, avg);
            }
        }
        Ok(out)
    }

    /// Encode as binary PGM (P5), the diagnostic preview format
    pub fn encode_pgm(&self) -> Vec<u8> {
        let mut data = format!("P5\n{} {}\n255\n", self.width, self.height).into_bytes();
        data.extend_from_slice(&self.pixels);
        data
    }

    /// Decode a binary PGM (P5) image
    pub fn decode_pgm(data: &[u8]) -> Result<Bitmap> {
        let mut pos = 0usize;

        // Header tokens separated by whitespace, '#' starts a comment line
        let mut next_token = |data: &[u8]| -> Result<String> {
            let mut token = String::new();
            while pos < data.len() {
                let b = data[pos];
                if b == b'#' {
                    while pos < data.len() && data[pos] != b'\n' {
                        pos += 1;
                    }
                } else if b.is_ascii_whitespace() {
                    if !token.is_empty() {
                        break;
                    }
                    pos += 1;
                } else {
                    token.push(b as char);
                    pos += 1;
                }
            }
            if token.is_empty() {
                return Err(Error::Image("truncated PGM header".into()));
            }
            Ok(token)
        };

        let magic = next_token(data)?;
        if magic != "P5" {
            return Err(Error::Image(format!("not a binary PGM (magic {magic:?})")));
        }
        let width: u32 = next_token(data)?
            .parse()
            .map_err(|_| Error::Image("invalid PGM width".into()))?;
        let height: u32 = next_token(data)?
            .parse()
            .map_err(|_| Error::Image("invalid PGM height".into()))?;
        let maxval: u32 = next_token(data)?
            .parse()
            .map_err(|_| Error::Image("invalid PGM maxval".into()))?;
        if maxval != 255 {
            return Err(Error::Image(format!("unsupported PGM maxval {maxval}")));
        }

        // Exactly one whitespace byte separates the header from pixel data
        pos += 1;
        let expected = (width as usize) * (height as usize);
        let rest = data.len().saturating_sub(pos);
        if rest < expected {
            return Err(Error::Image(format!(
                "PGM pixel data truncated: expected {expected} bytes, found {rest}"
            )));
        }

        Ok(Bitmap {
            width,
            height,
            pixels: data[pos..pos + expected].to_vec(),
        })
    }
}

/// Renders a canvas's strokes into a [`Bitmap`].
///
/// Stroke width, foreground, and background are fixed per rasterizer so every
/// snapshot of the same canvas is visually identical.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rasterizer {
    /// Brush diameter in pixels
    pub stroke_width: f32,
    /// Stroke pixel level
    pub foreground: u8,
    /// Canvas pixel level
    pub background: u8,
}

impl Default for Rasterizer {
    fn default() -> Self {
        // White 15px strokes on black, matching a dark drawing surface
        Self {
            stroke_width: 15.0,
            foreground: 255,
            background: 0,
        }
    }
}

impl Rasterizer {
    /// Rasterize the canvas's current visual contents.
    ///
    /// Returns `None` when the canvas has zero area; the caller abandons the
    /// snapshot with no observable effect. A blank canvas rasterizes to a
    /// solid-background bitmap, which is still a valid snapshot.
    pub fn rasterize(&self, canvas: &StrokeCanvas) -> Option<Bitmap> {
        if canvas.width() == 0 || canvas.height() == 0 {
            return None;
        }

        let mut bitmap = Bitmap::new(canvas.width(), canvas.height(), self.background);
        let radius = (self.stroke_width / 2.0).max(0.5);

        for stroke in canvas.strokes() {
            let points = stroke.points();
            if points.len() == 1 {
                // A touch without movement still leaves a dot
                self.stamp(&mut bitmap, points[0], radius);
                continue;
            }
            for segment in points.windows(2) {
                self.stamp_segment(&mut bitmap, segment[0], segment[1], radius);
            }
        }

        Some(bitmap)
    }

    /// Stamp the brush at every interpolated position along a segment.
    /// The step is half the brush radius so consecutive stamps overlap.
    fn stamp_segment(&self, bitmap: &mut Bitmap, from: Point, to: Point, radius: f32) {
        let length = from.distance(&to);
        let step = (radius * 0.5).max(0.25);
        let count = (length / step).ceil() as u32;

        self.stamp(bitmap, from, radius);
        for i in 1..=count {
            let t = i as f32 / count as f32;
            let pos = Point::new(
                from.x + (to.x - from.x) * t,
                from.y + (to.y - from.y) * t,
            );
            self.stamp(bitmap, pos, radius);
        }
    }

    /// Fill a disc of `radius` around `center` with the foreground level
    fn stamp(&self, bitmap: &mut Bitmap, center: Point, radius: f32) {
        let r2 = radius * radius;
        let min_x = (center.x - radius).floor().max(0.0) as i64;
        let max_x = (center.x + radius).ceil() as i64;
        let min_y = (center.y - radius).floor().max(0.0) as i64;
        let max_y = (center.y + radius).ceil() as i64;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if x < 0 || y < 0 || x >= bitmap.width() as i64 || y >= bitmap.height() as i64 {
                    continue;
                }
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                if dx * dx + dy * dy <= r2 {
                    bitmap.set(x as u32, y as u32, self.foreground);
                }
            }
        }
    }
}
