use std::fmt;
use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::brush::Color;
use crate::data_uri;
use crate::geometry::distance_to_segment;
use crate::Point;

pub const PNG_MEDIA_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("raster buffer must be at least 1x1, got {width}x{height}")]
    EmptySize { width: u32, height: u32 },
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Pixel region touched since the last [`RasterBuffer::take_dirty`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    fn union(self, other: DirtyRect) -> DirtyRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        DirtyRect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// The pixel surface behind the drawing canvas.
pub struct RasterBuffer {
    image: RgbaImage,
    background: Color,
    dirty: Option<DirtyRect>,
}

impl RasterBuffer {
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptySize { width, height });
        }
        let image = RgbaImage::from_pixel(width, height, background.to_pixel());
        Ok(Self {
            image,
            background,
            dirty: Some(DirtyRect {
                x: 0,
                y: 0,
                width,
                height,
            }),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image
            .get_pixel_checked(x, y)
            .map(|pixel| Color::rgb(pixel[0], pixel[1], pixel[2]))
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn fill_background(&mut self) {
        let pixel = self.background.to_pixel();
        for target in self.image.pixels_mut() {
            *target = pixel;
        }
        self.mark_dirty(DirtyRect {
            x: 0,
            y: 0,
            width: self.width(),
            height: self.height(),
        });
    }

    pub fn is_filled_with(&self, color: Color) -> bool {
        let pixel = color.to_pixel();
        self.image.pixels().all(|candidate| *candidate == pixel)
    }

    /// Paints a segment with round caps; consecutive segments sharing an
    /// endpoint therefore meet with a round join.
    pub fn draw_segment(&mut self, from: Point, to: Point, color: Color, width: f32) {
        if !(from.x.is_finite() && from.y.is_finite() && to.x.is_finite() && to.y.is_finite()) {
            return;
        }
        let half = (width as f64 / 2.0).max(0.5);
        let (x1, y1) = (from.x as f64, from.y as f64);
        let (x2, y2) = (to.x as f64, to.y as f64);
        let bounds = (
            x1.min(x2) - half,
            y1.min(y2) - half,
            x1.max(x2) + half,
            y1.max(y2) + half,
        );
        self.paint_where(bounds, color, |px, py| {
            distance_to_segment(px, py, x1, y1, x2, y2) <= half
        });
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Color) {
        let radius = radius.max(0.0) as f64;
        let (cx, cy) = (center.x as f64, center.y as f64);
        let bounds = (cx - radius, cy - radius, cx + radius, cy + radius);
        self.paint_where(bounds, color, |px, py| {
            (px - cx).powi(2) + (py - cy).powi(2) <= radius * radius
        });
    }

    fn paint_where(
        &mut self,
        (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
        color: Color,
        inside: impl Fn(f64, f64) -> bool,
    ) {
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return;
        }
        let x0 = min_x.floor().max(0.0) as u32;
        let y0 = min_y.floor().max(0.0) as u32;
        let x1 = max_x.ceil().min(self.width() as f64).max(0.0) as u32;
        let y1 = max_y.ceil().min(self.height() as f64).max(0.0) as u32;
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let pixel = color.to_pixel();
        for y in y0..y1 {
            for x in x0..x1 {
                if inside(x as f64 + 0.5, y as f64 + 0.5) {
                    self.image.put_pixel(x, y, pixel);
                }
            }
        }
        self.mark_dirty(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        });
    }

    fn mark_dirty(&mut self, rect: DirtyRect) {
        self.dirty = Some(match self.dirty {
            Some(existing) => existing.union(rect),
            None => rect,
        });
    }

    pub fn take_dirty(&mut self) -> Option<DirtyRect> {
        self.dirty.take()
    }

    /// Copies the RGBA bytes of `rect`, row by row.
    pub fn region_rgba(&self, rect: DirtyRect) -> Vec<u8> {
        let stride = self.width() as usize * 4;
        let mut out = Vec::with_capacity(rect.width as usize * rect.height as usize * 4);
        let raw = self.image.as_raw();
        for row in rect.y..(rect.y + rect.height).min(self.height()) {
            let start = row as usize * stride + rect.x as usize * 4;
            let end = start + rect.width as usize * 4;
            out.extend_from_slice(&raw[start..end.min((row as usize + 1) * stride)]);
        }
        out
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    pub fn to_data_uri(&self) -> Result<String, RasterError> {
        Ok(data_uri::encode(PNG_MEDIA_TYPE, &self.encode_png()?))
    }
}

impl PartialEq for RasterBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.image == other.image
    }
}

impl fmt::Debug for RasterBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("background", &self.background)
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(0xff, 0, 0);

    fn buffer() -> RasterBuffer {
        RasterBuffer::new(64, 48, Color::WHITE).unwrap()
    }

    #[test]
    fn new_buffer_is_background_and_fully_dirty() {
        let mut raster = buffer();
        assert!(raster.is_filled_with(Color::WHITE));
        assert_eq!(
            raster.take_dirty(),
            Some(DirtyRect {
                x: 0,
                y: 0,
                width: 64,
                height: 48
            })
        );
        assert_eq!(raster.take_dirty(), None);
    }

    #[test]
    fn zero_sized_buffer_is_rejected() {
        assert!(matches!(
            RasterBuffer::new(0, 10, Color::WHITE),
            Err(RasterError::EmptySize { width: 0, height: 10 })
        ));
    }

    #[test]
    fn segment_covers_its_path_and_round_caps() {
        let mut raster = buffer();
        raster.draw_segment(Point::new(10.0, 10.0), Point::new(40.0, 10.0), RED, 8.0);
        for x in 10..40 {
            assert_eq!(raster.pixel(x, 10), Some(RED), "x={x}");
        }
        // Round cap reaches half the width past the endpoint, square corner does not.
        assert_eq!(raster.pixel(7, 10), Some(RED));
        assert_eq!(raster.pixel(6, 6), Some(Color::WHITE));
        assert_eq!(raster.pixel(25, 20), Some(Color::WHITE));
    }

    #[test]
    fn degenerate_segment_paints_a_dot() {
        let mut raster = buffer();
        raster.draw_segment(Point::new(20.0, 20.0), Point::new(20.0, 20.0), RED, 6.0);
        assert_eq!(raster.pixel(20, 20), Some(RED));
        assert_eq!(raster.pixel(20, 30), Some(Color::WHITE));
    }

    #[test]
    fn painting_outside_the_buffer_is_clipped() {
        let mut raster = buffer();
        raster.take_dirty();
        raster.draw_segment(Point::new(-50.0, -50.0), Point::new(-40.0, -40.0), RED, 4.0);
        assert!(raster.is_filled_with(Color::WHITE));
        assert_eq!(raster.take_dirty(), None);

        raster.draw_segment(Point::new(60.0, 40.0), Point::new(100.0, 100.0), RED, 4.0);
        assert_eq!(raster.pixel(63, 44), Some(RED));
        let dirty = raster.take_dirty().unwrap();
        assert!(dirty.x + dirty.width <= 64);
        assert!(dirty.y + dirty.height <= 48);
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let mut raster = buffer();
        raster.draw_segment(Point::new(f32::NAN, 1.0), Point::new(5.0, 5.0), RED, 4.0);
        assert!(raster.is_filled_with(Color::WHITE));
    }

    #[test]
    fn fill_background_resets_every_pixel() {
        let mut raster = buffer();
        raster.draw_segment(Point::new(0.0, 0.0), Point::new(63.0, 47.0), RED, 12.0);
        raster.fill_circle(Point::new(30.0, 30.0), 4.0, Color::BLACK);
        assert!(!raster.is_filled_with(Color::WHITE));
        raster.fill_background();
        assert!(raster.is_filled_with(Color::WHITE));
        assert_eq!(raster, buffer());
    }

    #[test]
    fn dirty_rects_accumulate() {
        let mut raster = buffer();
        raster.take_dirty();
        raster.fill_circle(Point::new(10.0, 10.0), 2.0, RED);
        raster.fill_circle(Point::new(30.0, 20.0), 2.0, RED);
        assert_eq!(
            raster.take_dirty(),
            Some(DirtyRect {
                x: 8,
                y: 8,
                width: 24,
                height: 14
            })
        );
    }

    #[test]
    fn region_rgba_copies_rows() {
        let mut raster = RasterBuffer::new(4, 3, Color::WHITE).unwrap();
        raster.fill_circle(Point::new(2.5, 1.5), 0.5, RED);
        let bytes = raster.region_rgba(DirtyRect {
            x: 1,
            y: 1,
            width: 2,
            height: 2,
        });
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[4..8], &[0xff, 0, 0, 0xff]);
        assert_eq!(&bytes[0..4], &[0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn png_export_decodes_to_the_same_pixels() {
        let mut raster = buffer();
        raster.fill_circle(Point::new(32.0, 24.0), 5.0, RED);
        let bytes = raster.encode_png().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(decoded.as_raw(), raster.as_raw());
    }

    #[test]
    fn data_uri_is_png() {
        let raster = buffer();
        let uri = raster.to_data_uri().unwrap();
        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
