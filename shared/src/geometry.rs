use crate::Point;

pub const MAX_DISPLAY_WIDTH: f64 = 600.0;
pub const DISPLAY_HEIGHT: f64 = 400.0;
const NARROW_VIEWPORT: f64 = 768.0;
const NARROW_MARGIN: f64 = 40.0;

pub fn normalize_point(point: Point) -> Option<Point> {
    if !point.x.is_finite() || !point.y.is_finite() {
        return None;
    }
    Some(point)
}

pub fn distance_to_segment(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
        return ((px - x1).powi(2) + (py - y1).powi(2)).sqrt();
    }
    let t = ((px - x1) * dx + (py - y1) * dy) / (dx * dx + dy * dy);
    let t = t.clamp(0.0, 1.0);
    let proj_x = x1 + t * dx;
    let proj_y = y1 + t * dy;
    ((px - proj_x).powi(2) + (py - proj_y).powi(2)).sqrt()
}

/// On-screen size of the drawing surface and the pixel resolution backing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceLayout {
    pub display_width: f64,
    pub display_height: f64,
    pub buffer_width: u32,
    pub buffer_height: u32,
}

impl SurfaceLayout {
    /// Layout for a browser viewport `viewport_width` CSS pixels wide.
    pub fn for_viewport(viewport_width: f64, device_pixel_ratio: f64) -> Self {
        let available = if viewport_width > NARROW_VIEWPORT {
            MAX_DISPLAY_WIDTH
        } else {
            viewport_width - NARROW_MARGIN
        };
        let display_width = available.min(MAX_DISPLAY_WIDTH).max(1.0);
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            display_width,
            display_height: DISPLAY_HEIGHT,
            buffer_width: (display_width * dpr).round().max(1.0) as u32,
            buffer_height: (DISPLAY_HEIGHT * dpr).round().max(1.0) as u32,
        }
    }
}

/// Maps client (display space) coordinates onto the raster buffer.
///
/// The scale factors are fixed by the layout and change only on resize; the
/// offset follows the element around the page and is refreshed per event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub layout: SurfaceLayout,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Viewport {
    pub fn new(layout: SurfaceLayout) -> Self {
        Self {
            layout,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn set_offset(&mut self, left: f64, top: f64) {
        self.offset_x = left;
        self.offset_y = top;
    }

    pub fn scale(&self) -> Option<(f64, f64)> {
        let layout = &self.layout;
        if layout.display_width <= 0.0 || layout.display_height <= 0.0 {
            return None;
        }
        Some((
            layout.buffer_width as f64 / layout.display_width,
            layout.buffer_height as f64 / layout.display_height,
        ))
    }

    pub fn to_buffer(&self, client_x: f64, client_y: f64) -> Option<Point> {
        let (sx, sy) = self.scale()?;
        let x = (client_x - self.offset_x) * sx;
        let y = (client_y - self.offset_y) * sy;
        normalize_point(Point {
            x: x as f32,
            y: y as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_viewport_caps_display_width() {
        let layout = SurfaceLayout::for_viewport(1920.0, 1.0);
        assert_eq!(layout.display_width, 600.0);
        assert_eq!(layout.display_height, 400.0);
        assert_eq!((layout.buffer_width, layout.buffer_height), (600, 400));
    }

    #[test]
    fn narrow_viewport_leaves_margin() {
        let layout = SurfaceLayout::for_viewport(400.0, 1.0);
        assert_eq!(layout.display_width, 360.0);
    }

    #[test]
    fn buffer_scales_with_pixel_ratio() {
        let layout = SurfaceLayout::for_viewport(1024.0, 2.0);
        assert_eq!((layout.buffer_width, layout.buffer_height), (1200, 800));
        let layout = SurfaceLayout::for_viewport(1024.0, f64::NAN);
        assert_eq!((layout.buffer_width, layout.buffer_height), (600, 400));
    }

    #[test]
    fn client_points_map_through_offset_and_scale() {
        let mut viewport = Viewport::new(SurfaceLayout::for_viewport(1024.0, 2.0));
        viewport.set_offset(100.0, 50.0);
        assert_eq!(viewport.to_buffer(110.0, 60.0), Some(Point::new(20.0, 20.0)));
        assert_eq!(viewport.to_buffer(100.0, 50.0), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn degenerate_display_rejects_input() {
        let viewport = Viewport::new(SurfaceLayout {
            display_width: 0.0,
            display_height: 400.0,
            buffer_width: 1,
            buffer_height: 400,
        });
        assert_eq!(viewport.to_buffer(10.0, 10.0), None);
    }

    #[test]
    fn non_finite_input_is_dropped() {
        let viewport = Viewport::new(SurfaceLayout::for_viewport(1024.0, 1.0));
        assert_eq!(viewport.to_buffer(f64::NAN, 1.0), None);
        assert_eq!(viewport.to_buffer(1.0, f64::INFINITY), None);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        assert_eq!(distance_to_segment(5.0, 3.0, 0.0, 0.0, 10.0, 0.0), 3.0);
        assert_eq!(distance_to_segment(-3.0, 4.0, 0.0, 0.0, 10.0, 0.0), 5.0);
        assert_eq!(distance_to_segment(3.0, 4.0, 0.0, 0.0, 0.0, 0.0), 5.0);
    }
}
