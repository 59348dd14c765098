use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::brush::{BrushConfig, BrushWidth, Color};
use crate::gateway::GatewayError;
use crate::geometry::{normalize_point, SurfaceLayout, Viewport};
use crate::notice::Notice;
use crate::particles::sparkle_burst;
use crate::raster::{DirtyRect, RasterBuffer, RasterError};
use crate::ticket::{AnalysisRequest, RequestSlot, Ticket};
use crate::Point;

pub const BACKGROUND: Color = Color::WHITE;
pub const EXPORT_FILE_NAME: &str = "my-drawing.png";

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("drawing surface is not mounted")]
    Unmounted,
    #[error("the drawing is already being analyzed")]
    AnalysisPending,
    #[error(transparent)]
    Raster(#[from] RasterError),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StrokeState {
    Idle,
    Stroking { last: Point },
}

pub struct PngExport {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

/// The freehand canvas: raster, brush, and the two orthogonal state machines
/// (stroke idle/stroking, analysis ready/analyzing).
pub struct DrawingSurface {
    raster: Option<RasterBuffer>,
    viewport: Option<Viewport>,
    brush: BrushConfig,
    stroke: StrokeState,
    analysis: RequestSlot,
    rng: StdRng,
}

impl Default for DrawingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingSurface {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            raster: None,
            viewport: None,
            brush: BrushConfig::default(),
            stroke: StrokeState::Idle,
            analysis: RequestSlot::default(),
            rng,
        }
    }

    /// (Re)creates a blank raster for `layout`. Prior content is discarded.
    pub fn resize(&mut self, layout: SurfaceLayout) -> Result<(), SurfaceError> {
        let raster = RasterBuffer::new(layout.buffer_width, layout.buffer_height, BACKGROUND)?;
        let mut viewport = Viewport::new(layout);
        if let Some(previous) = &self.viewport {
            viewport.set_offset(previous.offset_x, previous.offset_y);
        }
        log::debug!(
            "surface resized to {}x{} (display {}x{})",
            layout.buffer_width,
            layout.buffer_height,
            layout.display_width,
            layout.display_height
        );
        self.raster = Some(raster);
        self.viewport = Some(viewport);
        self.stroke = StrokeState::Idle;
        Ok(())
    }

    /// Drops the raster and brush settings and forgets any analysis still in
    /// flight.
    pub fn unmount(&mut self) {
        self.raster = None;
        self.viewport = None;
        self.brush = BrushConfig::default();
        self.stroke = StrokeState::Idle;
        self.analysis.invalidate();
    }

    pub fn is_mounted(&self) -> bool {
        self.raster.is_some()
    }

    pub fn raster(&self) -> Option<&RasterBuffer> {
        self.raster.as_ref()
    }

    pub fn take_dirty(&mut self) -> Option<DirtyRect> {
        self.raster.as_mut().and_then(RasterBuffer::take_dirty)
    }

    pub fn brush(&self) -> &BrushConfig {
        &self.brush
    }

    pub fn set_color(&mut self, color: Color) {
        self.brush.color = color;
    }

    pub fn set_width(&mut self, width: BrushWidth) {
        self.brush.width = width;
    }

    pub fn stroke_state(&self) -> StrokeState {
        self.stroke
    }

    pub fn is_analyzing(&self) -> bool {
        self.analysis.is_pending()
    }

    /// Tracks the element's top-left corner in client space.
    pub fn set_offset(&mut self, left: f64, top: f64) {
        if let Some(viewport) = &mut self.viewport {
            viewport.set_offset(left, top);
        }
    }

    /// Buffer pixels per display pixel. Brush sizes are given in display
    /// pixels.
    fn display_scale(&self) -> f32 {
        self.viewport
            .and_then(|viewport| viewport.scale())
            .map_or(1.0, |(sx, _)| sx as f32)
    }

    fn to_buffer(&self, client_x: f64, client_y: f64) -> Option<Point> {
        self.viewport?.to_buffer(client_x, client_y)
    }

    /// Non-finite input on a mounted surface is ignored.
    pub fn pointer_down(&mut self, client_x: f64, client_y: f64) -> Result<(), SurfaceError> {
        if self.viewport.is_none() || self.raster.is_none() {
            return Err(SurfaceError::Unmounted);
        }
        match self.to_buffer(client_x, client_y) {
            Some(point) => self.begin_stroke(point),
            None => Ok(()),
        }
    }

    pub fn pointer_move(&mut self, client_x: f64, client_y: f64) {
        if let Some(point) = self.to_buffer(client_x, client_y) {
            self.extend_stroke(point);
        }
    }

    pub fn begin_stroke(&mut self, point: Point) -> Result<(), SurfaceError> {
        let Some(point) = normalize_point(point) else {
            return Ok(());
        };
        let scale = self.display_scale();
        let Some(raster) = self.raster.as_mut() else {
            return Err(SurfaceError::Unmounted);
        };
        if self.brush.particle_mode {
            scatter(raster, &mut self.rng, point, &self.brush, scale);
        }
        self.stroke = StrokeState::Stroking { last: point };
        Ok(())
    }

    pub fn extend_stroke(&mut self, point: Point) {
        let StrokeState::Stroking { last } = self.stroke else {
            return;
        };
        let Some(point) = normalize_point(point) else {
            return;
        };
        let scale = self.display_scale();
        let Some(raster) = self.raster.as_mut() else {
            return;
        };
        if self.brush.particle_mode {
            scatter(raster, &mut self.rng, point, &self.brush, scale);
        } else {
            let width = self.brush.width.px() as f32 * scale;
            raster.draw_segment(last, point, self.brush.color, width);
        }
        self.stroke = StrokeState::Stroking { last: point };
    }

    pub fn end_stroke(&mut self) {
        self.stroke = StrokeState::Idle;
    }

    pub fn clear(&mut self) -> Result<Notice, SurfaceError> {
        let raster = self.raster.as_mut().ok_or(SurfaceError::Unmounted)?;
        raster.fill_background();
        self.stroke = StrokeState::Idle;
        log::info!("canvas cleared");
        Ok(Notice::info("🎨", "Canvas cleared! Start a new drawing!"))
    }

    pub fn toggle_particle_mode(&mut self) -> Notice {
        self.brush.particle_mode = !self.brush.particle_mode;
        if self.brush.particle_mode {
            Notice::info("✨", "Magic wand activated! ✨ Draw sparkles!")
        } else {
            Notice::info("🖌️", "Back to regular drawing mode")
        }
    }

    pub fn export_png(&self) -> Result<(PngExport, Notice), SurfaceError> {
        let raster = self.raster.as_ref().ok_or(SurfaceError::Unmounted)?;
        let bytes = raster.encode_png()?;
        log::info!("exported drawing ({} bytes)", bytes.len());
        Ok((
            PngExport {
                file_name: EXPORT_FILE_NAME,
                bytes,
            },
            Notice::success("💾", "Your drawing has been saved! 🎉"),
        ))
    }

    pub fn request_analysis(&mut self) -> Result<AnalysisRequest, SurfaceError> {
        let raster = self.raster.as_ref().ok_or(SurfaceError::Unmounted)?;
        if self.analysis.is_pending() {
            return Err(SurfaceError::AnalysisPending);
        }
        let data_uri = raster.to_data_uri()?;
        let ticket = self
            .analysis
            .begin()
            .ok_or(SurfaceError::AnalysisPending)?;
        Ok(AnalysisRequest { ticket, data_uri })
    }

    /// Applies a gateway result. `None` means the ticket went stale and the
    /// result was dropped.
    pub fn finish_analysis(
        &mut self,
        ticket: Ticket,
        result: Result<String, GatewayError>,
    ) -> Option<Notice> {
        if !self.analysis.finish(ticket) {
            log::debug!("dropping stale drawing analysis");
            return None;
        }
        Some(match result {
            Ok(text) => Notice::reply(text),
            Err(error) => {
                log::warn!("drawing analysis failed: {error}");
                Notice::analysis_failed()
            }
        })
    }
}

/// One sparkle burst, with spread and dot size both in buffer pixels.
fn scatter(
    raster: &mut RasterBuffer,
    rng: &mut StdRng,
    point: Point,
    brush: &BrushConfig,
    scale: f32,
) {
    let width = brush.width.px() as f32 * scale;
    for particle in sparkle_burst(rng, point, width) {
        raster.fill_circle(particle.center, particle.radius * scale, particle.color);
    }
}
