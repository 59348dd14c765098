use wasm_bindgen::{Clamped, JsValue};
use web_sys::{CanvasRenderingContext2d, ImageData};

use kidsboard_shared::raster::DirtyRect;
use kidsboard_shared::DrawingSurface;

/// Copies the pixels changed since the last present onto the canvas.
pub fn present(ctx: &CanvasRenderingContext2d, surface: &mut DrawingSurface) {
    let Some(rect) = surface.take_dirty() else {
        return;
    };
    let Some(raster) = surface.raster() else {
        return;
    };
    let pixels = raster.region_rgba(rect);
    if let Err(err) = put_region(ctx, rect, &pixels) {
        log::warn!("canvas blit failed: {err:?}");
    }
}

fn put_region(
    ctx: &CanvasRenderingContext2d,
    rect: DirtyRect,
    pixels: &[u8],
) -> Result<(), JsValue> {
    let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(pixels), rect.width, rect.height)?;
    ctx.put_image_data(&image, rect.x as f64, rect.y as f64)
}

pub fn clear_canvas(ctx: &CanvasRenderingContext2d, width: u32, height: u32) {
    ctx.clear_rect(0.0, 0.0, width as f64, height as f64);
}
