use fontdue::{Font, FontSettings};

use crate::{
    compositor::over,
    error::{TwibbonError, TwibbonResult},
    raster::Surface,
};

pub const CAPTION: &str = "Twibbon by Ferry Ayunda";
pub const FONT_SIZE: f32 = 16.0;
pub const PADDING: f64 = 10.0;
pub const MARGIN: f64 = 20.0;

/// Background behind the caption: black at 50% alpha.
const BOX_RGBA: [u8; 4] = [0, 0, 0, 128];

static FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Bake the fixed watermark into an export surface: a semi-transparent dark
/// box anchored [`MARGIN`] px from the bottom-right corner, sized to the
/// caption plus [`PADDING`] on all sides, caption centered in white.
pub fn draw_watermark(surface: &mut Surface) -> TwibbonResult<()> {
    let font = Font::from_bytes(FONT_BYTES, FontSettings::default())
        .map_err(|e| TwibbonError::render(format!("load watermark font: {e}")))?;

    let text_w = f64::from(measure_width(&font, CAPTION));
    let box_w = text_w + PADDING * 2.0;
    let box_h = f64::from(FONT_SIZE) + PADDING * 2.0;
    let box_x = f64::from(surface.width()) - box_w - MARGIN;
    let box_y = f64::from(surface.height()) - box_h - MARGIN;

    fill_rect(surface, box_x, box_y, box_w, box_h, BOX_RGBA);

    // Center the caption in the box; the baseline sits below the box center
    // by half the (ascent + descent) extent.
    let line = font
        .horizontal_line_metrics(FONT_SIZE)
        .ok_or_else(|| TwibbonError::render("watermark font has no horizontal metrics"))?;
    let pen_x = box_x + (box_w - text_w) / 2.0;
    let baseline_y = box_y + box_h / 2.0 + f64::from(line.ascent + line.descent) / 2.0;

    draw_text(surface, &font, CAPTION, pen_x, baseline_y);
    Ok(())
}

fn measure_width(font: &Font, text: &str) -> f32 {
    text.chars()
        .map(|c| font.metrics(c, FONT_SIZE).advance_width)
        .sum()
}

fn fill_rect(surface: &mut Surface, x: f64, y: f64, w: f64, h: f64, rgba_premul: [u8; 4]) {
    let x0 = x.floor().max(0.0) as u32;
    let y0 = y.floor().max(0.0) as u32;
    let x1 = ((x + w).ceil().max(0.0) as u32).min(surface.width());
    let y1 = ((y + h).ceil().max(0.0) as u32).min(surface.height());
    for py in y0..y1 {
        for px in x0..x1 {
            let dst = surface.pixel(px, py);
            surface.put_pixel(px, py, over(dst, rgba_premul, 1.0));
        }
    }
}

fn draw_text(surface: &mut Surface, font: &Font, text: &str, start_x: f64, baseline_y: f64) {
    let mut pen_x = start_x;
    for c in text.chars() {
        let (metrics, coverage) = font.rasterize(c, FONT_SIZE);
        if metrics.width > 0 && metrics.height > 0 {
            // ymin is the bitmap's bottom edge relative to the baseline
            // (positive up), so the top row sits at baseline - height - ymin.
            let left = pen_x + f64::from(metrics.xmin);
            let top = baseline_y - f64::from(metrics.height as i32 + metrics.ymin);
            blit_coverage(
                surface,
                &coverage,
                metrics.width as u32,
                metrics.height as u32,
                left,
                top,
            );
        }
        pen_x += f64::from(metrics.advance_width);
    }
}

/// Blend a glyph coverage bitmap as white text onto the surface.
fn blit_coverage(surface: &mut Surface, coverage: &[u8], w: u32, h: u32, left: f64, top: f64) {
    let base_x = left.round() as i64;
    let base_y = top.round() as i64;
    for gy in 0..h {
        for gx in 0..w {
            let cov = coverage[(gy as usize) * (w as usize) + (gx as usize)];
            if cov == 0 {
                continue;
            }
            let px = base_x + i64::from(gx);
            let py = base_y + i64::from(gy);
            if px < 0 || py < 0 || px >= i64::from(surface.width()) || py >= i64::from(surface.height())
            {
                continue;
            }
            let (px, py) = (px as u32, py as u32);
            // White with coverage alpha; premultiplied this is (cov,)*4.
            let src = [cov, cov, cov, cov];
            let dst = surface.pixel(px, py);
            surface.put_pixel(px, py, over(dst, src, 1.0));
        }
    }
}
