use kurbo::{Affine, Point};

use crate::{
    blur::blur_rgba8_premul,
    config::CanvasConfig,
    error::{TwibbonError, TwibbonResult},
    raster::{Raster, Surface},
    transform::ViewTransform,
};

/// Frame presentation while a gesture is in progress: the frame is "lifted"
/// so the photo underneath stays visible.
pub const FRAME_LIFT_OPACITY: f32 = 0.5;
pub const FRAME_LIFT_BLUR_RADIUS: u32 = 2;
pub const FRAME_LIFT_BLUR_SIGMA: f32 = 1.0;

/// Everything the compositor reads. Output is a pure function of these
/// fields plus `final_mode`; no ambient state is consulted.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub photo: Option<&'a Raster>,
    pub frame: Option<&'a Raster>,
    pub transform: ViewTransform,
    pub config: &'a CanvasConfig,
    pub interacting: bool,
}

/// Render the scene onto `surface`.
///
/// `final_mode` disables the interaction feedback (dim + blur) so exported
/// output never shows the lifted frame.
pub fn render(surface: &mut Surface, scene: &Scene<'_>, final_mode: bool) -> TwibbonResult<()> {
    surface.clear();

    if let Some(photo) = scene.photo {
        draw_raster(
            surface,
            photo,
            scene.transform.to_affine(),
            f64::from(scene.config.photo.width),
            f64::from(scene.config.photo.height),
            1.0,
        )?;
    }

    if let Some(frame) = scene.frame {
        let slot = &scene.config.frame;
        let placement = Affine::translate((slot.x, slot.y));

        if !final_mode && scene.interacting {
            let mut lifted = Surface::new(surface.width(), surface.height())?;
            draw_raster(&mut lifted, frame, placement, slot.width, slot.height, 1.0)?;
            let blurred = blur_rgba8_premul(
                lifted.data(),
                lifted.width(),
                lifted.height(),
                FRAME_LIFT_BLUR_RADIUS,
                FRAME_LIFT_BLUR_SIGMA,
            )?;
            over_in_place(surface.data_mut(), &blurred, FRAME_LIFT_OPACITY)?;
        } else {
            draw_raster(surface, frame, placement, slot.width, slot.height, 1.0)?;
        }
    }

    Ok(())
}

/// Draw `raster` scaled to `target_w` x `target_h` local units, placed by
/// `transform`, source-over onto the surface. Inverse-mapped bilinear
/// sampling; pixels mapping outside the raster are left untouched.
pub fn draw_raster(
    surface: &mut Surface,
    raster: &Raster,
    transform: Affine,
    target_w: f64,
    target_h: f64,
    opacity: f32,
) -> TwibbonResult<()> {
    if raster.width == 0 || raster.height == 0 || target_w <= 0.0 || target_h <= 0.0 {
        return Ok(());
    }
    if transform.determinant().abs() < 1e-12 {
        return Err(TwibbonError::render("draw transform is not invertible"));
    }
    let inverse = transform.inverse();

    let (x0, y0, x1, y1) = device_bounds(surface, transform, target_w, target_h);
    let sx = f64::from(raster.width) / target_w;
    let sy = f64::from(raster.height) / target_h;

    for y in y0..y1 {
        for x in x0..x1 {
            let local = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if local.x < 0.0 || local.y < 0.0 || local.x >= target_w || local.y >= target_h {
                continue;
            }
            let src = sample_bilinear(raster, local.x * sx, local.y * sy);
            let dst = surface.pixel(x, y);
            surface.put_pixel(x, y, over(dst, src, opacity));
        }
    }
    Ok(())
}

/// Premultiplied source-over with an extra opacity factor.
pub fn over(dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    out[3] = mul_div255(u16::from(src[3]), op).saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Whole-buffer source-over, used to composite a prepared layer (e.g. the
/// blurred frame) back onto the main surface.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> TwibbonResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(TwibbonError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn device_bounds(
    surface: &Surface,
    transform: Affine,
    target_w: f64,
    target_h: f64,
) -> (u32, u32, u32, u32) {
    let corners = [
        transform * Point::new(0.0, 0.0),
        transform * Point::new(target_w, 0.0),
        transform * Point::new(0.0, target_h),
        transform * Point::new(target_w, target_h),
    ];
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in corners {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let clamp_u32 = |v: f64, hi: u32| -> u32 { v.clamp(0.0, f64::from(hi)) as u32 };
    (
        clamp_u32(min_x.floor(), surface.width()),
        clamp_u32(min_y.floor(), surface.height()),
        clamp_u32(max_x.ceil(), surface.width()),
        clamp_u32(max_y.ceil(), surface.height()),
    )
}

fn sample_bilinear(raster: &Raster, u: f64, v: f64) -> [u8; 4] {
    let w = raster.width as i64;
    let h = raster.height as i64;

    let fx = u - 0.5;
    let fy = v - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;

    let clamp_x = |x: i64| -> u32 { x.clamp(0, w - 1) as u32 };
    let clamp_y = |y: i64| -> u32 { y.clamp(0, h - 1) as u32 };
    let x0i = x0 as i64;
    let y0i = y0 as i64;

    let p00 = raster_pixel(raster, clamp_x(x0i), clamp_y(y0i));
    let p10 = raster_pixel(raster, clamp_x(x0i + 1), clamp_y(y0i));
    let p01 = raster_pixel(raster, clamp_x(x0i), clamp_y(y0i + 1));
    let p11 = raster_pixel(raster, clamp_x(x0i + 1), clamp_y(y0i + 1));

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = lerp(f64::from(p00[c]), f64::from(p10[c]), tx);
        let bottom = lerp(f64::from(p01[c]), f64::from(p11[c]), tx);
        out[c] = lerp(top, bottom, ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}

fn raster_pixel(raster: &Raster, x: u32, y: u32) -> [u8; 4] {
    let i = ((y as usize) * (raster.width as usize) + (x as usize)) * 4;
    [
        raster.data[i],
        raster.data[i + 1],
        raster.data[i + 2],
        raster.data[i + 3],
    ]
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::ViewTransform;
    use kurbo::Vec2;

    fn config_16() -> CanvasConfig {
        CanvasConfig {
            canvas: crate::config::Extent {
                width: 16,
                height: 16,
            },
            photo: crate::config::Extent {
                width: 16,
                height: 16,
            },
            frame: crate::config::FrameSlot {
                source: "twibbon.png".to_string(),
                x: 0.0,
                y: 0.0,
                width: 16.0,
                height: 16.0,
            },
        }
    }

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        let src = [200, 200, 200, 200];
        assert_eq!(over(dst, src, 0.0), dst);
    }

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        let src = [255, 255, 255, 0];
        assert_eq!(over(dst, src, 1.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn over_dst_transparent_returns_scaled_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn photo_is_drawn_under_frame() {
        let cfg = config_16();
        let photo = Raster::solid(16, 16, [255, 0, 0, 255]).unwrap();
        // Frame covers the left half, transparent on the right.
        let mut frame_data = vec![0u8; 16 * 16 * 4];
        for y in 0..16usize {
            for x in 0..8usize {
                let i = (y * 16 + x) * 4;
                frame_data[i..i + 4].copy_from_slice(&[0, 0, 255, 255]);
            }
        }
        let frame = Raster::from_premul_parts(16, 16, frame_data).unwrap();

        let scene = Scene {
            photo: Some(&photo),
            frame: Some(&frame),
            transform: ViewTransform::default(),
            config: &cfg,
            interacting: false,
        };
        let mut surface = Surface::new(16, 16).unwrap();
        render(&mut surface, &scene, false).unwrap();

        assert_eq!(surface.pixel(2, 8), [0, 0, 255, 255]);
        assert_eq!(surface.pixel(12, 8), [255, 0, 0, 255]);
    }

    #[test]
    fn pan_moves_the_photo() {
        let cfg = config_16();
        let photo = Raster::solid(16, 16, [0, 255, 0, 255]).unwrap();
        let mut transform = ViewTransform::default();
        transform.apply_pan(8.0, 0.0);

        let scene = Scene {
            photo: Some(&photo),
            frame: None,
            transform,
            config: &cfg,
            interacting: false,
        };
        let mut surface = Surface::new(16, 16).unwrap();
        render(&mut surface, &scene, false).unwrap();

        assert_eq!(surface.pixel(2, 8), [0, 0, 0, 0]);
        assert_eq!(surface.pixel(12, 8), [0, 255, 0, 255]);
    }

    #[test]
    fn interacting_preview_dims_the_frame() {
        let cfg = config_16();
        let frame = Raster::solid(16, 16, [0, 0, 255, 255]).unwrap();
        let scene = Scene {
            photo: None,
            frame: Some(&frame),
            transform: ViewTransform::default(),
            config: &cfg,
            interacting: true,
        };

        let mut preview = Surface::new(16, 16).unwrap();
        render(&mut preview, &scene, false).unwrap();
        let lifted = preview.pixel(8, 8);
        assert!(lifted[3] < 255);

        let mut exported = Surface::new(16, 16).unwrap();
        render(&mut exported, &scene, true).unwrap();
        assert_eq!(exported.pixel(8, 8), [0, 0, 255, 255]);
    }

    #[test]
    fn empty_raster_draws_nothing() {
        let cfg = config_16();
        // Constructed directly; the public constructors reject zero dims.
        let empty = Raster {
            width: 0,
            height: 0,
            data: Vec::new(),
        };
        let scene = Scene {
            photo: Some(&empty),
            frame: Some(&empty),
            transform: ViewTransform::default(),
            config: &cfg,
            interacting: false,
        };
        let mut surface = Surface::new(16, 16).unwrap();
        render(&mut surface, &scene, false).unwrap();
        assert!(surface.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn render_is_deterministic() {
        let cfg = config_16();
        let photo = Raster::solid(16, 16, [12, 34, 56, 200]).unwrap();
        let frame = Raster::solid(16, 16, [200, 100, 0, 128]).unwrap();
        let scene = Scene {
            photo: Some(&photo),
            frame: Some(&frame),
            transform: ViewTransform {
                scale: 1.3,
                offset: Vec2::new(-2.0, 3.5),
            },
            config: &cfg,
            interacting: true,
        };

        let mut a = Surface::new(16, 16).unwrap();
        let mut b = Surface::new(16, 16).unwrap();
        render(&mut a, &scene, false).unwrap();
        render(&mut b, &scene, false).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn zoom_scales_around_origin() {
        let cfg = config_16();
        // 2x2 photo scaled to 16x16 target; zooming 2x leaves only the
        // top-left quadrant of the target visible in 0..16.
        let photo = Raster::solid(2, 2, [255, 255, 255, 255]).unwrap();
        let mut transform = ViewTransform::default();
        transform.apply_zoom(2.0);

        let scene = Scene {
            photo: Some(&photo),
            frame: None,
            transform,
            config: &cfg,
            interacting: false,
        };
        let mut surface = Surface::new(16, 16).unwrap();
        render(&mut surface, &scene, false).unwrap();
        assert_eq!(surface.pixel(15, 15), [255, 255, 255, 255]);
    }
}
