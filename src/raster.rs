use std::io::Cursor;

use anyhow::Context;

use crate::error::{TwibbonError, TwibbonResult};

/// A decoded raster image, premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Raster {
    /// Decode an uploaded image file (PNG, JPEG, ...) into premultiplied RGBA8.
    pub fn decode(bytes: &[u8]) -> TwibbonResult<Raster> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut data = rgba.into_raw();
        premultiply_rgba8_in_place(&mut data);

        Ok(Raster {
            width,
            height,
            data,
        })
    }

    /// Wrap an already premultiplied buffer. Intended for tests and for
    /// callers that synthesize pixels directly.
    pub fn from_premul_parts(width: u32, height: u32, data: Vec<u8>) -> TwibbonResult<Raster> {
        if data.len() != buffer_len(width, height)? {
            return Err(TwibbonError::render(
                "raster byte length must be width*height*4",
            ));
        }
        Ok(Raster {
            width,
            height,
            data,
        })
    }

    /// A single-color raster from a straight-alpha RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> TwibbonResult<Raster> {
        let px = premul_px(rgba);
        let len = buffer_len(width, height)?;
        let mut data = vec![0u8; len];
        for chunk in data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
        Ok(Raster {
            width,
            height,
            data,
        })
    }
}

/// An explicit render target, premultiplied RGBA8. The same type backs the
/// live preview and the off-screen export surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> TwibbonResult<Surface> {
        let len = buffer_len(width, height)?;
        Ok(Surface {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Clear the full surface to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }
}

/// Encode a surface as a PNG file body. The surface stores premultiplied
/// pixels; PNG wants straight alpha, so colors are un-premultiplied first.
pub fn encode_png(surface: &Surface) -> TwibbonResult<Vec<u8>> {
    let mut straight = surface.data().to_vec();
    unpremultiply_rgba8_in_place(&mut straight);

    let mut buf = Vec::new();
    image::write_buffer_with_format(
        &mut Cursor::new(&mut buf),
        &straight,
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .context("encode png")?;
    Ok(buf)
}

fn buffer_len(width: u32, height: u32) -> TwibbonResult<usize> {
    if width == 0 || height == 0 {
        return Err(TwibbonError::render("raster width/height must be > 0"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| TwibbonError::render("raster buffer size overflow"))
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let out = premul_px([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in px.iter_mut().take(3) {
            let v = (u16::from(*c) * 255 + a / 2) / a;
            *c = v.min(255) as u8;
        }
    }
}

fn premul_px(rgba: [u8; 4]) -> [u8; 4] {
    let a = rgba[3] as u16;
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let premul = |c: u8| -> u8 { ((u16::from(c) * a + 127) / 255) as u8 };
    [premul(rgba[0]), premul(rgba[1]), premul(rgba[2]), rgba[3]]
}
