use crate::{
    compositor::{self, Scene},
    config::CanvasConfig,
    error::{TwibbonError, TwibbonResult},
    raster::{Raster, Surface, encode_png},
    transform::ViewTransform,
    watermark::draw_watermark,
};

pub const EXPORT_FILE_NAME: &str = "twibbon.png";
pub const EXPORT_MIME: &str = "image/png";
pub const SHARE_TITLE: &str = "Twibbon Saya";
pub const SHARE_TEXT: &str = "Lihat hasil twibbon saya!";
pub const SHARE_URL: &str = "https://twibbon-tools.vercel.app/";

/// A finished PNG destined for a browser-style save-file action.
#[derive(Clone, Debug)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub png: Vec<u8>,
}

/// The same pixels packaged for a platform share sheet.
#[derive(Clone, Debug)]
pub struct SharePayload {
    pub file_name: String,
    pub mime: String,
    pub png: Vec<u8>,
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Render the final composite onto an off-screen surface sized to the
/// visible canvas, with the watermark baked in.
///
/// Fails with [`TwibbonError::NoPhoto`] when no user photo is loaded; this
/// is the single validation gate before any export action.
pub fn export_composite(
    config: &CanvasConfig,
    photo: Option<&Raster>,
    frame: Option<&Raster>,
    transform: ViewTransform,
) -> TwibbonResult<Surface> {
    let photo = photo.ok_or(TwibbonError::NoPhoto)?;

    let mut surface = Surface::new(config.canvas.width, config.canvas.height)?;
    let scene = Scene {
        photo: Some(photo),
        frame,
        transform,
        config,
        // Irrelevant under final mode; exported output never dims the frame.
        interacting: false,
    };
    compositor::render(&mut surface, &scene, true)?;
    draw_watermark(&mut surface)?;
    Ok(surface)
}

pub fn export_download(
    config: &CanvasConfig,
    photo: Option<&Raster>,
    frame: Option<&Raster>,
    transform: ViewTransform,
) -> TwibbonResult<DownloadArtifact> {
    let surface = export_composite(config, photo, frame, transform)?;
    let png = encode_png(&surface)?;
    tracing::info!(bytes = png.len(), "exported download artifact");
    Ok(DownloadArtifact {
        file_name: EXPORT_FILE_NAME.to_string(),
        png,
    })
}

pub fn export_share(
    config: &CanvasConfig,
    photo: Option<&Raster>,
    frame: Option<&Raster>,
    transform: ViewTransform,
) -> TwibbonResult<SharePayload> {
    let surface = export_composite(config, photo, frame, transform)?;
    let png = encode_png(&surface)?;
    tracing::info!(bytes = png.len(), "exported share payload");
    Ok(SharePayload {
        file_name: EXPORT_FILE_NAME.to_string(),
        mime: EXPORT_MIME.to_string(),
        png,
        title: SHARE_TITLE.to_string(),
        text: SHARE_TEXT.to_string(),
        url: SHARE_URL.to_string(),
    })
}
