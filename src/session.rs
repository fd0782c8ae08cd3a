use std::time::Instant;

use crate::{
    compositor::{self, Scene},
    config::CanvasConfig,
    error::TwibbonResult,
    exporter::{self, DownloadArtifact, SharePayload},
    gesture::{GestureEvent, GestureInterpreter},
    raster::{Raster, Surface},
    transform::ViewTransform,
};

pub const ALERT_DURATION_MS: u64 = 3000;
pub const ALERT_NO_PHOTO: &str = "Silakan unggah gambar terlebih dahulu!";
pub const ALERT_SHARE_UNSUPPORTED: &str = "Perangkat Anda tidak mendukung fitur Bagikan.";

/// Tag for one in-flight upload. Monotonically increasing per slot; a
/// completion whose generation is not the latest is discarded, so the most
/// recently started upload always wins regardless of completion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

/// Host capability probe for the native share sheet. Sampled once at
/// session creation; shells use it to hide the share control at startup.
pub trait SharePlatform {
    fn can_share_files(&self) -> bool;
}

/// Transient notification surface ("alert"), an external collaborator. The
/// session never displays anything itself; it only emits alert effects.
pub trait AlertSink {
    fn show_alert(&mut self, message: &str, duration_ms: u64);
}

/// One entry of the host's serialized event queue.
#[derive(Clone, Debug)]
pub enum Event {
    /// Completion of an async photo upload started via
    /// [`Session::begin_photo_upload`].
    PhotoUploaded {
        generation: Generation,
        bytes: Vec<u8>,
    },
    /// Completion of an async frame upload started via
    /// [`Session::begin_frame_upload`].
    FrameUploaded {
        generation: Generation,
        bytes: Vec<u8>,
    },
    Gesture(GestureEvent),
    DownloadRequested,
    ShareRequested,
}

/// What the shell must do after an event was handled.
#[derive(Clone, Debug)]
pub enum Effect {
    Redraw,
    /// Suppress the platform's default handling of the event being
    /// processed (page scroll / navigation).
    PreventDefault,
    Alert {
        message: String,
        duration_ms: u64,
    },
    SaveFile(DownloadArtifact),
    Share(SharePayload),
}

/// The single-view page session: owns the canvas configuration, the user
/// photo and frame images, the view transform, and the gesture interpreter.
/// Events are handled one at a time; there is no concurrent mutation.
pub struct Session {
    config: CanvasConfig,
    transform: ViewTransform,
    gesture: GestureInterpreter,
    photo: Option<Raster>,
    frame: Option<Raster>,
    photo_generation: u64,
    frame_generation: u64,
    share_supported: bool,
}

impl Session {
    pub fn new(config: CanvasConfig, platform: &dyn SharePlatform) -> TwibbonResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transform: ViewTransform::default(),
            gesture: GestureInterpreter::new(),
            photo: None,
            frame: None,
            photo_generation: 0,
            frame_generation: 0,
            share_supported: platform.can_share_files(),
        })
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn photo_loaded(&self) -> bool {
        self.photo.is_some()
    }

    pub fn frame_loaded(&self) -> bool {
        self.frame.is_some()
    }

    /// Whether the shell should show the share control at all.
    pub fn share_supported(&self) -> bool {
        self.share_supported
    }

    /// Start a photo upload; the returned generation must be echoed back in
    /// [`Event::PhotoUploaded`]. Starting a newer upload invalidates any
    /// still-running older one.
    pub fn begin_photo_upload(&mut self) -> Generation {
        self.photo_generation += 1;
        Generation(self.photo_generation)
    }

    pub fn begin_frame_upload(&mut self) -> Generation {
        self.frame_generation += 1;
        Generation(self.frame_generation)
    }

    /// Handle one event from the serialized queue.
    pub fn handle(&mut self, event: Event, now: Instant) -> TwibbonResult<Vec<Effect>> {
        match event {
            Event::PhotoUploaded { generation, bytes } => {
                if generation.0 != self.photo_generation {
                    tracing::debug!(
                        stale = generation.0,
                        latest = self.photo_generation,
                        "discarding stale photo upload completion"
                    );
                    return Ok(Vec::new());
                }
                let raster = Raster::decode(&bytes)?;
                self.photo = Some(raster);
                self.transform.reset();
                Ok(vec![Effect::Redraw])
            }
            Event::FrameUploaded { generation, bytes } => {
                if generation.0 != self.frame_generation {
                    tracing::debug!(
                        stale = generation.0,
                        latest = self.frame_generation,
                        "discarding stale frame upload completion"
                    );
                    return Ok(Vec::new());
                }
                let raster = Raster::decode(&bytes)?;
                self.frame = Some(raster);
                Ok(vec![Effect::Redraw])
            }
            Event::Gesture(ev) => {
                let outcome =
                    self.gesture
                        .handle(ev, now, self.photo.is_some(), &mut self.transform);
                let mut effects = Vec::new();
                if outcome.suppress_default {
                    effects.push(Effect::PreventDefault);
                }
                if outcome.redraw {
                    effects.push(Effect::Redraw);
                }
                Ok(effects)
            }
            Event::DownloadRequested => {
                if self.photo.is_none() {
                    return Ok(vec![alert(ALERT_NO_PHOTO)]);
                }
                let artifact = exporter::export_download(
                    &self.config,
                    self.photo.as_ref(),
                    self.frame.as_ref(),
                    self.transform,
                )?;
                Ok(vec![Effect::SaveFile(artifact)])
            }
            Event::ShareRequested => {
                if self.photo.is_none() {
                    return Ok(vec![alert(ALERT_NO_PHOTO)]);
                }
                if !self.share_supported {
                    return Ok(vec![alert(ALERT_SHARE_UNSUPPORTED)]);
                }
                let payload = exporter::export_share(
                    &self.config,
                    self.photo.as_ref(),
                    self.frame.as_ref(),
                    self.transform,
                )?;
                Ok(vec![Effect::Share(payload)])
            }
        }
    }

    /// Drive the wheel-settle timer. Yields at most one redraw per
    /// quiescent period after a wheel burst.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        if self.gesture.tick(now).redraw {
            vec![Effect::Redraw]
        } else {
            Vec::new()
        }
    }

    /// Draw the current state for live preview (interaction feedback on).
    pub fn render_preview(&self, surface: &mut Surface) -> TwibbonResult<()> {
        let scene = Scene {
            photo: self.photo.as_ref(),
            frame: self.frame.as_ref(),
            transform: self.transform,
            config: &self.config,
            interacting: self.gesture.is_interacting(),
        };
        compositor::render(surface, &scene, false)
    }
}

fn alert(message: &str) -> Effect {
    Effect::Alert {
        message: message.to_string(),
        duration_ms: ALERT_DURATION_MS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) struct FixedPlatform(pub bool);

    impl SharePlatform for FixedPlatform {
        fn can_share_files(&self) -> bool {
            self.0
        }
    }

    fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba(rgba));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn session() -> Session {
        Session::new(CanvasConfig::default(), &FixedPlatform(true)).unwrap()
    }

    #[test]
    fn photo_upload_resets_transform() {
        let mut s = session();
        s.transform.apply_pan(40.0, 40.0);
        s.transform.apply_zoom(2.0);

        let generation = s.begin_photo_upload();
        let effects = s
            .handle(
                Event::PhotoUploaded {
                    generation,
                    bytes: png_bytes([1, 2, 3, 255]),
                },
                Instant::now(),
            )
            .unwrap();

        assert!(matches!(effects.as_slice(), [Effect::Redraw]));
        assert!(s.photo_loaded());
        assert_eq!(s.transform(), ViewTransform::default());
    }

    #[test]
    fn stale_photo_completion_is_discarded() {
        let mut s = session();
        let old = s.begin_photo_upload();
        let new = s.begin_photo_upload();

        // Newer upload completes first.
        s.handle(
            Event::PhotoUploaded {
                generation: new,
                bytes: png_bytes([0, 255, 0, 255]),
            },
            Instant::now(),
        )
        .unwrap();

        // The stale completion must not overwrite it.
        let effects = s
            .handle(
                Event::PhotoUploaded {
                    generation: old,
                    bytes: png_bytes([255, 0, 0, 255]),
                },
                Instant::now(),
            )
            .unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn generations_are_strictly_increasing() {
        let mut s = session();
        let a = s.begin_photo_upload();
        let b = s.begin_photo_upload();
        let c = s.begin_frame_upload();
        let d = s.begin_frame_upload();
        assert!(a < b);
        assert!(c < d);
    }

    #[test]
    fn download_without_photo_alerts_and_produces_nothing() {
        let mut s = session();
        let effects = s.handle(Event::DownloadRequested, Instant::now()).unwrap();
        match effects.as_slice() {
            [Effect::Alert {
                message,
                duration_ms,
            }] => {
                assert_eq!(message, ALERT_NO_PHOTO);
                assert_eq!(*duration_ms, ALERT_DURATION_MS);
            }
            other => panic!("expected a single alert, got {other:?}"),
        }
    }

    #[test]
    fn share_unsupported_alerts() {
        let mut s = Session::new(CanvasConfig::default(), &FixedPlatform(false)).unwrap();
        assert!(!s.share_supported());

        let generation = s.begin_photo_upload();
        s.handle(
            Event::PhotoUploaded {
                generation,
                bytes: png_bytes([9, 9, 9, 255]),
            },
            Instant::now(),
        )
        .unwrap();

        let effects = s.handle(Event::ShareRequested, Instant::now()).unwrap();
        match effects.as_slice() {
            [Effect::Alert { message, .. }] => assert_eq!(message, ALERT_SHARE_UNSUPPORTED),
            other => panic!("expected a single alert, got {other:?}"),
        }
    }

    #[test]
    fn gesture_event_flows_into_transform() {
        let mut s = session();
        let generation = s.begin_photo_upload();
        s.handle(
            Event::PhotoUploaded {
                generation,
                bytes: png_bytes([1, 1, 1, 255]),
            },
            Instant::now(),
        )
        .unwrap();

        let t0 = Instant::now();
        s.handle(
            Event::Gesture(GestureEvent::PointerDown { x: 0.0, y: 0.0 }),
            t0,
        )
        .unwrap();
        let effects = s
            .handle(
                Event::Gesture(GestureEvent::PointerMove { x: 50.0, y: -20.0 }),
                t0,
            )
            .unwrap();
        assert!(matches!(effects.as_slice(), [Effect::Redraw]));
        assert_eq!(s.transform().offset, kurbo::Vec2::new(50.0, -20.0));
    }

    #[test]
    fn wheel_emits_prevent_default_and_settles_via_tick() {
        let mut s = session();
        let generation = s.begin_photo_upload();
        s.handle(
            Event::PhotoUploaded {
                generation,
                bytes: png_bytes([1, 1, 1, 255]),
            },
            Instant::now(),
        )
        .unwrap();

        let t0 = Instant::now();
        let effects = s
            .handle(Event::Gesture(GestureEvent::Wheel { delta_y: -1.0 }), t0)
            .unwrap();
        assert!(matches!(
            effects.as_slice(),
            [Effect::PreventDefault, Effect::Redraw]
        ));

        assert!(s.tick(t0).is_empty());
        let settled = s.tick(t0 + crate::gesture::WHEEL_SETTLE);
        assert!(matches!(settled.as_slice(), [Effect::Redraw]));
        assert!(s.tick(t0 + crate::gesture::WHEEL_SETTLE * 2).is_empty());
    }
}
