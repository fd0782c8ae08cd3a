#![forbid(unsafe_code)]

pub mod blur;
pub mod compositor;
pub mod config;
pub mod error;
pub mod exporter;
pub mod gesture;
pub mod raster;
pub mod session;
pub mod transform;
pub mod watermark;

pub use compositor::Scene;
pub use config::{CanvasConfig, Extent, FrameSlot};
pub use error::{TwibbonError, TwibbonResult};
pub use exporter::{DownloadArtifact, SharePayload};
pub use gesture::{GestureEvent, GestureInterpreter, GestureOutcome, TouchPoint};
pub use raster::{Raster, Surface, encode_png};
pub use session::{AlertSink, Effect, Event, Generation, Session, SharePlatform};
pub use transform::{MAX_SCALE, MIN_SCALE, ViewTransform};
