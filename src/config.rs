use crate::error::{TwibbonError, TwibbonResult};

/// Pixel dimensions of a canvas or draw target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

/// Placement of the frame image on the canvas plus its default source asset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameSlot {
    pub source: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Process-wide, immutable composition geometry: canvas size, the target
/// draw size of the user photo, and the fixed frame placement.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasConfig {
    pub canvas: Extent,
    pub photo: Extent,
    pub frame: FrameSlot,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            canvas: Extent {
                width: 1024,
                height: 1024,
            },
            photo: Extent {
                width: 1024,
                height: 1024,
            },
            frame: FrameSlot {
                source: "twibbon.png".to_string(),
                x: 0.0,
                y: 0.0,
                width: 1024.0,
                height: 1024.0,
            },
        }
    }
}

impl CanvasConfig {
    pub fn validate(&self) -> TwibbonResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(TwibbonError::validation("canvas width/height must be > 0"));
        }
        if self.photo.width == 0 || self.photo.height == 0 {
            return Err(TwibbonError::validation("photo width/height must be > 0"));
        }
        if self.frame.width <= 0.0 || self.frame.height <= 0.0 {
            return Err(TwibbonError::validation("frame width/height must be > 0"));
        }
        if self.frame.x < 0.0
            || self.frame.y < 0.0
            || self.frame.x + self.frame.width > f64::from(self.canvas.width)
            || self.frame.y + self.frame.height > f64::from(self.canvas.height)
        {
            return Err(TwibbonError::validation(
                "frame rectangle must fit within canvas bounds",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = CanvasConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.canvas.width, 1024);
        assert_eq!(cfg.frame.source, "twibbon.png");
    }

    #[test]
    fn json_roundtrip() {
        let cfg = CanvasConfig::default();
        let s = serde_json::to_string_pretty(&cfg).unwrap();
        let de: CanvasConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(de, cfg);
    }

    #[test]
    fn validate_rejects_zero_canvas() {
        let mut cfg = CanvasConfig::default();
        cfg.canvas.width = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_frame_outside_canvas() {
        let mut cfg = CanvasConfig::default();
        cfg.frame.x = 512.0;
        assert!(cfg.validate().is_err());
    }
}
