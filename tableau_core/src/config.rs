// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Startup configuration.
//!
//! Both structs derive `serde` so hosts can load them from JSON or any other
//! format. Missing fields take their defaults; scale modes and orientations
//! are spelled by name (`"CONTAIN"`, `"PORTRAIT"`) and an unknown name fails
//! deserialization.

use crate::error::GuardPolicy;
use crate::geometry::Size;
use crate::stage::{ScaleMode, StageOrientation};

/// Initial stage settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Logical width.
    pub width: f64,
    /// Logical height.
    pub height: f64,
    /// Scale policy.
    pub scale_mode: ScaleMode,
    /// Orientation the content is authored for.
    pub orientation: StageOrientation,
    /// Whether a conflicting device orientation is compensated.
    pub orientation_lock: bool,
    /// Device pixels per CSS pixel.
    pub device_pixel_ratio: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 640.0,
            scale_mode: ScaleMode::Normal,
            orientation: StageOrientation::Universal,
            orientation_lock: true,
            device_pixel_ratio: 1.0,
        }
    }
}

impl StageConfig {
    /// Logical size.
    #[must_use]
    pub fn logical_size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Engine-wide settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial stage settings.
    pub stage: StageConfig,
    /// Panic on misuse instead of logging and carrying on.
    pub strict_guards: bool,
    /// Upper bound on the frame delta reported by the clock, in milliseconds.
    pub max_frame_delta_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stage: StageConfig::default(),
            strict_guards: false,
            max_frame_delta_ms: 100.0,
        }
    }
}

impl EngineConfig {
    /// The guard policy implied by [`strict_guards`](Self::strict_guards).
    #[must_use]
    pub fn guard_policy(&self) -> GuardPolicy {
        if self.strict_guards {
            GuardPolicy::Panic
        } else {
            GuardPolicy::Report
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn empty_json_is_the_default() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.stage.logical_size(), Size::new(960.0, 640.0));
        assert_eq!(config.guard_policy(), GuardPolicy::Report);
    }

    #[test]
    fn modes_are_spelled_by_name() {
        let config: EngineConfig = serde_json::from_str(
            r#"{
                "stage": { "width": 400, "height": 300, "scale_mode": "FIXED_WIDTH",
                           "orientation": "PORTRAIT" },
                "strict_guards": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.stage.scale_mode, ScaleMode::FixedWidth);
        assert_eq!(config.stage.orientation, StageOrientation::Portrait);
        assert!(config.stage.orientation_lock);
        assert_eq!(config.guard_policy(), GuardPolicy::Panic);

        let json = serde_json::to_string(&config.stage).unwrap();
        assert!(json.contains(r#""scale_mode":"FIXED_WIDTH""#), "{json}");
    }

    #[test]
    fn unknown_scale_mode_is_rejected() {
        let err = serde_json::from_str::<StageConfig>(r#"{ "scale_mode": "STRETCH" }"#)
            .unwrap_err();
        assert!(
            err.to_string().contains("unsupported stage scale mode `STRETCH`"),
            "{err}"
        );
    }
}
