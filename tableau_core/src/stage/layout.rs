// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport-to-stage mapping.
//!
//! [`compute_layout`] is a pure function of the viewport size, the logical
//! (design) size, the scale mode and the orientation settings. The stage runs
//! it on every refresh and publishes the result.
//!
//! | Mode | Stage size | Scale factor | Offset |
//! |---|---|---|---|
//! | `NORMAL` | viewport | 1 | 0, 0 |
//! | `FIXED` | logical | min(W/w, H/h) | 0, 0 |
//! | `CONTAIN` | logical | min(W/w, H/h) | centered |
//! | `COVER` | logical | max(W/w, H/h) | centered |
//! | `FIXED_WIDTH` | logical | W/w | centered |
//! | `NO_SCALE` | viewport × dpr | 1/dpr | 0, 0 |
//!
//! Stage size and offsets are rounded half-up as the last step.

use alloc::string::String;
use core::f64::consts::FRAC_PI_2;
use core::fmt;
use core::str::FromStr;

use crate::error::{GuardPolicy, SceneError};
use crate::geometry::{Affine, Size, Vec2, round_half_up, with_translation};
use crate::viewport::DeviceOrientation;

/// Policy mapping the viewport's pixel size to the stage's logical size.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ScaleMode {
    /// Stage matches the viewport one to one.
    #[default]
    Normal,
    /// Logical size, uniformly scaled to fit, pinned to the top-left corner.
    Fixed,
    /// Logical size, uniformly scaled to fit, centered (letterboxed).
    Contain,
    /// Logical size, uniformly scaled to fill, centered (cropped).
    Cover,
    /// Logical size, scaled to the viewport width, centered vertically.
    FixedWidth,
    /// Stage covers the viewport in device pixels.
    NoScale,
}

impl ScaleMode {
    /// Every scale mode, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Normal,
        Self::Fixed,
        Self::Contain,
        Self::Cover,
        Self::FixedWidth,
        Self::NoScale,
    ];

    /// The configuration name of this mode.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Fixed => "FIXED",
            Self::Contain => "CONTAIN",
            Self::Cover => "COVER",
            Self::FixedWidth => "FIXED_WIDTH",
            Self::NoScale => "NO_SCALE",
        }
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaleMode {
    type Err = SceneError;

    /// Parses a configuration name. An unknown name is reported through the
    /// log before it is returned.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| GuardPolicy::Report.raise(SceneError::UnsupportedScaleMode(s.into())))
    }
}

impl TryFrom<String> for ScaleMode {
    type Error = SceneError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ScaleMode> for &'static str {
    fn from(mode: ScaleMode) -> Self {
        mode.name()
    }
}

/// Which device orientation the stage content is authored for.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "&'static str")]
pub enum StageOrientation {
    /// Content works in either orientation.
    #[default]
    Universal,
    /// Content is wider than tall.
    Landscape,
    /// Content is taller than wide.
    Portrait,
}

impl StageOrientation {
    /// Every orientation, in declaration order.
    pub const ALL: [Self; 3] = [Self::Universal, Self::Landscape, Self::Portrait];

    /// The configuration name of this orientation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Universal => "UNIVERSAL",
            Self::Landscape => "LANDSCAPE",
            Self::Portrait => "PORTRAIT",
        }
    }

    /// Returns whether content authored for `self` conflicts with a device
    /// held in `device` orientation.
    #[must_use]
    pub fn conflicts_with(self, device: DeviceOrientation) -> bool {
        matches!(
            (self, device),
            (Self::Landscape, DeviceOrientation::Portrait)
                | (Self::Portrait, DeviceOrientation::Landscape)
        )
    }
}

impl fmt::Display for StageOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StageOrientation {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.name() == s)
            .ok_or_else(|| GuardPolicy::Report.raise(SceneError::UnsupportedOrientation(s.into())))
    }
}

impl TryFrom<String> for StageOrientation {
    type Error = SceneError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StageOrientation> for &'static str {
    fn from(o: StageOrientation) -> Self {
        o.name()
    }
}

/// Everything a stage layout depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageInput {
    /// Viewport size in CSS pixels, as reported by the host.
    pub viewport: Size,
    /// Logical (design) size.
    pub logical: Size,
    /// Scale policy.
    pub scale_mode: ScaleMode,
    /// Orientation the content is authored for.
    pub orientation: StageOrientation,
    /// Whether a conflicting device orientation is compensated by rotating
    /// the stage.
    pub orientation_lock: bool,
    /// Current device orientation.
    pub device_orientation: DeviceOrientation,
    /// Device pixels per CSS pixel.
    pub device_pixel_ratio: f64,
}

/// The published result of a stage refresh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageLayout {
    /// Stage width in logical units, rounded.
    pub stage_width: f64,
    /// Stage height in logical units, rounded.
    pub stage_height: f64,
    /// Uniform scale from logical units to viewport pixels.
    pub scale_factor: f64,
    /// Horizontal placement in viewport pixels, rounded.
    pub offset_x: f64,
    /// Vertical placement in viewport pixels, rounded.
    pub offset_y: f64,
    /// Whether the viewport axes were swapped to honour the orientation lock.
    pub swapped: bool,
    /// The stage root's local matrix.
    pub local: Affine,
}

impl Default for StageLayout {
    fn default() -> Self {
        Self {
            stage_width: 0.0,
            stage_height: 0.0,
            scale_factor: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            swapped: false,
            local: Affine::IDENTITY,
        }
    }
}

impl StageLayout {
    /// Stage size in logical units.
    #[must_use]
    pub fn stage_size(&self) -> Size {
        Size::new(self.stage_width, self.stage_height)
    }
}

/// Computes the stage layout for `input`.
///
/// Degenerate viewports (zero or negative extents) produce a degenerate
/// layout rather than an error.
#[must_use]
pub fn compute_layout(input: &StageInput) -> StageLayout {
    let swapped = input.orientation_lock
        && input.orientation.conflicts_with(input.device_orientation);
    let size = if swapped {
        Size::new(input.viewport.height, input.viewport.width)
    } else {
        input.viewport
    };
    let logical = input.logical;
    let fit_x = size.width / logical.width;
    let fit_y = size.height / logical.height;

    let (stage, scale_factor, offset) = match input.scale_mode {
        ScaleMode::Normal => (size, 1.0, Vec2::ZERO),
        ScaleMode::Fixed => (logical, fit_x.min(fit_y), Vec2::ZERO),
        ScaleMode::Contain => {
            let sf = fit_x.min(fit_y);
            (logical, sf, centered(size, logical, sf))
        }
        ScaleMode::Cover => {
            let sf = fit_x.max(fit_y);
            (logical, sf, centered(size, logical, sf))
        }
        ScaleMode::FixedWidth => (logical, fit_x, centered(size, logical, fit_x)),
        ScaleMode::NoScale => (
            size * input.device_pixel_ratio,
            1.0 / input.device_pixel_ratio,
            Vec2::ZERO,
        ),
    };

    let stage_width = round_half_up(stage.width);
    let stage_height = round_half_up(stage.height);
    let offset_x = round_half_up(offset.x);
    let offset_y = round_half_up(offset.y);

    let mut local = Affine::new([scale_factor, 0.0, 0.0, scale_factor, offset_x, offset_y]);
    if swapped {
        let (tx, ty) = match input.scale_mode {
            ScaleMode::Contain | ScaleMode::Cover => (
                input.viewport.width * 0.5 - stage_height * 0.5 * scale_factor,
                input.viewport.height * 0.5 + stage_width * 0.5 * scale_factor,
            ),
            _ => (0.0, input.viewport.height),
        };
        local = with_translation(Affine::rotate(-FRAC_PI_2) * local, tx, ty);
    }

    StageLayout {
        stage_width,
        stage_height,
        scale_factor,
        offset_x,
        offset_y,
        swapped,
        local,
    }
}

fn centered(viewport: Size, logical: Size, scale_factor: f64) -> Vec2 {
    Vec2::new(
        (viewport.width - logical.width * scale_factor) / 2.0,
        (viewport.height - logical.height * scale_factor) / 2.0,
    )
}
