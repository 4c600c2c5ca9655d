//! Aspect-ratio fitting of the camera frame into the container bounds.
//!
//! Every function here is pure: orientation, preview size and pixel density
//! are passed in on each layout pass and nothing is cached between calls.

use std::fmt;

use log::debug;

use crate::error::{PreviewError, Result};

/// Android `Configuration.ORIENTATION_PORTRAIT`.
pub const CONFIGURATION_PORTRAIT: i32 = 1;
/// Android `Configuration.ORIENTATION_LANDSCAPE`.
pub const CONFIGURATION_LANDSCAPE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSize {
    pub width: u32,
    pub height: u32,
}

impl PreviewSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn swapped(self) -> Self {
        Self::new(self.height, self.width)
    }
}

impl fmt::Display for PreviewSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn is_portrait(self) -> bool {
        self == Orientation::Portrait
    }

    /// Taller than wide is portrait; a square counts as landscape.
    pub fn from_bounds(width: u32, height: u32) -> Self {
        if height > width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Maps a host configuration orientation code.
    pub fn from_configuration(code: i32) -> Self {
        match code {
            CONFIGURATION_PORTRAIT => Orientation::Portrait,
            CONFIGURATION_LANDSCAPE => Orientation::Landscape,
            other => {
                debug!("undefined orientation {other}, treating as landscape");
                Orientation::Landscape
            }
        }
    }
}

/// Container bounds as reported by the host, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Sizes beyond `i32::MAX` are clamped.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, clamp_i32(width as i64), clamp_i32(height as i64))
    }

    pub fn width(&self) -> u32 {
        span(self.left, self.right)
    }

    pub fn height(&self) -> u32 {
        span(self.top, self.bottom)
    }
}

/// A child placement relative to the container origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl LayoutRect {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        clamp_i32(self.left as i64 + self.width as i64)
    }

    pub fn bottom(&self) -> i32 {
        clamp_i32(self.top as i64 + self.height as i64)
    }
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Used until the capture service reports a preview size.
    pub default_preview_size: PreviewSize,
    pub torch_button_dp: u32,
    pub debug_label: LayoutRect,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_preview_size: PreviewSize::new(320, 240),
            torch_button_dp: 45,
            debug_label: LayoutRect::new(100, 100, 900, 900),
        }
    }
}

/// Result of one layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPlan {
    /// Shared by every child of the container.
    pub preview: LayoutRect,
    pub torch: LayoutRect,
    pub debug_label: LayoutRect,
}

pub fn dp_to_px(dp: u32, density: f32) -> u32 {
    (dp as f32 * density).round().max(0.) as u32
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

// never more than u32::MAX, so the cast is lossless
fn span(start: i32, end: i32) -> u32 {
    (end as i64 - start as i64).max(0) as u32
}

// floor(value * num / den), exact in 64 bits for any u32 inputs
fn scale(value: u32, num: u32, den: u32) -> u64 {
    value as u64 * num as u64 / den as u64
}

// inner <= outer, so the result is at most i32::MAX
fn half_gap(outer: u32, inner: u32) -> i32 {
    ((outer - inner) / 2) as i32
}

/// Fits `frame` into `layout_width` x `layout_height`, preferring full width
/// and falling back to full height when the width fit would overflow.
///
/// In portrait the frame is rotated by 90 degrees relative to the sensor, so
/// its dimensions are swapped first. Both scaled dimensions are truncated
/// once from the exact product and offsets are the truncated half of the
/// remaining space.
pub fn fit_preview(
    layout_width: u32,
    layout_height: u32,
    frame: PreviewSize,
    orientation: Orientation,
) -> Result<LayoutRect> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PreviewError::Configuration(format!(
            "frame size {frame} has a zero dimension"
        )));
    }

    let frame = if orientation.is_portrait() {
        frame.swapped()
    } else {
        frame
    };

    let fit_width_height = scale(layout_width, frame.height, frame.width);
    if fit_width_height <= layout_height as u64 {
        let child_height = fit_width_height as u32;
        return Ok(LayoutRect::new(
            0,
            half_gap(layout_height, child_height),
            layout_width,
            child_height,
        ));
    }

    // strictly narrower than layout_width once the width fit overflowed
    let child_width = scale(layout_height, frame.width, frame.height) as u32;
    Ok(LayoutRect::new(
        half_gap(layout_width, child_width),
        0,
        child_width,
        layout_height,
    ))
}

/// The torch control sits at the bottom right, inset by twice its size.
pub fn torch_rect(layout_width: u32, layout_height: u32, button_px: u32) -> LayoutRect {
    let inset = 2 * button_px as i64;
    LayoutRect::new(
        clamp_i32(layout_width as i64 - inset),
        clamp_i32(layout_height as i64 - inset),
        button_px,
        button_px,
    )
}

/// Dimensions handed to the overlay renderer: `(min, max)` in portrait and
/// `(max, min)` otherwise.
pub fn overlay_dimensions(size: PreviewSize, orientation: Orientation) -> (u32, u32) {
    let min = size.width.min(size.height);
    let max = size.width.max(size.height);
    match orientation {
        Orientation::Portrait => (min, max),
        Orientation::Landscape => (max, min),
    }
}

pub fn compute_layout(
    bounds: Bounds,
    orientation: Orientation,
    preview_size: Option<PreviewSize>,
    density: f32,
    config: &LayoutConfig,
) -> Result<LayoutPlan> {
    let frame = preview_size.unwrap_or(config.default_preview_size);
    let (width, height) = (bounds.width(), bounds.height());
    let preview = fit_preview(width, height, frame, orientation)?;
    let torch = torch_rect(width, height, dp_to_px(config.torch_button_dp, density));
    Ok(LayoutPlan {
        preview,
        torch,
        debug_label: config.debug_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landscape(lw: u32, lh: u32, fw: u32, fh: u32) -> LayoutRect {
        fit_preview(lw, lh, PreviewSize::new(fw, fh), Orientation::Landscape).unwrap()
    }

    #[test]
    fn landscape_falls_back_to_fit_height() {
        assert_eq!(
            landscape(1000, 500, 640, 480),
            LayoutRect::new(167, 0, 666, 500)
        );
    }

    #[test]
    fn portrait_swaps_and_fits_width() {
        let frame = PreviewSize::new(640, 480);
        let rect = fit_preview(500, 1000, frame, Orientation::Portrait).unwrap();
        assert_eq!(rect, LayoutRect::new(0, 167, 500, 666));
    }

    #[test]
    fn exact_aspect_fills_bounds() {
        assert_eq!(
            landscape(640, 480, 1280, 960),
            LayoutRect::new(0, 0, 640, 480)
        );
    }

    #[test]
    fn zero_dimension_is_configuration_error() {
        for frame in [PreviewSize::new(0, 480), PreviewSize::new(640, 0)] {
            let err = fit_preview(1000, 500, frame, Orientation::Landscape).unwrap_err();
            assert!(matches!(err, PreviewError::Configuration(_)), "{err:?}");
        }
    }

    #[test]
    fn fit_width_height_beyond_u32_falls_back() {
        assert_eq!(
            landscape(1000, 50_000, 1, 4_295_000),
            LayoutRect::new(500, 0, 0, 50_000)
        );
    }

    #[test]
    fn huge_layouts_keep_offsets_positive() {
        assert_eq!(
            landscape(3_000_000_000, 100, 1, 1),
            LayoutRect::new(1_499_999_950, 0, 100, 100)
        );
        assert_eq!(
            landscape(u32::MAX, 1, 1, 1),
            LayoutRect::new(i32::MAX, 0, 1, 1)
        );
        assert_eq!(
            landscape(1, u32::MAX, 1, 1),
            LayoutRect::new(0, i32::MAX, 1, 1)
        );
    }

    #[test]
    fn extreme_bounds_do_not_overflow() {
        let bounds = Bounds::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(bounds.width(), u32::MAX);
        assert_eq!(bounds.height(), u32::MAX);
        assert_eq!(Bounds::new(10, 10, -10, -10).width(), 0);
        assert_eq!(Bounds::from_size(u32::MAX, 1).right, i32::MAX);

        let plan = compute_layout(
            bounds,
            Orientation::Landscape,
            Some(PreviewSize::new(640, 480)),
            1.0,
            &LayoutConfig::default(),
        )
        .unwrap();
        assert_eq!(plan.preview.top, 536_870_912);
        assert_eq!(plan.preview.width, u32::MAX);
        assert_eq!(plan.torch.left, i32::MAX);
        assert_eq!(plan.preview.right(), i32::MAX);
    }

    #[test]
    fn fitted_rect_never_exceeds_bounds() {
        let sizes = [1, 2, 3, 7, 240, 320, 479, 480, 640, 1080, 1920, 4000];
        for &lw in &sizes {
            for &lh in &sizes {
                for &fw in &sizes {
                    for &fh in &sizes {
                        for orientation in [Orientation::Portrait, Orientation::Landscape] {
                            let frame = PreviewSize::new(fw, fh);
                            let rect = fit_preview(lw, lh, frame, orientation).unwrap();
                            assert!(rect.width <= lw, "{lw}x{lh} {fw}x{fh} -> {rect:?}");
                            assert!(rect.height <= lh, "{lw}x{lh} {fw}x{fh} -> {rect:?}");
                            assert!(rect.left >= 0 && rect.top >= 0);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn portrait_equals_landscape_with_swapped_frame() {
        let sizes = [1, 5, 240, 333, 480, 640, 1080, 1920];
        for &lw in &sizes {
            for &lh in &sizes {
                for &fw in &sizes {
                    for &fh in &sizes {
                        let frame = PreviewSize::new(fw, fh);
                        let portrait = fit_preview(lw, lh, frame, Orientation::Portrait);
                        assert_eq!(portrait.unwrap(), landscape(lw, lh, fh, fw));
                    }
                }
            }
        }
    }

    #[test]
    fn torch_anchored_bottom_right() {
        let rect = torch_rect(1000, 500, dp_to_px(45, 2.0));
        assert_eq!(rect, LayoutRect::new(820, 320, 90, 90));
        assert_eq!(rect.right(), 910);
        assert_eq!(rect.bottom(), 410);
    }

    #[test]
    fn dp_rounds_to_nearest_pixel() {
        assert_eq!(dp_to_px(45, 1.0), 45);
        assert_eq!(dp_to_px(45, 1.5), 68);
        assert_eq!(dp_to_px(45, 2.625), 118);
    }

    #[test]
    fn overlay_gets_min_max_in_portrait() {
        let size = PreviewSize::new(640, 480);
        assert_eq!(overlay_dimensions(size, Orientation::Portrait), (480, 640));
        assert_eq!(overlay_dimensions(size, Orientation::Landscape), (640, 480));
    }

    #[test]
    fn missing_preview_size_uses_default() {
        let config = LayoutConfig::default();
        let bounds = Bounds::new(0, 0, 640, 480);
        let plan = compute_layout(bounds, Orientation::Landscape, None, 1.0, &config).unwrap();
        assert_eq!(plan.preview, LayoutRect::new(0, 0, 640, 480));
        assert_eq!(plan.torch, LayoutRect::new(550, 390, 45, 45));
        assert_eq!(plan.debug_label, config.debug_label);
    }

    #[test]
    fn bounds_use_relative_size() {
        let bounds = Bounds::new(50, 20, 1050, 520);
        let plan = compute_layout(
            bounds,
            Orientation::Landscape,
            Some(PreviewSize::new(640, 480)),
            1.0,
            &LayoutConfig::default(),
        )
        .unwrap();
        assert_eq!(plan.preview, LayoutRect::new(167, 0, 666, 500));
    }

    #[test]
    fn orientation_sources() {
        use Orientation::{Landscape, Portrait};

        assert_eq!(Orientation::from_bounds(500, 1000), Portrait);
        assert_eq!(Orientation::from_bounds(1000, 1000), Landscape);
        assert_eq!(Orientation::from_configuration(CONFIGURATION_PORTRAIT), Portrait);
        assert_eq!(
            Orientation::from_configuration(CONFIGURATION_LANDSCAPE),
            Landscape
        );
        assert_eq!(Orientation::from_configuration(0), Landscape);
    }
}
