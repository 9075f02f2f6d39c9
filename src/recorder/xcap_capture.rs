//! Region capture through `xcap`, assembled with `image`.

use std::path::Path;

use image::{imageops, Rgba, RgbaImage};
use xcap::Monitor;

use super::capture::{CaptureError, Region, ScreenshotProvider};

/// Captures the fixed box around a click at its full size.
///
/// Every monitor the box overlaps contributes its pixels; whatever lies off
/// all screens stays black.
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapCapture;

impl XcapCapture {
    pub fn new() -> Self {
        Self
    }
}

fn backend<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> CaptureError {
    move |err| CaptureError::Backend(format!("{context}: {err}"))
}

fn monitor_bounds(monitor: &Monitor) -> Result<Region, CaptureError> {
    let left = monitor.x().map_err(backend("monitor x"))?;
    let top = monitor.y().map_err(backend("monitor y"))?;
    let width = monitor.width().map_err(backend("monitor width"))? as i32;
    let height = monitor.height().map_err(backend("monitor height"))? as i32;
    Ok(Region {
        left,
        top,
        right: left + width,
        bottom: top + height,
    })
}

/// Which pixels of one monitor's capture land where in the saved box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    /// Source rectangle in the captured image, physical pixels.
    crop_x: u32,
    crop_y: u32,
    crop_width: u32,
    crop_height: u32,
    /// Destination rectangle in the box, logical pixels.
    dest_x: i64,
    dest_y: i64,
    dest_width: u32,
    dest_height: u32,
}

/// `scale` converts the monitor's logical bounds to the captured image's pixels.
fn placement(
    region: Region,
    monitor: Region,
    scale: f64,
    image_width: u32,
    image_height: u32,
) -> Option<Placement> {
    let visible = region.intersect(&monitor)?;
    let crop_x = ((visible.left - monitor.left) as f64 * scale).round() as u32;
    let crop_y = ((visible.top - monitor.top) as f64 * scale).round() as u32;
    let crop_width =
        ((visible.width() as f64 * scale).round() as u32).min(image_width.saturating_sub(crop_x));
    let crop_height =
        ((visible.height() as f64 * scale).round() as u32).min(image_height.saturating_sub(crop_y));
    if crop_width == 0 || crop_height == 0 {
        return None;
    }
    Some(Placement {
        crop_x,
        crop_y,
        crop_width,
        crop_height,
        dest_x: i64::from(visible.left - region.left),
        dest_y: i64::from(visible.top - region.top),
        dest_width: visible.width() as u32,
        dest_height: visible.height() as u32,
    })
}

impl ScreenshotProvider for XcapCapture {
    fn capture_region(&self, region: Region, output: &Path) -> Result<(), CaptureError> {
        if region.is_empty() {
            return Err(region.invalid());
        }

        let monitors = Monitor::all().map_err(backend("list monitors"))?;
        let mut canvas = RgbaImage::from_pixel(
            region.width() as u32,
            region.height() as u32,
            Rgba([0, 0, 0, 255]),
        );
        let mut covered = false;

        for monitor in &monitors {
            let bounds = monitor_bounds(monitor)?;
            if region.intersect(&bounds).is_none() {
                continue;
            }
            let image = monitor
                .capture_image()
                .map_err(backend("capture monitor"))?;
            let scale = image.width() as f64 / bounds.width().max(1) as f64;
            let Some(place) = placement(region, bounds, scale, image.width(), image.height())
            else {
                continue;
            };

            let mut part = imageops::crop_imm(
                &image,
                place.crop_x,
                place.crop_y,
                place.crop_width,
                place.crop_height,
            )
            .to_image();
            if (part.width(), part.height()) != (place.dest_width, place.dest_height) {
                part = imageops::resize(
                    &part,
                    place.dest_width,
                    place.dest_height,
                    imageops::FilterType::Triangle,
                );
            }
            imageops::overlay(&mut canvas, &part, place.dest_x, place.dest_y);
            covered = true;
        }

        if !covered {
            return Err(region.invalid());
        }
        canvas.save(output)?;
        Ok(())
    }
}
