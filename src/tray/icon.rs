//! Tray icon image.

use crate::error::{Result, TrackerError};
use tray_icon::Icon;

const SIZE: u32 = 32;

/// Draws the tray icon: a rounded key cap with a bar for the space key.
pub fn create_default_icon() -> Result<Icon> {
    let mut rgba = Vec::with_capacity((SIZE * SIZE * 4) as usize);

    for y in 0..SIZE {
        for x in 0..SIZE {
            rgba.extend_from_slice(&pixel(x, y));
        }
    }

    Icon::from_rgba(rgba, SIZE, SIZE).map_err(|e| TrackerError::Tray(e.to_string()))
}

fn pixel(x: u32, y: u32) -> [u8; 4] {
    const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];
    const CAP: [u8; 4] = [46, 160, 98, 255];
    const BAR: [u8; 4] = [240, 248, 244, 255];

    if !inside_rounded_square(x, y, 2, 6) {
        return TRANSPARENT;
    }

    let bar = (20..24).contains(&y) && (8..24).contains(&x);
    if bar {
        BAR
    } else {
        CAP
    }
}

/// Whether (x, y) lies in a square inset by `margin` with corner `radius`.
fn inside_rounded_square(x: u32, y: u32, margin: u32, radius: u32) -> bool {
    let lo = margin + radius;
    let hi = SIZE - 1 - margin - radius;

    if x < margin || y < margin || x > SIZE - 1 - margin || y > SIZE - 1 - margin {
        return false;
    }

    let cx = x.clamp(lo, hi) as i32;
    let cy = y.clamp(lo, hi) as i32;
    let dx = x as i32 - cx;
    let dy = y as i32 - cy;
    dx * dx + dy * dy <= (radius * radius) as i32
}
