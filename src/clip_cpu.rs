use crate::error::{CardproofError, CardproofResult};

/// Clear every pixel outside the rounded-rect outline of the full buffer,
/// in place. `radius <= 0` leaves the buffer untouched; larger radii are
/// clamped to half the shorter edge.
///
/// Operates on premultiplied RGBA8, so clearing is a plain zero write.
pub fn round_corners_in_place(
    rgba: &mut [u8],
    width: u32,
    height: u32,
    radius: f64,
) -> CardproofResult<()> {
    if rgba.len() != width as usize * height as usize * 4 {
        return Err(CardproofError::render(
            "round_corners_in_place expects a full rgba8 buffer",
        ));
    }
    if radius <= 0.0 || width == 0 || height == 0 {
        return Ok(());
    }

    let w = f64::from(width);
    let h = f64::from(height);
    let r = radius.min(w / 2.0).min(h / 2.0);
    let r2 = r * r;

    // Only the four corner squares can lose pixels.
    let span = r.ceil() as u32;
    let centers = [
        (r, r),
        (w - r, r),
        (r, h - r),
        (w - r, h - r),
    ];
    let x_ranges = [0..span.min(width), width.saturating_sub(span)..width];
    let y_ranges = [0..span.min(height), height.saturating_sub(span)..height];

    for ys in &y_ranges {
        for xs in &x_ranges {
            for y in ys.clone() {
                for x in xs.clone() {
                    let px = f64::from(x) + 0.5;
                    let py = f64::from(y) + 0.5;
                    // Inside the straight edges: nothing to clear.
                    if (px > r && px < w - r) || (py > r && py < h - r) {
                        continue;
                    }
                    let outside = centers.iter().all(|&(cx, cy)| {
                        let dx = px - cx;
                        let dy = py - cy;
                        dx * dx + dy * dy > r2
                    });
                    if outside {
                        let i = (y as usize * width as usize + x as usize) * 4;
                        rgba[i..i + 4].copy_from_slice(&[0, 0, 0, 0]);
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque_buffer(width: u32, height: u32) -> Vec<u8> {
        vec![255u8; width as usize * height as usize * 4]
    }

    fn alpha_at(rgba: &[u8], width: u32, x: u32, y: u32) -> u8 {
        rgba[(y as usize * width as usize + x as usize) * 4 + 3]
    }

    #[test]
    fn zero_radius_is_noop() {
        let mut buf = opaque_buffer(8, 8);
        let before = buf.clone();
        round_corners_in_place(&mut buf, 8, 8, 0.0).unwrap();
        assert_eq!(buf, before);
    }

    #[test]
    fn corners_clear_and_center_survives() {
        let (w, h) = (40u32, 20u32);
        let mut buf = opaque_buffer(w, h);
        round_corners_in_place(&mut buf, w, h, 8.0).unwrap();

        assert_eq!(alpha_at(&buf, w, 0, 0), 0);
        assert_eq!(alpha_at(&buf, w, w - 1, 0), 0);
        assert_eq!(alpha_at(&buf, w, 0, h - 1), 0);
        assert_eq!(alpha_at(&buf, w, w - 1, h - 1), 0);

        assert_eq!(alpha_at(&buf, w, w / 2, h / 2), 255);
        // Edge midpoints sit on the straight segments and survive.
        assert_eq!(alpha_at(&buf, w, w / 2, 0), 255);
        assert_eq!(alpha_at(&buf, w, 0, h / 2), 255);
    }

    #[test]
    fn oversized_radius_is_clamped() {
        let (w, h) = (10u32, 10u32);
        let mut buf = opaque_buffer(w, h);
        round_corners_in_place(&mut buf, w, h, 1000.0).unwrap();
        // Clamped to a circle; the middle is still there.
        assert_eq!(alpha_at(&buf, w, 5, 5), 255);
        assert_eq!(alpha_at(&buf, w, 0, 0), 0);
    }

    #[test]
    fn wrong_buffer_length_is_rejected() {
        let mut buf = vec![0u8; 10];
        assert!(round_corners_in_place(&mut buf, 8, 8, 2.0).is_err());
    }
}
