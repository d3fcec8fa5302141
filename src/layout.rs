//! Layout geometry over a [`CardPreset`]: the safe area, contain/cover
//! sizing, and the placement rule for newly attached images.

use crate::preset::CardPreset;

/// Inner region guaranteed not to be trimmed; the primary placement target.
///
/// Derived from a preset, never mutated directly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SafeArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl SafeArea {
    pub fn of(preset: &CardPreset) -> Self {
        let m = preset.safe_margin_px;
        Self {
            left: m,
            top: m,
            right: preset.width_px - m,
            bottom: preset.height_px - m,
            width: preset.width_px - 2.0 * m,
            height: preset.height_px - 2.0 * m,
        }
    }

    pub fn rect(&self) -> kurbo::Rect {
        kurbo::Rect::new(self.left, self.top, self.right, self.bottom)
    }

    pub fn center(&self) -> kurbo::Point {
        kurbo::Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Contain: the largest size with the source's aspect ratio that fits
/// entirely inside `area_w × area_h`. May leave blank margins.
pub fn fit_within(natural_w: f64, natural_h: f64, area_w: f64, area_h: f64) -> (f64, f64) {
    let scale = (area_w / natural_w).min(area_h / natural_h);
    (natural_w * scale, natural_h * scale)
}

/// Cover: the smallest size with the source's aspect ratio that covers
/// `area_w × area_h` completely. Excess is cropped at draw time.
pub fn fill_over(natural_w: f64, natural_h: f64, area_w: f64, area_h: f64) -> (f64, f64) {
    let scale = (area_w / natural_w).max(area_h / natural_h);
    (natural_w * scale, natural_h * scale)
}

/// A center-based placement: where a layer sits and how big it displays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Placement rule for a newly attached image: centered on the safe area,
/// scaled down to fit only when the natural size exceeds the safe area in
/// either dimension. Smaller images keep their natural size and the user
/// adjusts manually.
pub fn initial_placement(natural_w: f64, natural_h: f64, safe: &SafeArea) -> PlacedRect {
    let (width, height) = if natural_w > safe.width || natural_h > safe.height {
        fit_within(natural_w, natural_h, safe.width, safe.height)
    } else {
        (natural_w, natural_h)
    };
    let c = safe.center();
    PlacedRect {
        x: c.x,
        y: c.y,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{CardPreset, Orientation, PrintSize};

    fn default_preset() -> CardPreset {
        CardPreset::derive(
            Some(PrintSize {
                length_in: 3.5,
                width_in: 2.0,
            }),
            Orientation::Horizontal,
        )
    }

    #[test]
    fn safe_area_of_default_preset() {
        let safe = SafeArea::of(&default_preset());
        assert_eq!(safe.left, 25.0);
        assert_eq!(safe.top, 25.0);
        assert_eq!(safe.right, 350.0);
        assert_eq!(safe.bottom, 200.0);
        assert_eq!(safe.width, 325.0);
        assert_eq!(safe.height, 175.0);
    }

    #[test]
    fn safe_area_center() {
        let c = SafeArea::of(&default_preset()).center();
        assert_eq!(c.x, 187.5);
        assert_eq!(c.y, 112.5);
    }

    // fit never exceeds the area; fill always covers it.
    #[test]
    fn fit_and_fill_bounds() {
        let cases = [
            (2000.0, 1000.0, 325.0, 175.0),
            (100.0, 400.0, 325.0, 175.0),
            (50.0, 50.0, 375.0, 225.0),
            (1.0, 1000.0, 375.0, 225.0),
        ];
        for (nw, nh, aw, ah) in cases {
            let (fw, fh) = fit_within(nw, nh, aw, ah);
            assert!(fw <= aw + 1e-9 && fh <= ah + 1e-9, "fit exceeded area");

            let (cw, ch) = fill_over(nw, nh, aw, ah);
            assert!(cw >= aw - 1e-9 && ch >= ah - 1e-9, "fill left a gap");
        }
    }

    #[test]
    fn fit_preserves_aspect_ratio() {
        let (w, h) = fit_within(2000.0, 1000.0, 325.0, 175.0);
        assert!((w / h - 2.0).abs() < 1e-9);
    }

    #[test]
    fn landscape_into_landscape_is_width_constrained() {
        let (w, h) = fit_within(2000.0, 1000.0, 325.0, 175.0);
        assert_eq!(w, 325.0);
        assert_eq!(h, 162.5);
    }

    #[test]
    fn portrait_into_landscape_is_height_constrained() {
        let (w, h) = fit_within(500.0, 1000.0, 325.0, 175.0);
        assert_eq!(h, 175.0);
        assert_eq!(w, 87.5);
    }

    #[test]
    fn oversized_image_is_fitted_and_centered() {
        let safe = SafeArea::of(&default_preset());
        let placed = initial_placement(2000.0, 1000.0, &safe);
        assert_eq!(placed.width, 325.0);
        assert_eq!(placed.height, 162.5);
        assert_eq!(placed.x, 187.5);
        assert_eq!(placed.y, 112.5);
    }

    #[test]
    fn small_image_keeps_natural_size() {
        let safe = SafeArea::of(&default_preset());
        let placed = initial_placement(100.0, 80.0, &safe);
        assert_eq!(placed.width, 100.0);
        assert_eq!(placed.height, 80.0);
        assert_eq!(placed.x, 187.5);
        assert_eq!(placed.y, 112.5);
    }

    #[test]
    fn one_axis_overflow_still_fits() {
        let safe = SafeArea::of(&default_preset());
        // Wider than the safe area but shorter: still scaled down to fit.
        let placed = initial_placement(650.0, 100.0, &safe);
        assert_eq!(placed.width, 325.0);
        assert_eq!(placed.height, 50.0);
    }
}
