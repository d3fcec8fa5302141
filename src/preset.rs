//! Dimension calculator: physical print size → on-screen canvas preset.
//!
//! All canvas-space math in the crate runs in the pixel space defined here:
//! the full bleed-inclusive canvas at a fixed 100 px/inch, with the trim
//! line one bleed margin in from each edge and the safe area one further
//! margin in.

/// Render resolution of the editing canvas.
pub const PX_PER_IN: f64 = 100.0;

/// Bleed added to each physical dimension, in inches (0.125" per edge).
pub const BLEED_IN: f64 = 0.125;

const CM_PER_IN: f64 = 2.54;

/// Physical trim size of the printed card, in inches.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PrintSize {
    pub length_in: f64,
    pub width_in: f64,
}

impl PrintSize {
    /// The standard business-card fallback used when a product carries no
    /// usable dimensions.
    pub fn fallback() -> Self {
        Self {
            length_in: 3.5,
            width_in: 2.0,
        }
    }

    fn is_usable(self) -> bool {
        self.length_in.is_finite()
            && self.width_in.is_finite()
            && self.length_in > 0.0
            && self.width_in > 0.0
    }
}

/// Which way the card is held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Length maps to canvas width.
    #[default]
    Horizontal,
    /// Length maps to canvas height.
    Vertical,
}

/// Derived pixel geometry for one (print size, orientation) pair.
///
/// Immutable once derived; recompute when the inputs change. Margins are
/// kept fractional so `safe_margin_px == 2.0 * bleed_margin_px` holds
/// exactly.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CardPreset {
    /// Full bleed-inclusive canvas width in pixels.
    pub width_px: f64,
    /// Full bleed-inclusive canvas height in pixels.
    pub height_px: f64,
    /// Distance from the canvas edge to the trim line, in pixels.
    pub bleed_margin_px: f64,
    /// Distance from the canvas edge to the safe area, in pixels.
    pub safe_margin_px: f64,
    /// Trim width in centimeters, for display only.
    pub width_cm: f64,
    /// Trim height in centimeters, for display only.
    pub height_cm: f64,
}

impl CardPreset {
    /// Derive a preset from physical dimensions and orientation.
    ///
    /// Total: missing or unusable dimensions degrade to
    /// [`PrintSize::fallback`], so a usable preset always comes back.
    pub fn derive(size: Option<PrintSize>, orientation: Orientation) -> Self {
        let size = match size {
            Some(s) if s.is_usable() => s,
            _ => PrintSize::fallback(),
        };

        let (w_in, h_in) = match orientation {
            Orientation::Horizontal => (size.length_in, size.width_in),
            Orientation::Vertical => (size.width_in, size.length_in),
        };

        let bleed_margin_px = BLEED_IN * PX_PER_IN;
        Self {
            width_px: (w_in + 2.0 * BLEED_IN) * PX_PER_IN,
            height_px: (h_in + 2.0 * BLEED_IN) * PX_PER_IN,
            bleed_margin_px,
            safe_margin_px: 2.0 * bleed_margin_px,
            width_cm: w_in * CM_PER_IN,
            height_cm: h_in * CM_PER_IN,
        }
    }

    /// Canvas bounds as a rect anchored at the origin.
    pub fn rect(&self) -> kurbo::Rect {
        kurbo::Rect::new(0.0, 0.0, self.width_px, self.height_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_business_card_preset() {
        let p = CardPreset::derive(
            Some(PrintSize {
                length_in: 3.5,
                width_in: 2.0,
            }),
            Orientation::Horizontal,
        );
        assert_eq!(p.width_px, 375.0);
        assert_eq!(p.height_px, 225.0);
        assert_eq!(p.bleed_margin_px, 12.5);
        assert_eq!(p.safe_margin_px, 25.0);
    }

    #[test]
    fn safe_margin_is_twice_bleed() {
        for (l, w) in [(3.5, 2.0), (5.0, 7.0), (4.25, 5.5)] {
            let p = CardPreset::derive(
                Some(PrintSize {
                    length_in: l,
                    width_in: w,
                }),
                Orientation::Horizontal,
            );
            assert_eq!(p.safe_margin_px, 2.0 * p.bleed_margin_px);
        }
    }

    #[test]
    fn vertical_swaps_axes() {
        let size = PrintSize {
            length_in: 3.5,
            width_in: 2.0,
        };
        let h = CardPreset::derive(Some(size), Orientation::Horizontal);
        let v = CardPreset::derive(Some(size), Orientation::Vertical);
        assert_eq!(h.width_px, v.height_px);
        assert_eq!(h.height_px, v.width_px);
        assert_eq!(h.width_cm, v.height_cm);
    }

    #[test]
    fn missing_size_falls_back() {
        let p = CardPreset::derive(None, Orientation::Horizontal);
        assert_eq!(p.width_px, 375.0);
        assert_eq!(p.height_px, 225.0);
    }

    #[test]
    fn invalid_size_falls_back() {
        for bad in [
            PrintSize {
                length_in: 0.0,
                width_in: 2.0,
            },
            PrintSize {
                length_in: -3.5,
                width_in: 2.0,
            },
            PrintSize {
                length_in: f64::NAN,
                width_in: 2.0,
            },
            PrintSize {
                length_in: 3.5,
                width_in: f64::INFINITY,
            },
        ] {
            let p = CardPreset::derive(Some(bad), Orientation::Horizontal);
            assert_eq!(p.width_px, 375.0);
            assert_eq!(p.height_px, 225.0);
        }
    }

    #[test]
    fn display_cm_is_trim_size() {
        let p = CardPreset::derive(
            Some(PrintSize {
                length_in: 3.5,
                width_in: 2.0,
            }),
            Orientation::Horizontal,
        );
        assert!((p.width_cm - 8.89).abs() < 1e-9);
        assert!((p.height_cm - 5.08).abs() < 1e-9);
    }

    #[test]
    fn orientation_serde_is_lowercase() {
        let s = serde_json::to_string(&Orientation::Vertical).unwrap();
        assert_eq!(s, "\"vertical\"");
    }
}
