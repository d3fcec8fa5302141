//! Interaction engine: pointer gestures over the active image layer.
//!
//! A small state machine tracks the gesture between pointer-down and
//! pointer-up, carrying the context captured at gesture start. Pointer
//! positions arrive in screen space; every delta is divided by the current
//! zoom before it touches layer geometry, so editing behaves identically
//! at any zoom level.

use kurbo::Point;

use crate::error::{CardproofError, CardproofResult};
use crate::model::{EditorState, ImageLayer, ImageLayerPatch};

/// Smallest width a resize gesture can produce. Height follows the locked
/// aspect ratio and may legally end up below this floor.
pub const MIN_RESIZE_WIDTH_PX: f64 = 50.0;

/// The four diagonal resize handles. Edge handles are not supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeHandle {
    Nw,
    Ne,
    Sw,
    Se,
}

impl ResizeHandle {
    /// Sign of the width change for a positive horizontal pointer delta:
    /// east handles grow rightward, west handles grow leftward.
    fn sign_x(self) -> f64 {
        match self {
            Self::Ne | Self::Se => 1.0,
            Self::Nw | Self::Sw => -1.0,
        }
    }
}

/// The active gesture, with the context captured at pointer-down.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PointerState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The image is being moved.
    Dragging {
        /// Screen-space pointer position at gesture start.
        start_pointer: Point,
        /// Image center at gesture start.
        start_center: Point,
    },
    /// The image is being resized from one corner handle.
    Resizing {
        handle: ResizeHandle,
        /// Screen-space pointer position at gesture start.
        start_pointer: Point,
        /// Image width at gesture start.
        start_width: f64,
        /// width/height ratio locked for the whole gesture.
        aspect: f64,
    },
}

/// Converts pointer movement into image-layer mutations.
#[derive(Clone, Debug)]
pub struct InteractionEngine {
    state: PointerState,
    zoom: f64,
}

impl Default for InteractionEngine {
    fn default() -> Self {
        Self {
            state: PointerState::Idle,
            zoom: 1.0,
        }
    }
}

impl InteractionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == PointerState::Idle
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Set the editor zoom scale factor (1.0 = no zoom).
    pub fn set_zoom(&mut self, zoom: f64) -> CardproofResult<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(CardproofError::interaction("zoom must be finite and > 0"));
        }
        self.zoom = zoom;
        Ok(())
    }

    /// Pointer-down on the image body. Only valid from idle; drag and
    /// resize are never active simultaneously.
    pub fn begin_drag(&mut self, pointer: Point, editor: &EditorState) -> CardproofResult<()> {
        if self.state != PointerState::Idle {
            return Err(CardproofError::interaction(
                "cannot start a drag while another gesture is active",
            ));
        }
        let Some(image) = editor.active().image.as_ref() else {
            return Err(CardproofError::interaction("no image on the active side"));
        };
        self.state = PointerState::Dragging {
            start_pointer: pointer,
            start_center: Point::new(image.x, image.y),
        };
        Ok(())
    }

    /// Pointer-down on a corner handle. Locks the aspect ratio for the
    /// whole gesture.
    pub fn begin_resize(
        &mut self,
        handle: ResizeHandle,
        pointer: Point,
        editor: &EditorState,
    ) -> CardproofResult<()> {
        if self.state != PointerState::Idle {
            return Err(CardproofError::interaction(
                "cannot start a resize while another gesture is active",
            ));
        }
        let Some(image) = editor.active().image.as_ref() else {
            return Err(CardproofError::interaction("no image on the active side"));
        };
        if image.height <= 0.0 || !(image.width / image.height).is_finite() {
            return Err(CardproofError::interaction(
                "image has no usable aspect ratio",
            ));
        }
        self.state = PointerState::Resizing {
            handle,
            start_pointer: pointer,
            start_width: image.width,
            aspect: image.width / image.height,
        };
        Ok(())
    }

    /// Pointer movement during a gesture. Applies the resulting geometry
    /// to the active image and returns whether anything was mutated.
    pub fn pointer_move(&mut self, pointer: Point, editor: &mut EditorState) -> bool {
        match self.state {
            PointerState::Idle => false,
            PointerState::Dragging {
                start_pointer,
                start_center,
            } => {
                let dx = (pointer.x - start_pointer.x) / self.zoom;
                let dy = (pointer.y - start_pointer.y) / self.zoom;
                editor.update_current_image(&ImageLayerPatch {
                    x: Some(start_center.x + dx),
                    y: Some(start_center.y + dy),
                    ..Default::default()
                })
            }
            PointerState::Resizing {
                handle,
                start_pointer,
                start_width,
                aspect,
            } => {
                let dx = (pointer.x - start_pointer.x) / self.zoom;
                let width = (start_width + handle.sign_x() * dx).max(MIN_RESIZE_WIDTH_PX);
                editor.update_current_image(&ImageLayerPatch {
                    width: Some(width),
                    height: Some(width / aspect),
                    ..Default::default()
                })
            }
        }
    }

    /// Global pointer-up: ends whatever gesture is active.
    pub fn pointer_up(&mut self) {
        self.state = PointerState::Idle;
    }
}

/// Corner-handle render positions, derived live from the layer's current
/// bounding box.
pub fn handle_positions(image: &ImageLayer) -> [(ResizeHandle, Point); 4] {
    let (hw, hh) = (image.width / 2.0, image.height / 2.0);
    [
        (ResizeHandle::Nw, Point::new(image.x - hw, image.y - hh)),
        (ResizeHandle::Ne, Point::new(image.x + hw, image.y - hh)),
        (ResizeHandle::Sw, Point::new(image.x - hw, image.y + hh)),
        (ResizeHandle::Se, Point::new(image.x + hw, image.y + hh)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageSourceRef, SideId};
    use crate::preset::Orientation;

    const EPSILON: f64 = 1e-9;

    fn editor_with_image() -> EditorState {
        let mut st = EditorState::new(None, Orientation::Horizontal);
        st.attach_image(
            SideId::Front,
            ImageSourceRef("a".to_string()),
            200.0,
            100.0,
        );
        st
    }

    fn image(st: &EditorState) -> &ImageLayer {
        st.front.image.as_ref().unwrap()
    }

    #[test]
    fn drag_translates_center() {
        let mut st = editor_with_image();
        let (x0, y0) = (image(&st).x, image(&st).y);

        let mut engine = InteractionEngine::new();
        engine.begin_drag(Point::new(50.0, 50.0), &st).unwrap();
        assert!(engine.pointer_move(Point::new(65.0, 40.0), &mut st));
        engine.pointer_up();

        assert_eq!(image(&st).x, x0 + 15.0);
        assert_eq!(image(&st).y, y0 - 10.0);
        assert!(engine.is_idle());
    }

    #[test]
    fn drag_deltas_are_divided_by_zoom() {
        let mut st = editor_with_image();
        let x0 = image(&st).x;

        let mut engine = InteractionEngine::new();
        engine.set_zoom(2.0).unwrap();
        engine.begin_drag(Point::new(0.0, 0.0), &st).unwrap();
        engine.pointer_move(Point::new(30.0, 0.0), &mut st);

        assert_eq!(image(&st).x, x0 + 15.0);
    }

    #[test]
    fn drag_is_relative_to_gesture_start_not_cumulative() {
        let mut st = editor_with_image();
        let x0 = image(&st).x;

        let mut engine = InteractionEngine::new();
        engine.begin_drag(Point::new(0.0, 0.0), &st).unwrap();
        engine.pointer_move(Point::new(10.0, 0.0), &mut st);
        engine.pointer_move(Point::new(10.0, 0.0), &mut st);
        engine.pointer_move(Point::new(25.0, 0.0), &mut st);

        assert_eq!(image(&st).x, x0 + 25.0);
    }

    #[test]
    fn resize_from_se_grows_with_positive_dx() {
        let mut st = editor_with_image();
        let w0 = image(&st).width;

        let mut engine = InteractionEngine::new();
        engine
            .begin_resize(ResizeHandle::Se, Point::new(0.0, 0.0), &st)
            .unwrap();
        engine.pointer_move(Point::new(40.0, 0.0), &mut st);

        assert_eq!(image(&st).width, w0 + 40.0);
    }

    #[test]
    fn resize_from_nw_grows_with_negative_dx() {
        let mut st = editor_with_image();
        let w0 = image(&st).width;

        let mut engine = InteractionEngine::new();
        engine
            .begin_resize(ResizeHandle::Nw, Point::new(0.0, 0.0), &st)
            .unwrap();
        engine.pointer_move(Point::new(-40.0, 0.0), &mut st);

        assert_eq!(image(&st).width, w0 + 40.0);
    }

    #[test]
    fn resize_preserves_aspect_across_arbitrary_deltas() {
        let mut st = editor_with_image();
        let aspect0 = image(&st).width / image(&st).height;

        let mut engine = InteractionEngine::new();
        engine
            .begin_resize(ResizeHandle::Ne, Point::new(0.0, 0.0), &st)
            .unwrap();
        for (x, y) in [
            (12.0, -3.0),
            (-30.0, 44.0),
            (80.5, 13.2),
            (-200.0, 0.0),
            (63.0, -17.0),
        ] {
            engine.pointer_move(Point::new(x, y), &mut st);
            let img = image(&st);
            assert!((img.width / img.height - aspect0).abs() < EPSILON);
        }
    }

    #[test]
    fn resize_keeps_center_anchored() {
        let mut st = editor_with_image();
        let (x0, y0) = (image(&st).x, image(&st).y);

        let mut engine = InteractionEngine::new();
        engine
            .begin_resize(ResizeHandle::Se, Point::new(0.0, 0.0), &st)
            .unwrap();
        engine.pointer_move(Point::new(33.0, 9.0), &mut st);

        assert_eq!((image(&st).x, image(&st).y), (x0, y0));
    }

    #[test]
    fn resize_clamps_width_to_minimum() {
        let mut st = editor_with_image();

        let mut engine = InteractionEngine::new();
        engine
            .begin_resize(ResizeHandle::Se, Point::new(0.0, 0.0), &st)
            .unwrap();
        engine.pointer_move(Point::new(-10_000.0, 0.0), &mut st);

        assert_eq!(image(&st).width, MIN_RESIZE_WIDTH_PX);
    }

    // The clamp constrains width only; with an extreme locked ratio the
    // height floor falls out of it. Accepted behavior, kept as-is.
    #[test]
    fn clamped_height_may_fall_below_minimum() {
        let mut st = EditorState::new(None, Orientation::Horizontal);
        st.attach_image(
            SideId::Front,
            ImageSourceRef("wide".to_string()),
            300.0,
            30.0,
        );

        let mut engine = InteractionEngine::new();
        engine
            .begin_resize(ResizeHandle::Se, Point::new(0.0, 0.0), &st)
            .unwrap();
        engine.pointer_move(Point::new(-10_000.0, 0.0), &mut st);

        let img = image(&st);
        assert_eq!(img.width, MIN_RESIZE_WIDTH_PX);
        assert!(img.height < MIN_RESIZE_WIDTH_PX);
        assert_eq!(img.height, MIN_RESIZE_WIDTH_PX / 10.0);
    }

    #[test]
    fn resize_deltas_are_divided_by_zoom() {
        let mut st = editor_with_image();
        let w0 = image(&st).width;

        let mut engine = InteractionEngine::new();
        engine.set_zoom(4.0).unwrap();
        engine
            .begin_resize(ResizeHandle::Se, Point::new(0.0, 0.0), &st)
            .unwrap();
        engine.pointer_move(Point::new(40.0, 0.0), &mut st);

        assert_eq!(image(&st).width, w0 + 10.0);
    }

    #[test]
    fn gestures_cannot_overlap() {
        let mut engine = InteractionEngine::new();
        let st = editor_with_image();

        engine.begin_drag(Point::new(0.0, 0.0), &st).unwrap();
        assert!(
            engine
                .begin_resize(ResizeHandle::Se, Point::new(0.0, 0.0), &st)
                .is_err()
        );
        assert!(engine.begin_drag(Point::new(0.0, 0.0), &st).is_err());

        engine.pointer_up();
        assert!(
            engine
                .begin_resize(ResizeHandle::Se, Point::new(0.0, 0.0), &st)
                .is_ok()
        );
    }

    #[test]
    fn gestures_require_an_image() {
        let st = EditorState::new(None, Orientation::Horizontal);
        let mut engine = InteractionEngine::new();
        assert!(engine.begin_drag(Point::new(0.0, 0.0), &st).is_err());
        assert!(engine.is_idle());
    }

    #[test]
    fn move_while_idle_does_nothing() {
        let mut st = editor_with_image();
        st.mark_saved();
        let mut engine = InteractionEngine::new();
        assert!(!engine.pointer_move(Point::new(10.0, 10.0), &mut st));
        assert!(!st.has_unsaved_changes);
    }

    #[test]
    fn invalid_zoom_is_rejected() {
        let mut engine = InteractionEngine::new();
        assert!(engine.set_zoom(0.0).is_err());
        assert!(engine.set_zoom(-1.0).is_err());
        assert!(engine.set_zoom(f64::NAN).is_err());
        assert_eq!(engine.zoom(), 1.0);
    }

    #[test]
    fn handles_sit_on_bounding_box_corners() {
        let st = editor_with_image();
        let img = image(&st);
        let handles = handle_positions(img);
        let find = |h: ResizeHandle| handles.iter().find(|(k, _)| *k == h).unwrap().1;

        assert_eq!(
            find(ResizeHandle::Nw),
            Point::new(img.x - img.width / 2.0, img.y - img.height / 2.0)
        );
        assert_eq!(
            find(ResizeHandle::Se),
            Point::new(img.x + img.width / 2.0, img.y + img.height / 2.0)
        );
    }
}
