use cardproof::{
    DesignEditPayload, DesignStore, EditorState, ImageSourceRef, InMemoryDesignStore,
    InteractionEngine, Orientation, Placement, PrintSize, SideId, UploadPolicy, UploadRequest,
    can_proceed, classify_side_image, load_initial, save_design, validate_upload,
};
use kurbo::Point;

#[test]
fn design_edit_payload_json_uses_the_wire_names() {
    let json = r#"{
        "front_canvas_state": {
            "x": 187.5, "y": 112.5, "width": 325.0, "height": 162.5,
            "rotation": 0.0, "naturalWidth": 2000.0, "naturalHeight": 1000.0
        },
        "front_image_url": "https://cdn.example/front.png",
        "back_text_layers": [
            { "id": 3, "text": "hello", "x": 100.0, "y": 80.0,
              "width": 120.0, "height": 40.0, "fontFamily": "Inter",
              "fontSize": 24.0, "textAlign": "center" }
        ]
    }"#;

    let payload: DesignEditPayload = serde_json::from_str(json).unwrap();
    let front = payload.front_canvas_state.as_ref().unwrap();
    assert_eq!(front.natural_width, 2000.0);
    assert_eq!(front.rotation, 0.0);

    let text = &payload.back_text_layers.as_ref().unwrap()[0];
    assert_eq!(text.font_family.as_deref(), Some("Inter"));
    assert_eq!(text.font_size, Some(24.0));
    // Unsent style fields stay absent and default at restore time.
    assert!(text.color.is_none());
}

// The §-by-§ editing session: upload, place, nudge, save, restore.
#[test]
fn end_to_end_upload_edit_save_restore() {
    // A 2000x1000 upload passes validation untouched.
    let policy = UploadPolicy::strict();
    let request = UploadRequest {
        file_name: "hero.png",
        mime_type: "image/png",
        size_bytes: 4 * 1024 * 1024,
    };
    validate_upload(&request, &policy).unwrap();

    let mut store = InMemoryDesignStore::new();
    let stored = store
        .attach_upload("design-9", SideId::Front, b"raw png bytes")
        .unwrap();

    // Attach onto the 375x225 canvas: fitted to the 325x175 safe area
    // preserving 2:1, centered.
    let mut editor = EditorState::new(
        Some(PrintSize {
            length_in: 3.5,
            width_in: 2.0,
        }),
        Orientation::Horizontal,
    );
    editor.attach_image(
        SideId::Front,
        ImageSourceRef(stored.file_url.clone()),
        2000.0,
        1000.0,
    );
    {
        let image = editor.front.image.as_ref().unwrap();
        assert_eq!((image.width, image.height), (325.0, 162.5));
        assert_eq!((image.x, image.y), (187.5, 112.5));
    }
    assert_eq!(classify_side_image(&editor, SideId::Front), Placement::Safe);

    // Drag it 30px right at 2x zoom: a 60px screen delta.
    let mut gestures = InteractionEngine::new();
    gestures.set_zoom(2.0).unwrap();
    gestures
        .begin_drag(Point::new(400.0, 300.0), &editor)
        .unwrap();
    gestures.pointer_move(Point::new(460.0, 300.0), &mut editor);
    gestures.pointer_up();
    assert_eq!(editor.front.image.as_ref().unwrap().x, 217.5);

    // Back side needs content before the order gate opens.
    assert!(!can_proceed(&editor));
    editor.switch_side(SideId::Back);
    editor.add_text("Thanks for everything", cardproof::TextStyle::default());
    assert!(can_proceed(&editor));

    save_design(&mut store, "design-9", &mut editor).unwrap();
    assert!(!editor.has_unsaved_changes);

    // A fresh session restores the exact geometry.
    let payload = store.load("design-9").unwrap();
    let mut restored = EditorState::new(
        Some(PrintSize {
            length_in: 3.5,
            width_in: 2.0,
        }),
        Orientation::Horizontal,
    );
    load_initial(&mut restored, &payload);

    let orig = editor.front.image.as_ref().unwrap();
    let image = restored.front.image.as_ref().unwrap();
    assert_eq!(
        (image.x, image.y, image.width, image.height, image.rotation),
        (orig.x, orig.y, orig.width, orig.height, orig.rotation)
    );

    let orig_text = &editor.back.texts[0];
    let text = &restored.back.texts[0];
    assert_eq!(text.text, "Thanks for everything");
    assert_eq!(
        (text.x, text.y, text.width, text.height),
        (orig_text.x, orig_text.y, orig_text.width, orig_text.height)
    );

    // Restoration is one-shot; replaying the payload duplicates nothing.
    load_initial(&mut restored, &payload);
    assert_eq!(restored.back.texts.len(), 1);
    assert!(restored.front.image.is_some());
    assert!(!restored.has_unsaved_changes);
}

#[test]
fn rejected_upload_never_touches_layer_state() {
    let mut editor = EditorState::new(None, Orientation::Horizontal);
    let request = UploadRequest {
        file_name: "movie.mp4",
        mime_type: "video/mp4",
        size_bytes: 1024,
    };
    let err = validate_upload(&request, &UploadPolicy::strict()).unwrap_err();
    assert!(err.to_string().contains("validation error"));

    assert!(!editor.front.has_content());
    assert!(!editor.has_unsaved_changes);
    // The editor keeps working after the aborted upload.
    editor.add_text("still here", cardproof::TextStyle::default());
    assert!(editor.front.has_content());
}
