//! End-to-end workflows through the image tools
//!
//! Crop a reference, key out a design, place it on a body photo and flatten.

use image::{DynamicImage, Rgba, RgbaImage};
use inkflow_studio::{
    decode::decode_now, CompositorState, Cropper, ImageAsset, ImageIOService, OutputFormat,
    PlacementCompositor, PlacementConfig, Point, PointerButton, PointerGesture, Rect, Size,
    StudioError, ToolOutcome,
};
use tokio_util::sync::CancellationToken;

const SKIN: Rgba<u8> = Rgba([200, 100, 50, 255]);

fn solid(width: u32, height: u32, colour: Rgba<u8>) -> ImageAsset {
    ImageIOService::encode_png(RgbaImage::from_pixel(width, height, colour)).unwrap()
}

fn decode(asset: &ImageAsset) -> RgbaImage {
    decode_now(asset).unwrap().to_rgba8()
}

fn assert_close(actual: Rgba<u8>, expected: [u8; 3], tolerance: u8) {
    for channel in 0..3 {
        let diff = actual[channel].abs_diff(expected[channel]);
        assert!(
            diff <= tolerance,
            "channel {} is {}, expected {} (+/- {})",
            channel,
            actual[channel],
            expected[channel],
            tolerance
        );
    }
}

#[tokio::test]
async fn test_rotated_placement_flattens_at_native_resolution() {
    let body = solid(1000, 1000, SKIN);
    let design = solid(500, 500, Rgba([128, 128, 128, 255]));

    let mut compositor = PlacementCompositor::new(
        body,
        design,
        Size::new(500.0, 500.0),
        PlacementConfig::default(),
    )
    .unwrap();
    compositor.prepare().await.unwrap();

    let transform = compositor
        .transform()
        .with_position(Point::new(100.0, 100.0))
        .with_scale(1.5)
        .with_rotation(45.0)
        .with_opacity(0.85);
    assert!(compositor.set_transform(transform));

    let outcome = compositor.confirm().await.unwrap();
    let ToolOutcome::Completed(asset) = outcome else {
        panic!("expected a composite, got {:?}", outcome);
    };
    let composite = decode(&asset);
    assert_eq!(composite.dimensions(), (1000, 1000));

    // Multiply by 128/255 at 85% ink over opaque skin
    let inked = [115, 58, 29];
    assert_close(*composite.get_pixel(500, 500), inked, 2);
    // Inside the rotated square near its bottom corner
    assert_close(*composite.get_pixel(500, 900), inked, 2);
    // Outside the rotated square, inside its unrotated bounds
    assert_eq!(*composite.get_pixel(790, 790), SKIN);
    assert_eq!(*composite.get_pixel(5, 5), SKIN);
}

#[tokio::test]
async fn test_keyed_white_background_leaves_skin_untouched() {
    let mut design = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
    for y in 40..60 {
        for x in 40..60 {
            design.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    let design = ImageIOService::encode_png(design).unwrap();

    let mut compositor = PlacementCompositor::new(
        solid(400, 400, SKIN),
        design,
        Size::new(400.0, 400.0),
        PlacementConfig::default(),
    )
    .unwrap();
    compositor.prepare().await.unwrap();
    assert!(compositor.set_opacity(1.0));

    let composite = decode(&compositor.confirm().await.unwrap().into_asset().unwrap());

    // Default placement: 200px wide, centred, so the black square sits at the centre
    assert_eq!(*composite.get_pixel(200, 200), Rgba([0, 0, 0, 255]));
    // Keyed-out white around it must not tint the skin
    assert_eq!(*composite.get_pixel(120, 120), SKIN);
    assert_eq!(*composite.get_pixel(280, 200), SKIN);
}

#[tokio::test]
async fn test_drag_moves_overlay_centre_under_pointer() {
    let mut compositor = PlacementCompositor::new(
        solid(400, 400, SKIN),
        solid(50, 50, Rgba([0, 0, 0, 255])),
        Size::new(400.0, 400.0),
        PlacementConfig::default(),
    )
    .unwrap();

    let drag = PointerGesture::MouseMove {
        position: Point::new(300.0, 300.0),
        buttons: 1,
    };
    // Gestures are ignored until the design is ready
    assert!(!compositor.handle_pointer(&drag));

    compositor.prepare().await.unwrap();
    assert!(compositor.handle_pointer(&drag));
    assert_eq!(
        compositor.overlay_bounds().unwrap(),
        Rect::new(200.0, 200.0, 200.0, 200.0)
    );

    let two_fingers = PointerGesture::TouchMove {
        touches: vec![Point::new(10.0, 10.0), Point::new(20.0, 20.0)],
    };
    assert!(!compositor.handle_pointer(&two_fingers));
}

#[tokio::test]
async fn test_cancelled_preparation_stays_processing() {
    let mut compositor = PlacementCompositor::new(
        solid(64, 64, SKIN),
        solid(32, 32, Rgba([0, 0, 0, 255])),
        Size::new(64.0, 64.0),
        PlacementConfig::default(),
    )
    .unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err = compositor.prepare_cancellable(&token).await.unwrap_err();
    assert!(matches!(err, StudioError::Cancelled(_)));
    assert!(matches!(compositor.state(), CompositorState::Processing));

    let err = compositor.confirm().await.unwrap_err();
    assert!(matches!(err.error(), StudioError::NotReady(_)));

    // The refused session comes back intact and can still finish
    let mut compositor = err.into_compositor().unwrap();
    compositor.prepare().await.unwrap();
    assert!(compositor.confirm().await.unwrap().is_completed());
}

#[tokio::test]
async fn test_undecodable_body_photo_reports_decode_failure() {
    let broken = ImageAsset::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0x00, 0x01]);
    let mut compositor = PlacementCompositor::new(
        broken,
        solid(32, 32, Rgba([0, 0, 0, 255])),
        Size::new(64.0, 64.0),
        PlacementConfig::default(),
    )
    .unwrap();
    compositor.prepare().await.unwrap();

    let outcome = compositor.confirm().await.unwrap();
    assert!(matches!(outcome, ToolOutcome::DecodeFailed { .. }));
    assert!(outcome.fallback_message().is_some());
}

#[tokio::test]
async fn test_crop_then_place_workflow() {
    // 800x600 photo with a red block in the top-left quarter
    let mut photo = RgbaImage::from_pixel(800, 600, Rgba([255, 255, 255, 255]));
    for y in 0..300 {
        for x in 0..400 {
            photo.put_pixel(x, y, Rgba([255, 0, 0, 255]));
        }
    }
    let photo =
        ImageIOService::encode_image(&DynamicImage::ImageRgba8(photo), OutputFormat::Png, 100)
            .unwrap();

    // Displayed at half size; drag out the top-left quarter
    let mut cropper = Cropper::new(photo, Size::new(400.0, 300.0)).unwrap();
    assert!(cropper.pointer_down(Point::new(0.0, 0.0), PointerButton::Primary));
    assert!(cropper.pointer_move(Point::new(200.0, 150.0)));
    cropper.pointer_up();
    assert_eq!(cropper.dimension_label(), "200 x 150");

    let cropped = cropper.confirm().await.unwrap().into_asset().unwrap();
    let pixels = decode(&cropped);
    assert_eq!(pixels.dimensions(), (400, 300));
    assert!(pixels.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));

    // The crop becomes the design on a body photo
    let mut compositor = PlacementCompositor::new(
        solid(400, 400, SKIN),
        cropped,
        Size::new(400.0, 400.0),
        PlacementConfig::default(),
    )
    .unwrap();
    compositor.prepare().await.unwrap();
    let bounds = compositor.overlay_bounds().unwrap();
    assert!((bounds.height - 150.0).abs() < 1e-9);
    assert!(compositor.confirm().await.unwrap().is_completed());
}
