// Layout tests
// Destination rectangles on an 800x480 display, through the surface API

mod common;

use common::*;
use fblayer::{compute_dest_rect, Alignment, EdgePadding, LayoutParams, Rect};

fn dest(params: &LayoutParams) -> Rect {
    compute_dest_rect(params, DISPLAY_WIDTH as i32, DISPLAY_HEIGHT as i32)
}

#[test]
fn test_positive_aspect_fits_height() {
    // Width derives from the full height: round(480 * 1.6) = 768
    let rect = dest(&LayoutParams::new().with_aspect(1.6));
    assert_eq!((rect.width, rect.height), (768, 480));
}

#[test]
fn test_negative_aspect_fits_width() {
    // Height derives from the full width: min(480, round(800 / 1.6) = 500)
    let rect = dest(&LayoutParams::new().with_aspect(-1.6));
    assert_eq!((rect.width, rect.height), (800, 480));
}

#[test]
fn test_negative_aspect_letterboxes_wide_images() {
    let rect = dest(&LayoutParams::new().with_aspect(-16.0 / 9.0));
    assert_eq!((rect.width, rect.height), (800, 450));
    assert_eq!(rect.y, 15);
}

#[test]
fn test_horizontal_alignment_offsets() {
    let params = LayoutParams::new().with_aspect(1.25);
    let width = 600;

    let start = dest(&params.with_h_align(Alignment::Start, 0));
    let center = dest(&params.with_h_align(Alignment::Center, 0));
    let end = dest(&params.with_h_align(Alignment::End, 0));

    assert_eq!(start.width, width);
    assert_eq!(start.x, 0);
    assert_eq!(center.x, (800 - width) / 2);
    assert_eq!(end.x, 800 - width);
}

#[test]
fn test_vertical_alignment_offsets() {
    let params = LayoutParams::new().with_aspect(-2.0);
    let height = 400;

    let start = dest(&params.with_v_align(Alignment::Start, 0));
    let center = dest(&params.with_v_align(Alignment::Center, 0));
    let end = dest(&params.with_v_align(Alignment::End, 0));

    assert_eq!(start.height, height);
    assert_eq!(start.y, 0);
    assert_eq!(center.y, (480 - height) / 2);
    assert_eq!(end.y, 480 - height);
}

#[test]
fn test_raw_alignment_values() {
    assert_eq!(Alignment::from_raw(-1), Alignment::Start);
    assert_eq!(Alignment::from_raw(0), Alignment::Center);
    assert_eq!(Alignment::from_raw(1), Alignment::End);
}

#[test]
fn test_surface_show_uses_layout() {
    let (_compositor, mut surface) = allocated(320, 200);
    surface.set_aspect(1.25);
    surface.set_horizontal_alignment(Alignment::End, 10);
    surface.set_vertical_alignment(Alignment::Start, 0);
    surface.show().expect("show");

    assert_eq!(surface.dest_rect(), Rect::new(800 - 600 - 10, 0, 600, 480));

    let dims = surface.dimensions();
    assert_eq!((dims.display_width, dims.display_height), (800, 480));
    assert_eq!((dims.src_width, dims.src_height), (320, 200));
    assert_eq!((dims.dest_width, dims.dest_height), (600, 480));
}

#[test]
fn test_surface_edge_padding_reserves_margins() {
    let (_compositor, mut surface) = allocated(320, 200);
    surface.set_aspect(-1.6);
    surface.set_edge_padding(EdgePadding {
        left: 0.1,
        right: 0.1,
        top: 0.0,
        bottom: 0.0,
    });
    surface.show().expect("show");

    // 640 wide, round(640 / 1.6) = 400 high, centered in the remaining area
    assert_eq!(surface.dest_rect(), Rect::new(80, 40, 640, 400));
}

#[test]
#[should_panic(expected = "aspect ratio must be finite and non-zero")]
fn test_infinite_aspect_is_rejected() {
    let (_compositor, mut surface) = allocated(32, 32);
    surface.set_aspect(f64::INFINITY);
}
