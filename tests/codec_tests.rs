use foveal::codec::{decode, encode, CodecSettings, ResizeFilter, Size};
use foveal::SyntheticSource;
use image::{Rgb, RgbImage};

fn frame(width: u32, height: u32) -> RgbImage {
    SyntheticSource::render(width, height, 3)
}

#[test]
fn test_round_trip_preserves_size() {
    let settings = CodecSettings::default();
    for (width, height) in [(360, 180), (200, 100), (361, 182)] {
        let source = frame(width, height);
        for h in [0.0, 45.0, 179.5, 270.0, 350.0, 359.9, -20.0, 725.0] {
            for v in [0.0, 90.0, 180.0] {
                let compact = encode(&source, h, v, &settings);
                let decoded = decode(&compact);
                assert_eq!(decoded.dimensions(), source.dimensions(), "h={h} v={v}");
            }
        }
    }
}

#[test]
fn test_encoded_frame_is_smaller() {
    let source = frame(720, 360);
    for blur_factor in [2, 3, 4] {
        let settings = CodecSettings {
            blur_factor,
            ..CodecSettings::default()
        };
        let compact = encode(&source, 123.0, 70.0, &settings);
        assert!(
            compact.byte_len() < source.as_raw().len(),
            "blur {blur_factor}: {} >= {}",
            compact.byte_len(),
            source.as_raw().len()
        );
        assert!(compact.ratio(source.as_raw().len()) < 1.0);
    }
}

#[test]
fn test_zero_and_full_turn_encode_identically() {
    let source = frame(360, 180);
    let settings = CodecSettings::default();
    assert_eq!(
        encode(&source, 0.0, 90.0, &settings),
        encode(&source, 360.0, 90.0, &settings)
    );
    assert_eq!(
        encode(&source, -10.0, 90.0, &settings),
        encode(&source, 350.0, 90.0, &settings)
    );
}

#[test]
fn test_wrapped_crop_zero_fill_outside_window() {
    let source = frame(360, 180);
    let compact = encode(&source, 350.0, 90.0, &CodecSettings::default());
    assert!(compact.wraps());
    assert_eq!(compact.left_buffer(), 260);
    assert_eq!(compact.cropped_size(), Size::new(180, 180));

    let decoded = decode(&compact);
    let width = 360;
    let left = compact.left_buffer();
    let cropped_width = compact.cropped_size().width;
    for x in 0..width {
        let inside = (x + width - left) % width < cropped_width;
        for y in [0, 45, 89, 90, 150, 179] {
            let black = decoded.get_pixel(x, y).0 == [0, 0, 0];
            assert_eq!(black, !inside, "column {x} row {y}");
        }
    }
}

#[test]
fn test_crop_ending_at_seam_does_not_wrap() {
    let source = frame(360, 180);
    let compact = encode(&source, 270.0, 90.0, &CodecSettings::default());
    assert_eq!(compact.left_buffer(), 180);
    assert_eq!(compact.cropped_size(), Size::new(180, 180));
    assert!(!compact.wraps());

    let decoded = decode(&compact);
    for y in [0, 60, 120, 179] {
        assert_ne!(decoded.get_pixel(359, y).0, [0, 0, 0], "row {y}");
        assert_ne!(decoded.get_pixel(180, y).0, [0, 0, 0], "row {y}");
        assert_eq!(decoded.get_pixel(179, y).0, [0, 0, 0], "row {y}");
        assert_eq!(decoded.get_pixel(0, y).0, [0, 0, 0], "row {y}");
    }
}

#[test]
fn test_unwrapped_crop_zero_fill_margins() {
    let source = frame(360, 180);
    let compact = encode(&source, 180.0, 90.0, &CodecSettings::default());
    assert!(!compact.wraps());
    let decoded = decode(&compact);
    assert_eq!(decoded.get_pixel(89, 10).0, [0, 0, 0]);
    assert_ne!(decoded.get_pixel(90, 10).0, [0, 0, 0]);
    assert_ne!(decoded.get_pixel(269, 10).0, [0, 0, 0]);
    assert_eq!(decoded.get_pixel(270, 10).0, [0, 0, 0]);
}

#[test]
fn test_focus_across_seam_reconstructed_exactly() {
    let source = frame(360, 180);
    let settings = CodecSettings::default();
    let compact = encode(&source, 0.0, 90.0, &settings);
    // crop [270, 360) ++ [0, 90), focus 30px centered: source columns 345..375 mod 360
    assert_eq!(compact.left_buffer(), 270);
    assert_eq!(compact.focus_col(), 75);

    let decoded = decode(&compact);
    let focus = compact.focus_top().dimensions();
    let half = 90;
    for dy in 0..focus.1 {
        for dx in 0..focus.0 {
            let x = (compact.left_buffer() + compact.focus_col() + dx) % 360;
            let y = compact.focus_row() + dy;
            assert_eq!(decoded.get_pixel(x, y), source.get_pixel(x, y));
            assert_eq!(decoded.get_pixel(x, y + half), source.get_pixel(x, y + half));
        }
    }
}

#[test]
fn test_focus_is_asymmetric_near_pole() {
    let source = frame(360, 180);
    let compact = encode(&source, 90.0, 175.0, &CodecSettings::default());
    // clamped so the 15-row focus window ends at the eye boundary
    assert_eq!(compact.focus_row() + compact.focus_top().height(), 90);
}

#[test]
fn test_filters_only_change_pixels_not_geometry() {
    let source = frame(360, 180);
    for filter in [ResizeFilter::Nearest, ResizeFilter::CatmullRom, ResizeFilter::Lanczos3] {
        let settings = CodecSettings {
            filter,
            ..CodecSettings::default()
        };
        let compact = encode(&source, 10.0, 90.0, &settings);
        let decoded = foveal::codec::decode_with_filter(&compact, filter);
        assert_eq!(decoded.dimensions(), (360, 180));
    }
}

#[test]
fn test_full_size_scenario_wraps() {
    let source = RgbImage::from_pixel(3600, 1800, Rgb([200, 120, 40]));
    let settings = CodecSettings {
        crop_angle: 180.0,
        focus_h_angle: 30.0,
        focus_v_angle: 30.0,
        blur_factor: 3,
        filter: ResizeFilter::Triangle,
    };
    let compact = encode(&source, 350.0, 90.0, &settings);

    assert!(compact.wraps());
    assert_eq!(compact.left_buffer(), 2600);
    assert_eq!(compact.cropped_size(), Size::new(1800, 1800));
    assert_eq!(compact.full_size(), Size::new(3600, 1800));
    assert_eq!(compact.focus_top().dimensions(), (300, 150));
    assert_eq!(compact.focus_col(), 750);
    assert_eq!(compact.focus_row(), 375);
    assert_eq!(compact.blurred().dimensions(), (600, 600));

    let decoded = decode(&compact);
    assert_eq!(decoded.dimensions(), (3600, 1800));
    assert_eq!(decoded.get_pixel(1000, 900).0, [0, 0, 0]);
    assert_ne!(decoded.get_pixel(3599, 900).0, [0, 0, 0]);
    // bottom-eye focus window is carried at full resolution
    assert_eq!(decoded.get_pixel(3400, 1300).0, [200, 120, 40]);
}

#[test]
fn test_narrow_crop_spanning_seam() {
    let source = RgbImage::from_pixel(3600, 1800, Rgb([10, 20, 30]));
    let settings = CodecSettings {
        crop_angle: 60.0,
        ..CodecSettings::default()
    };
    // [3500, 3600) ++ [0, 500)
    let compact = encode(&source, 20.0, 90.0, &settings);
    assert_eq!(compact.left_buffer(), 3500);
    assert_eq!(compact.cropped_size().width, 600);
    assert_eq!(decode(&compact).dimensions(), (3600, 1800));
}
