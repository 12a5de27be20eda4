//! Property tests for the framer and pixel transform.
//!
//! Runs on host only, mirroring the crate's other host-side test
//! tooling — there is no embedded target to exclude here, but the
//! file is kept separate from the unit tests so proptest stays a
//! dev-only, host-only dependency.

use opc_bridge::config::PixelFormat;
use opc_bridge::opc::framer::Framer;
use opc_bridge::pixel;
use proptest::prelude::*;

fn arb_pixel_format() -> impl Strategy<Value = PixelFormat> {
    prop_oneof![
        Just(PixelFormat::Passthrough),
        Just(PixelFormat::Rgb),
        Just(PixelFormat::Grb),
        Just(PixelFormat::Bgr),
        Just(PixelFormat::Rgbw),
        Just(PixelFormat::Grbw),
    ]
}

proptest! {
    /// Every transform preserves pixel count; 3-byte formats preserve
    /// byte length exactly, 4-byte formats grow by exactly one byte
    /// per pixel.
    #[test]
    fn transform_preserves_pixel_count(
        format in arb_pixel_format(),
        pixel_count in 0usize..64,
        seed in proptest::collection::vec(0u8..=255u8, 0..192),
    ) {
        let rgb: Vec<u8> = (0..pixel_count * 3).map(|i| seed.get(i % seed.len().max(1)).copied().unwrap_or(0)).collect();
        let out = pixel::transform(format, rgb);

        let expected_len = pixel_count * format.stride();
        prop_assert_eq!(out.len(), expected_len);
    }

    /// RGBW/GRBW's derived white channel is never brighter than the
    /// dimmest of the three source channels, for any input.
    #[test]
    fn derived_white_channel_is_bounded_by_dimmest_source_channel(
        r in 0u8..=255u8, g in 0u8..=255u8, b in 0u8..=255u8,
    ) {
        let out = pixel::transform(PixelFormat::Rgbw, vec![r, g, b]);
        let w = out[3];
        prop_assert!(w <= r && w <= g && w <= b);
    }

    /// Feeding an arbitrary byte stream to the framer never panics,
    /// and any message it does extract has a payload length matching
    /// the length field that produced it.
    #[test]
    fn framer_never_panics_on_arbitrary_bytes(
        bytes in proptest::collection::vec(0u8..=255u8, 0..512),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let mut cursor = std::io::Cursor::new(bytes);
            let mut framer = Framer::new();
            // Draining to completion (Ok or Err) must never panic.
            loop {
                match framer.next_message(&mut cursor).await {
                    Ok(Some(_)) => continue,
                    Ok(None) | Err(_) => break,
                }
            }
        });
    }
}
