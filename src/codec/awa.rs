//! AWA (HyperSerial) frame encoding.
//!
//! Same 6-byte header as AdaLight (`Awa` magic instead of `Ada`), but
//! followed by a 3-byte Fletcher-style trailer over the pixel payload:
//! two 8-bit running accumulators plus one `0x00` framing byte. This
//! must match HyperSerialPico byte-for-byte — there is no ACK to
//! catch a mismatch, so a wrong trailer silently corrupts every frame.

use super::write_header;

/// Encode one AWA frame for `led_count` pixels, wrapping `pixels`
/// (already transformed to the output's wire stride) and appending the
/// Fletcher trailer.
pub fn encode(led_count: usize, pixels: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(6 + pixels.len() + 3);
    write_header(&mut out, *b"Awa", led_count);
    out.extend_from_slice(pixels);
    let (a, c) = fletcher(pixels);
    out.push(a);
    out.push(c);
    out.push(0x00);
    out
}

/// Two 8-bit running accumulators over `data`: `a += byte mod 255`,
/// `c += a mod 255`, both starting at zero.
fn fletcher(data: &[u8]) -> (u8, u8) {
    let mut a: u32 = 0;
    let mut c: u32 = 0;
    for &byte in data {
        a = (a + u32::from(byte)) % 255;
        c = (c + a) % 255;
    }
    (a as u8, c as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_pixel_passthrough_example() {
        // Single AWA output, 2 LEDs, passthrough.
        let pixels = [0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00];
        let frame = encode(2, &pixels);

        assert_eq!(&frame[0..3], b"Awa");
        assert_eq!(&frame[3..5], &[0x00, 0x01]); // N-1 = 1
        assert_eq!(frame[5], frame[3] ^ frame[4] ^ 0x55);
        assert_eq!(&frame[6..12], &pixels);

        let (a, c) = fletcher(&pixels);
        assert_eq!(&frame[12..15], &[a, c, 0x00]);
    }

    #[test]
    fn trailer_is_three_bytes() {
        let pixels = [1u8, 2, 3];
        let frame = encode(1, &pixels);
        assert_eq!(frame.len(), 6 + pixels.len() + 3);
        assert_eq!(*frame.last().unwrap(), 0x00);
    }

    #[test]
    fn fletcher_is_deterministic_and_order_sensitive() {
        let (a1, c1) = fletcher(&[1, 2, 3]);
        let (a2, c2) = fletcher(&[3, 2, 1]);
        assert_ne!((a1, c1), (a2, c2));
    }

    #[test]
    fn fletcher_of_empty_payload_is_zero() {
        assert_eq!(fletcher(&[]), (0, 0));
    }
}
