//! RGB565 → RGB888 conversion.
//!
//! The screenshot buffer holds 16-bit little-endian words (5 bits red,
//! 6 green, 5 blue). Downstream encoders want packed 24-bit RGB, so every
//! captured frame is widened here before delivery.
//!
//! Each channel is widened by a plain left shift, not a linear rescale:
//!
//! ```text
//! R = (p >> 11)         << 3     0x1f → 248
//! G = ((p >> 5) & 0x3f) << 2     0x3f → 252
//! B = (p & 0x1f)        << 3     0x1f → 248
//! ```
//!
//! Consumers compare output byte for byte, so these exact shifts are part of
//! the contract.
//!
//! Pixels are processed eight at a time. On aarch64 with NEON the step is the
//! intrinsic sequence `vld1q_u16 → vshrq_n_u8 → vshrn_n_u16 → vshl_n_u8 →
//! vshlq_n_u16 → vmovn_u16 → vst3_u8`; elsewhere a fixed 8-lane loop that the
//! compiler vectorises. A trailing group of fewer than eight pixels goes
//! through the scalar path with the same shifts.
//!
//! Only one step is compiled per target, so the NEON path is exercised by
//! these tests only when they run on an aarch64 host or runner; x86 builds
//! cover the portable step.

/// Pixels per vector step.
pub const LANES: usize = 8;

const SRC_STEP: usize = LANES * 2;
const DST_STEP: usize = LANES * 3;

/// Convert RGB565 pixels in `src` to packed RGB888 in `dst`.
///
/// Converts `min(src.len() / 2, dst.len() / 3)` pixels and returns that
/// count. An odd trailing source byte is ignored.
pub fn rgb565_to_rgb888(src: &[u8], dst: &mut [u8]) -> usize {
    let pixels = (src.len() / 2).min(dst.len() / 3);
    let vector_pixels = pixels - pixels % LANES;

    let (src_vec, src_tail) = src[..pixels * 2].split_at(vector_pixels * 2);
    let (dst_vec, dst_tail) = dst[..pixels * 3].split_at_mut(vector_pixels * 3);

    for (s, d) in src_vec.chunks_exact(SRC_STEP).zip(dst_vec.chunks_exact_mut(DST_STEP)) {
        convert_step(s, d);
    }
    for (s, d) in src_tail.chunks_exact(2).zip(dst_tail.chunks_exact_mut(3)) {
        d.copy_from_slice(&widen(u16::from_le_bytes([s[0], s[1]])));
    }

    pixels
}

/// One pixel, scalar.
#[inline]
pub fn widen(p: u16) -> [u8; 3] {
    [
        ((p >> 11) << 3) as u8,
        (((p >> 5) & 0x3f) << 2) as u8,
        ((p & 0x1f) << 3) as u8,
    ]
}

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
#[inline]
fn convert_step(src: &[u8], dst: &mut [u8]) {
    use std::arch::aarch64::*;

    debug_assert!(src.len() >= SRC_STEP && dst.len() >= DST_STEP);
    // SAFETY: both slices hold a full step (chunks_exact), NEON is enabled
    // for this target, and ld1/st3 accept unaligned addresses.
    unsafe {
        let input = vld1q_u16(src.as_ptr() as *const u16);
        // Red: drop the low three bits of every byte, then the high byte of
        // each lane lands in the narrowed result as R << 3.
        let tmp = vreinterpretq_u16_u8(vshrq_n_u8::<3>(vreinterpretq_u8_u16(input)));
        let r = vshrn_n_u16::<5>(tmp);
        let g = vshl_n_u8::<2>(vshrn_n_u16::<5>(input));
        let b = vmovn_u16(vshlq_n_u16::<3>(input));
        vst3_u8(dst.as_mut_ptr(), uint8x8x3_t(r, g, b));
    }
}

#[cfg(not(all(target_arch = "aarch64", target_feature = "neon")))]
#[inline]
fn convert_step(src: &[u8], dst: &mut [u8]) {
    let mut lanes = [0u16; LANES];
    for (lane, bytes) in lanes.iter_mut().zip(src.chunks_exact(2)) {
        *lane = u16::from_le_bytes([bytes[0], bytes[1]]);
    }

    let mut r = [0u8; LANES];
    let mut g = [0u8; LANES];
    let mut b = [0u8; LANES];
    for (((&p, red), green), blue) in lanes.iter().zip(&mut r).zip(&mut g).zip(&mut b) {
        *red = ((p >> 11) << 3) as u8;
        *green = ((p >> 5) as u8) << 2;
        *blue = (p << 3) as u8;
    }

    // Interleave, like st3.
    for (((px, red), green), blue) in dst[..DST_STEP].chunks_exact_mut(3).zip(r).zip(g).zip(b) {
        px.copy_from_slice(&[red, green, blue]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(pixels: &[u16]) -> Vec<u8> {
        pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }

    fn convert(pixels: &[u16]) -> Vec<u8> {
        let src = pack(pixels);
        let mut dst = vec![0u8; pixels.len() * 3];
        let n = rgb565_to_rgb888(&src, &mut dst);
        assert_eq!(n, pixels.len());
        dst
    }

    #[test]
    fn golden_primaries() {
        let out = convert(&[0xF800, 0x07E0, 0x001F, 0xFFFF, 0x0000, 0x8410, 0x0821, 0x1234]);
        assert_eq!(&out[0..3], &[248, 0, 0]);
        assert_eq!(&out[3..6], &[0, 252, 0]);
        assert_eq!(&out[6..9], &[0, 0, 248]);
        assert_eq!(&out[9..12], &[248, 252, 248]);
        assert_eq!(&out[12..15], &[0, 0, 0]);
        // 0x8410 = R 16, G 32, B 16
        assert_eq!(&out[15..18], &[128, 128, 128]);
        // 0x0821 = R 1, G 1, B 1
        assert_eq!(&out[18..21], &[8, 4, 8]);
        assert_eq!(&out[21..24], &widen(0x1234));
    }

    #[test]
    fn output_is_three_bytes_per_pixel() {
        let pixels: Vec<u16> = (0..64u16).map(|i| i.wrapping_mul(0x0F3D)).collect();
        let src = pack(&pixels);
        let mut dst = vec![0u8; 64 * 3 + 7];
        assert_eq!(rgb565_to_rgb888(&src, &mut dst), 64);
        assert!(dst[64 * 3..].iter().all(|&b| b == 0), "wrote past the converted pixels");
    }

    #[test]
    fn vector_path_matches_scalar() {
        let pixels: Vec<u16> = (0..=u16::MAX).step_by(7).collect();
        let out = convert(&pixels);
        for (i, p) in pixels.iter().enumerate() {
            assert_eq!(&out[i * 3..i * 3 + 3], &widen(*p), "pixel {:#06x}", p);
        }
    }

    #[test]
    fn deterministic() {
        let pixels: Vec<u16> = (0..256u16).map(|i| i.wrapping_mul(0x9E37)).collect();
        assert_eq!(convert(&pixels), convert(&pixels));
    }

    #[test]
    fn tail_shorter_than_a_step() {
        // 11 pixels: one vector step + three scalar pixels.
        let pixels = [0xFFFFu16; 11];
        let out = convert(&pixels);
        assert!(out.chunks(3).all(|px| px == [248, 252, 248]));
    }

    #[test]
    fn short_destination_limits_count() {
        let src = pack(&[0xF800; 16]);
        let mut dst = vec![0u8; 10 * 3 + 2];
        assert_eq!(rgb565_to_rgb888(&src, &mut dst), 10);
        assert_eq!(&dst[27..30], &[248, 0, 0]);
        assert_eq!(&dst[30..], &[0, 0]);
    }

    #[test]
    fn odd_trailing_byte_is_ignored() {
        let mut src = pack(&[0x001F; 8]);
        src.push(0xAB);
        let mut dst = vec![0u8; 27];
        assert_eq!(rgb565_to_rgb888(&src, &mut dst), 8);
        assert_eq!(&dst[24..], &[0, 0, 0]);
    }
}
