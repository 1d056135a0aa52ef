//! 256-bit dual-block SIMD ChaCha20 backend (spec §4.2).
//!
//! Two independent ChaCha20 states, differing only in their counter word
//! (`c` and `c + 1`), are interleaved into four 256-bit row-registers:
//! lane `j` of each register holds state word `row * 4 + j` of `S0`, lane
//! `j + 4` the corresponding word of `S1`. Quarter-round arithmetic is
//! identical to the 128-bit backend's shift/xor emulation of the `16,
//! 12, 8, 7` rotations; diagonalization uses a cross-lane permute
//! (`_mm256_permutevar8x32_epi32`) rather than `simd128`'s
//! `_mm256_shuffle_epi32`-equivalent shuffle — each half of the 8-lane
//! permute reproduces exactly the same row rotation the 128-bit backend
//! applies to its single block, so the two backends agree block-for-
//! block. Grounded on the AVX2 "goll_gueron" interleaving in
//! `RustCrypto/stream-ciphers` chacha20 `backend/avx2.rs` (two-block
//! slice of its four-block layout).

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn add_xor_rot(a: &mut __m256i, b: &mut __m256i, c: &mut __m256i, d: &mut __m256i) {
    unsafe {
        *a = _mm256_add_epi32(*a, *b);
        *d = _mm256_xor_si256(*d, *a);
        *d = _mm256_xor_si256(_mm256_slli_epi32(*d, 16), _mm256_srli_epi32(*d, 16));

        *c = _mm256_add_epi32(*c, *d);
        *b = _mm256_xor_si256(*b, *c);
        *b = _mm256_xor_si256(_mm256_slli_epi32(*b, 12), _mm256_srli_epi32(*b, 20));

        *a = _mm256_add_epi32(*a, *b);
        *d = _mm256_xor_si256(*d, *a);
        *d = _mm256_xor_si256(_mm256_slli_epi32(*d, 8), _mm256_srli_epi32(*d, 24));

        *c = _mm256_add_epi32(*c, *d);
        *b = _mm256_xor_si256(*b, *c);
        *b = _mm256_xor_si256(_mm256_slli_epi32(*b, 7), _mm256_srli_epi32(*b, 25));
    }
}

// Permute indices: within each 128-bit half (lanes 0..3 and 4..7) these
// reproduce `simd128::rows_to_cols`'s per-row rotation (`c` by 1 word,
// `d` by 2, `a` by 3), applied independently to both interleaved blocks.
#[cfg(target_arch = "x86_64")]
const ROTATE_BY_1: [i32; 8] = [1, 2, 3, 0, 5, 6, 7, 4];
#[cfg(target_arch = "x86_64")]
const ROTATE_BY_2: [i32; 8] = [2, 3, 0, 1, 6, 7, 4, 5];
#[cfg(target_arch = "x86_64")]
const ROTATE_BY_3: [i32; 8] = [3, 0, 1, 2, 7, 4, 5, 6];

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn rows_to_cols(a: &mut __m256i, c: &mut __m256i, d: &mut __m256i) {
    unsafe {
        *c = _mm256_permutevar8x32_epi32(*c, _mm256_loadu_si256(ROTATE_BY_1.as_ptr().cast()));
        *d = _mm256_permutevar8x32_epi32(*d, _mm256_loadu_si256(ROTATE_BY_2.as_ptr().cast()));
        *a = _mm256_permutevar8x32_epi32(*a, _mm256_loadu_si256(ROTATE_BY_3.as_ptr().cast()));
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn cols_to_rows(a: &mut __m256i, c: &mut __m256i, d: &mut __m256i) {
    unsafe {
        *c = _mm256_permutevar8x32_epi32(*c, _mm256_loadu_si256(ROTATE_BY_3.as_ptr().cast()));
        *d = _mm256_permutevar8x32_epi32(*d, _mm256_loadu_si256(ROTATE_BY_2.as_ptr().cast()));
        *a = _mm256_permutevar8x32_epi32(*a, _mm256_loadu_si256(ROTATE_BY_1.as_ptr().cast()));
    }
}

/// Interleave two 16-word states into four 256-bit row-registers.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn interleave(s0: &[u32; 16], s1: &[u32; 16]) -> [__m256i; 4] {
    unsafe {
        let mut rows = [_mm256_setzero_si256(); 4];
        for (row, slot) in rows.iter_mut().enumerate() {
            let mut words = [0u32; 8];
            words[0..4].copy_from_slice(&s0[row * 4..row * 4 + 4]);
            words[4..8].copy_from_slice(&s1[row * 4..row * 4 + 4]);
            *slot = _mm256_loadu_si256(words.as_ptr().cast());
        }
        rows
    }
}

/// Produce two 64-byte keystream blocks at once from two states that
/// differ only in their counter word.
///
/// # Safety
///
/// Caller must have verified [`is_supported`] (`avx2` is available).
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
pub unsafe fn dual_block(s0: &[u32; 16], s1: &[u32; 16]) -> ([u8; 64], [u8; 64]) {
    unsafe {
        let original = interleave(s0, s1);
        let [mut a, mut b, mut c, mut d] = original;

        for _ in 0..10 {
            add_xor_rot(&mut a, &mut b, &mut c, &mut d);
            rows_to_cols(&mut a, &mut c, &mut d);
            add_xor_rot(&mut a, &mut b, &mut c, &mut d);
            cols_to_rows(&mut a, &mut c, &mut d);
        }

        a = _mm256_add_epi32(a, original[0]);
        b = _mm256_add_epi32(b, original[1]);
        c = _mm256_add_epi32(c, original[2]);
        d = _mm256_add_epi32(d, original[3]);

        let mut words = [0u32; 32];
        let ptr = words.as_mut_ptr().cast::<__m256i>();
        _mm256_storeu_si256(ptr, a);
        _mm256_storeu_si256(ptr.add(1), b);
        _mm256_storeu_si256(ptr.add(2), c);
        _mm256_storeu_si256(ptr.add(3), d);

        // De-interleave: lanes 0..3 of each register compose block 0 in
        // row-major order, lanes 4..7 compose block 1.
        let mut block0 = [0u8; 64];
        let mut block1 = [0u8; 64];
        for row in 0..4 {
            for lane in 0..4 {
                let w0 = words[row * 8 + lane];
                let w1 = words[row * 8 + 4 + lane];
                let idx = row * 4 + lane;
                block0[idx * 4..idx * 4 + 4].copy_from_slice(&w0.to_le_bytes());
                block1[idx * 4..idx * 4 + 4].copy_from_slice(&w1.to_le_bytes());
            }
        }

        (block0, block1)
    }
}

#[cfg(target_arch = "x86_64")]
#[must_use]
pub fn is_supported() -> bool {
    is_x86_feature_detected!("avx2")
}

#[cfg(not(target_arch = "x86_64"))]
#[must_use]
pub fn is_supported() -> bool {
    false
}
