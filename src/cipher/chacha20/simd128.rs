//! 128-bit (single-block) SIMD ChaCha20 backend.
//!
//! Grounded on `RustCrypto/stream-ciphers` chacha20 `backends/sse2.rs`:
//! the same add-xor-rotate quarter round and shuffle-based
//! diagonalization (`rows_to_cols`/`cols_to_rows`, rotating `a`, `c`, `d`
//! and leaving `b` untouched to shorten the dependency chain), narrowed
//! from that file's 4-parallel-block layout down to the single block
//! this backend processes — the 2-block interleaving lives in
//! [`super::simd256`].

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn add_xor_rot(a: &mut __m128i, b: &mut __m128i, c: &mut __m128i, d: &mut __m128i) {
    unsafe {
        *a = _mm_add_epi32(*a, *b);
        *d = _mm_xor_si128(*d, *a);
        *d = _mm_xor_si128(_mm_slli_epi32(*d, 16), _mm_srli_epi32(*d, 16));

        *c = _mm_add_epi32(*c, *d);
        *b = _mm_xor_si128(*b, *c);
        *b = _mm_xor_si128(_mm_slli_epi32(*b, 12), _mm_srli_epi32(*b, 20));

        *a = _mm_add_epi32(*a, *b);
        *d = _mm_xor_si128(*d, *a);
        *d = _mm_xor_si128(_mm_slli_epi32(*d, 8), _mm_srli_epi32(*d, 24));

        *c = _mm_add_epi32(*c, *d);
        *b = _mm_xor_si128(*b, *c);
        *b = _mm_xor_si128(_mm_slli_epi32(*b, 7), _mm_srli_epi32(*b, 25));
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn rows_to_cols(a: &mut __m128i, c: &mut __m128i, d: &mut __m128i) {
    unsafe {
        *c = _mm_shuffle_epi32(*c, 0b_00_11_10_01); // [c1, c2, c3, c0]
        *d = _mm_shuffle_epi32(*d, 0b_01_00_11_10); // [d2, d3, d0, d1]
        *a = _mm_shuffle_epi32(*a, 0b_10_01_00_11); // [a3, a0, a1, a2]
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn cols_to_rows(a: &mut __m128i, c: &mut __m128i, d: &mut __m128i) {
    unsafe {
        *c = _mm_shuffle_epi32(*c, 0b_10_01_00_11);
        *d = _mm_shuffle_epi32(*d, 0b_01_00_11_10);
        *a = _mm_shuffle_epi32(*a, 0b_00_11_10_01);
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn rounds(state: &[u32; 16]) -> [u32; 16] {
    unsafe {
        let ptr = state.as_ptr().cast::<__m128i>();
        let mut a = _mm_loadu_si128(ptr);
        let mut b = _mm_loadu_si128(ptr.add(1));
        let mut c = _mm_loadu_si128(ptr.add(2));
        let mut d = _mm_loadu_si128(ptr.add(3));

        for _ in 0..10 {
            add_xor_rot(&mut a, &mut b, &mut c, &mut d);
            rows_to_cols(&mut a, &mut c, &mut d);
            add_xor_rot(&mut a, &mut b, &mut c, &mut d);
            cols_to_rows(&mut a, &mut c, &mut d);
        }

        let mut out = [0u32; 16];
        let out_ptr = out.as_mut_ptr().cast::<__m128i>();
        _mm_storeu_si128(out_ptr, a);
        _mm_storeu_si128(out_ptr.add(1), b);
        _mm_storeu_si128(out_ptr.add(2), c);
        _mm_storeu_si128(out_ptr.add(3), d);
        out
    }
}

/// Produce one 64-byte keystream block using the 128-bit backend.
///
/// # Safety
///
/// Caller must have verified [`is_supported`] (`sse2` is available).
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
pub unsafe fn block(initial: &[u32; 16]) -> [u8; 64] {
    let worked = unsafe { rounds(initial) };
    let mut out = [0u8; 64];
    for (i, (word, orig)) in worked.iter().zip(initial.iter()).enumerate() {
        let added = word.wrapping_add(*orig);
        out[i * 4..i * 4 + 4].copy_from_slice(&added.to_le_bytes());
    }
    out
}

#[cfg(target_arch = "x86_64")]
#[must_use]
pub fn is_supported() -> bool {
    is_x86_feature_detected!("sse2")
}

#[cfg(not(target_arch = "x86_64"))]
#[must_use]
pub fn is_supported() -> bool {
    false
}
