//! Runtime backend selection (spec §4.1).
//!
//! An ordered list of candidates is probed once per process and the
//! supported backend with the highest priority is cached for the
//! lifetime of the process. The scalar backend always qualifies, so
//! selection is total.

use std::sync::OnceLock;

use super::{simd128, simd256};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backend {
    Scalar,
    Simd128,
    Simd256,
}

impl Backend {
    fn priority(self) -> u8 {
        match self {
            Self::Scalar => 0,
            Self::Simd128 => 1,
            Self::Simd256 => 2,
        }
    }

    fn is_supported(self) -> bool {
        match self {
            Self::Scalar => true,
            Self::Simd128 => simd128::is_supported(),
            Self::Simd256 => simd256::is_supported(),
        }
    }
}

const CANDIDATES: &[Backend] = &[Backend::Simd256, Backend::Simd128, Backend::Scalar];

static SELECTED: OnceLock<Backend> = OnceLock::new();

/// Select the highest-priority supported backend, one-shot and cached
/// for the lifetime of the process.
#[must_use]
pub fn selected() -> Backend {
    *SELECTED.get_or_init(|| {
        CANDIDATES
            .iter()
            .copied()
            .filter(|backend| backend.is_supported())
            .max_by_key(|backend| backend.priority())
            .unwrap_or(Backend::Scalar)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_always_supported() {
        assert!(selected().is_supported());
    }

    #[test]
    fn selection_is_cached() {
        assert_eq!(selected(), selected());
    }
}
