//! Process-wide configuration knobs.
//!
//! These mirror the "Configuration knobs" of the external interface: read
//! once, immutable for the lifetime of the process.

/// Default I/O buffer size, in bytes (80 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 80 * 1024;

/// Files at or below this size are processed whole-buffer in memory.
pub const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Files above this size are processed in segmented, memory-mapped style.
pub const VERY_LARGE_FILE_THRESHOLD: u64 = 1024 * 1024 * 1024;

/// Fixed stride of a segment in very-large mode (64 MiB).
pub const SEGMENT_SIZE: u64 = 64 * 1024 * 1024;

/// Chunk size thresholds for large mode, largest first.
///
/// `(file_size_above, chunk_size)`: the first entry whose `file_size_above`
/// the input exceeds wins; otherwise the 256 KiB default applies.
const CHUNK_SIZE_TABLE: &[(u64, usize)] = &[
    (1024 * 1024 * 1024, 4 * 1024 * 1024),
    (100 * 1024 * 1024, 1024 * 1024),
];

/// Default chunk size for large mode when no table entry matches.
const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Pick the large-mode chunk size for a file of the given length.
#[must_use]
pub fn chunk_size_for(file_size: u64) -> usize {
    for &(above, size) in CHUNK_SIZE_TABLE {
        if file_size > above {
            return size;
        }
    }
    DEFAULT_CHUNK_SIZE
}

/// Process-wide, read-once configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    pub buffer_size: usize,
    pub large_file_threshold: u64,
    pub very_large_file_threshold: u64,
    pub segment_size: u64,
    pub max_parallelism: usize,
}

impl Config {
    /// Build the default configuration, probing the host for logical CPU
    /// count.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            large_file_threshold: LARGE_FILE_THRESHOLD,
            very_large_file_threshold: VERY_LARGE_FILE_THRESHOLD,
            segment_size: SEGMENT_SIZE,
            max_parallelism: std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::detect()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Small,
    Large,
    VeryLarge,
}

impl Config {
    /// Dispatch the processing mode for an input of the given size.
    #[must_use]
    pub fn mode_for(&self, file_size: u64) -> Mode {
        if file_size <= self.large_file_threshold {
            Mode::Small
        } else if file_size <= self.very_large_file_threshold {
            Mode::Large
        } else {
            Mode::VeryLarge
        }
    }
}

impl Mode {
    /// Encode as the container header's `mode_tag` byte (spec
    /// §4.5/§3's header invariants, extended so decryption can recover
    /// the encryption mode without re-deriving it from ciphertext size
    /// — the container is always larger than its plaintext, so the two
    /// disagree right at the mode thresholds).
    #[must_use]
    pub fn to_tag(self) -> u8 {
        match self {
            Self::Small => 0,
            Self::Large => 1,
            Self::VeryLarge => 2,
        }
    }

    /// Decode a container header's `mode_tag` byte. Returns `None` for
    /// an unrecognized tag (a corrupt or foreign header).
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Small),
            1 => Some(Self::Large),
            2 => Some(Self::VeryLarge),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_for_boundaries() {
        let config = Config::detect();
        assert_eq!(config.mode_for(0), Mode::Small);
        assert_eq!(config.mode_for(LARGE_FILE_THRESHOLD), Mode::Small);
        assert_eq!(config.mode_for(LARGE_FILE_THRESHOLD + 1), Mode::Large);
        assert_eq!(
            config.mode_for(VERY_LARGE_FILE_THRESHOLD),
            Mode::Large
        );
        assert_eq!(
            config.mode_for(VERY_LARGE_FILE_THRESHOLD + 1),
            Mode::VeryLarge
        );
    }

    #[test]
    fn chunk_size_table() {
        assert_eq!(chunk_size_for(100), DEFAULT_CHUNK_SIZE);
        assert_eq!(chunk_size_for(100 * 1024 * 1024), DEFAULT_CHUNK_SIZE);
        assert_eq!(chunk_size_for(100 * 1024 * 1024 + 1), 1024 * 1024);
        assert_eq!(chunk_size_for(1024 * 1024 * 1024), 1024 * 1024);
        assert_eq!(chunk_size_for(1024 * 1024 * 1024 + 1), 4 * 1024 * 1024);
    }

    #[test]
    fn max_parallelism_at_least_one() {
        assert!(Config::detect().max_parallelism >= 1);
    }

    #[test]
    fn mode_tag_round_trip() {
        for mode in [Mode::Small, Mode::Large, Mode::VeryLarge] {
            assert_eq!(Mode::from_tag(mode.to_tag()), Some(mode));
        }
    }

    #[test]
    fn mode_tag_rejects_unknown_byte() {
        assert_eq!(Mode::from_tag(99), None);
    }
}
