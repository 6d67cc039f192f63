// Matcher profiles for the delta builder.
//
// Index granularity and the candidate limit change which matches are found
// (and so the delta size) but never the reconstructed output.

/// Width of the content-addressed window and of an indexed source block.
pub const BLOCK_SIZE: usize = 16;

/// Candidates examined per target window before giving up.
pub const DEFAULT_MAX_CANDIDATES: usize = 250;

/// Which source offsets are entered into the block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexGranularity {
    /// Every `BLOCK_SIZE`-aligned block that lies entirely inside the source.
    #[default]
    Aligned,
    /// Every byte offset with a full block after it.
    EveryOffset,
}

impl IndexGranularity {
    /// Distance between consecutive indexed offsets.
    pub fn step(self) -> usize {
        match self {
            IndexGranularity::Aligned => BLOCK_SIZE,
            IndexGranularity::EveryOffset => 1,
        }
    }
}

/// Matcher profile configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Name for display purposes.
    pub name: &'static str,
    /// Source indexing policy.
    pub granularity: IndexGranularity,
    /// Maximum index candidates examined per target window.
    pub max_candidates: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        DEFAULT
    }
}

/// Compression levels mapping to profiles.
///
/// - Levels 0-5: default (aligned blocks)
/// - Levels 6-9: thorough (every offset)
pub fn config_for_level(level: u32) -> MatcherConfig {
    match level {
        0..=5 => DEFAULT,
        _ => THOROUGH,
    }
}

pub const DEFAULT: MatcherConfig = MatcherConfig {
    name: "default",
    granularity: IndexGranularity::Aligned,
    max_candidates: DEFAULT_MAX_CANDIDATES,
};

pub const THOROUGH: MatcherConfig = MatcherConfig {
    name: "thorough",
    granularity: IndexGranularity::EveryOffset,
    max_candidates: DEFAULT_MAX_CANDIDATES,
};
