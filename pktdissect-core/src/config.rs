//! Per-run dissection settings.
//!
//! A [`DissectConfig`] is built once by the caller and passed by reference
//! into every dissection; dissectors read it through their context.

/// How much detail the text renderer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// One line per packet: the protocol chain and its terminal state.
    Brief,
    /// One line per layer with its decoded fields and options.
    #[default]
    Normal,
    /// Normal plus layer offsets, consumed lengths and payload previews.
    Verbose,
}

impl Verbosity {
    /// Map a repeated `-v` count onto a verbosity (0 is Normal).
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Normal,
            _ => Verbosity::Verbose,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DissectConfig {
    pub verbosity: Verbosity,
    /// Verify Internet checksums when every covered byte was captured.
    pub verify_checksums: bool,
    /// Upper bound on decoded layers per frame.
    pub max_layers: usize,
    /// Bytes of leaf payload shown in hex at Verbose (0 disables).
    pub payload_preview: usize,
}

impl DissectConfig {
    pub const DEFAULT_MAX_LAYERS: usize = 16;

    pub const fn new() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            verify_checksums: true,
            max_layers: Self::DEFAULT_MAX_LAYERS,
            payload_preview: 16,
        }
    }

    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub const fn with_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    pub const fn with_max_layers(mut self, max_layers: usize) -> Self {
        self.max_layers = max_layers;
        self
    }

    pub const fn with_payload_preview(mut self, bytes: usize) -> Self {
        self.payload_preview = bytes;
        self
    }
}

impl Default for DissectConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DissectConfig::default();
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert!(config.verify_checksums);
        assert_eq!(config.max_layers, 16);
    }

    #[test]
    fn test_builder() {
        const QUIET: DissectConfig = DissectConfig::new()
            .with_verbosity(Verbosity::Brief)
            .with_checksums(false)
            .with_max_layers(4)
            .with_payload_preview(0);
        assert_eq!(QUIET.verbosity, Verbosity::Brief);
        assert!(!QUIET.verify_checksums);
        assert_eq!(QUIET.max_layers, 4);
        assert_eq!(QUIET.payload_preview, 0);
    }

    #[test]
    fn test_verbosity_from_count() {
        assert_eq!(Verbosity::from_count(0), Verbosity::Normal);
        assert_eq!(Verbosity::from_count(3), Verbosity::Verbose);
        assert!(Verbosity::Brief < Verbosity::Verbose);
    }
}
