//! Engine configuration.

/// Default for [`Config::depth_limit`].
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// Tuning knobs for the reconciliation engine.
///
/// ```
/// use spark_dom::Config;
///
/// let config = Config::new().with_depth_limit(64);
/// assert_eq!(config.depth_limit(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    depth_limit: usize,
    keyed_moves: bool,
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            depth_limit: DEFAULT_DEPTH_LIMIT,
            keyed_moves: true,
        }
    }

    /// Sets the deepest virtual tree accepted by `create` and `update`.
    ///
    /// Deeper trees are rejected as malformed before any mutation happens.
    #[must_use]
    pub const fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    /// Controls move minimization on the keyed path.
    ///
    /// When disabled, keyed children are still matched (and keep their live
    /// nodes) but every matched child is re-inserted in order.
    #[must_use]
    pub const fn with_keyed_moves(mut self, keyed_moves: bool) -> Self {
        self.keyed_moves = keyed_moves;
        self
    }

    #[must_use]
    pub const fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    #[must_use]
    pub const fn keyed_moves(&self) -> bool {
        self.keyed_moves
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
