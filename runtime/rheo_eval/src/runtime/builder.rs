//! `RuntimeBuilder` for creating runtimes with various configurations.

use super::Runtime;

/// Settings fixed for the lifetime of a [`Runtime`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of heap terms; exceeding it aborts. `None` is unbounded.
    pub max_terms: Option<usize>,
    /// Maximum nesting depth of evaluation. Deeper evaluations produce an
    /// error signal instead of recursing further.
    pub max_depth: Option<usize>,
    /// Memoize reducible terms across evaluations.
    pub memoize: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            max_terms: None,
            max_depth: None,
            memoize: true,
        }
    }
}

/// Builder for [`Runtime`].
#[derive(Clone, Debug, Default)]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the heap size.
    #[must_use]
    pub fn max_terms(mut self, max_terms: usize) -> Self {
        self.config.max_terms = Some(max_terms);
        self
    }

    /// Bound evaluation depth.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = Some(max_depth);
        self
    }

    /// Enable or disable memoization (enabled by default).
    #[must_use]
    pub fn memoize(mut self, memoize: bool) -> Self {
        self.config.memoize = memoize;
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Runtime {
        Runtime::from_config(self.config)
    }
}
