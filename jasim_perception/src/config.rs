/// Tree configuration.
///
/// Tunables that shape how a perception tree grows. World geometry is not
/// part of the configuration: it is supplied when the tree is created (or
/// derived from the entities by the builder).

use crate::error::{Error, Result};

/// Where entities straddling a split plane are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IcosepPolicy {
    /// Keep them in the node's own entity set
    #[default]
    RetainAtNode,
    /// Move them into the node's icosep child, which is never split
    ChildNode,
}

/// Perception tree tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Entity count above which a leaf is split at commit
    pub split_count: usize,
    /// Maximum node depth (root = 0); deeper splits are refused
    pub max_depth: u32,
    /// Storage of straddling entities
    pub icosep_policy: IcosepPolicy,
}

impl TreeConfig {
    /// Default split count
    pub const DEFAULT_SPLIT_COUNT: usize = 8;
    /// Default depth guard
    pub const DEFAULT_MAX_DEPTH: u32 = 16;

    pub fn new() -> Self {
        Self {
            split_count: Self::DEFAULT_SPLIT_COUNT,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            icosep_policy: IcosepPolicy::RetainAtNode,
        }
    }

    pub fn with_split_count(mut self, split_count: usize) -> Self {
        self.split_count = split_count;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_icosep_policy(mut self, icosep_policy: IcosepPolicy) -> Self {
        self.icosep_policy = icosep_policy;
        self
    }

    /// Check the tunables.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if the split count or the depth guard is zero.
    pub fn validate(&self) -> Result<()> {
        if self.split_count == 0 {
            return Err(Error::InvalidConfig("split_count must be positive".to_string()));
        }
        if self.max_depth == 0 {
            return Err(Error::InvalidConfig("max_depth must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}
