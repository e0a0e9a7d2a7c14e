//! Engine configuration

/// Nesting depth used by WAFv2 rule groups and web ACLs
pub const DEFAULT_MAX_NESTING_LEVEL: usize = 3;

/// Options for descriptor construction and validation
#[derive(Debug, Clone)]
pub struct Wafv2Config {
    /// Number of statement levels a rule may nest, root included (default: 3)
    pub max_nesting_level: usize,
}

impl Default for Wafv2Config {
    fn default() -> Self {
        Self {
            max_nesting_level: DEFAULT_MAX_NESTING_LEVEL,
        }
    }
}

impl Wafv2Config {
    pub fn with_max_nesting_level(mut self, level: usize) -> Self {
        self.max_nesting_level = level;
        self
    }
}
