//! Arena configuration parameters.

/// Configuration for a [`Storage`](crate::Storage) arena.
///
/// Only initial capacities are configurable: both buffers grow on demand
/// and are never shrunk except by tail truncation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Number of values to reserve in the value buffer up front.
    ///
    /// Default: 256.
    pub initial_value_capacity: usize,

    /// Number of interval slots to reserve up front.
    ///
    /// Default: 64. Each live bag with at least one value holds one slot.
    pub initial_slot_capacity: usize,
}

impl StorageConfig {
    /// Default value buffer reservation.
    pub const DEFAULT_VALUE_CAPACITY: usize = 256;

    /// Default interval slot reservation.
    pub const DEFAULT_SLOT_CAPACITY: usize = 64;

    /// Create a config with default capacities.
    pub fn new() -> Self {
        Self {
            initial_value_capacity: Self::DEFAULT_VALUE_CAPACITY,
            initial_slot_capacity: Self::DEFAULT_SLOT_CAPACITY,
        }
    }

    /// A config that reserves nothing until first use.
    pub fn unreserved() -> Self {
        Self {
            initial_value_capacity: 0,
            initial_slot_capacity: 0,
        }
    }

    /// Set the initial value buffer reservation.
    pub fn with_value_capacity(mut self, capacity: usize) -> Self {
        self.initial_value_capacity = capacity;
        self
    }

    /// Set the initial interval slot reservation.
    pub fn with_slot_capacity(mut self, capacity: usize) -> Self {
        self.initial_slot_capacity = capacity;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = StorageConfig::default();
        assert_eq!(
            config.initial_value_capacity,
            StorageConfig::DEFAULT_VALUE_CAPACITY
        );
        assert_eq!(
            config.initial_slot_capacity,
            StorageConfig::DEFAULT_SLOT_CAPACITY
        );
    }

    #[test]
    fn builders_override_fields() {
        let config = StorageConfig::unreserved()
            .with_value_capacity(10)
            .with_slot_capacity(2);
        assert_eq!(config.initial_value_capacity, 10);
        assert_eq!(config.initial_slot_capacity, 2);
    }
}
