/// Configuration rejected when building a [`crate::GroupedList`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("page size must be at least 1")]
    ZeroPageSize,
}
