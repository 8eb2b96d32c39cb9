//! parameter store access
//!
//! The resolver only needs two operations which are described by [ParameterStore].
//! [ssm::SsmParameterStore] talks to AWS, [memory::MemoryStore] keeps everything in memory.
pub mod memory;
pub mod ssm;

pub use memory::MemoryStore;
pub use ssm::SsmParameterStore;

/// A named parameter as returned by [ParameterStore::get_parameters_by_path]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Full name, including the path it was queried with
    pub name: String,
    pub value: String,
}

/// Hierarchical key-value store holding the values that get substituted
///
/// Values are always returned decrypted.
pub trait ParameterStore {
    /// Fetches a single parameter by its full name
    fn get_parameter(&self, name: &str) -> Result<String, StoreError>;

    /// Fetches all parameters below `path`, recursively
    ///
    /// Implementations must page through the complete result before returning.
    fn get_parameters_by_path(&self, path: &str) -> Result<Vec<Parameter>, StoreError>;
}

/// Opens a connection to a store. Called at most once per run, on first use.
pub type Connector<'c> = Box<dyn FnMut() -> Result<Box<dyn ParameterStore>, StoreError> + 'c>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("parameter {0} not found")]
    NotFound(String),
    #[error("unable to connect to the parameter store")]
    Connect(#[source] std::io::Error),
    #[error("parameter store request failed: {0}")]
    Request(String),
}
