//! Tessera Core: Typed POD values, field elements, the entry-name grammar,
//! shared error taxonomy, and tool configuration.

pub mod config;
pub mod error;
pub mod field;
pub mod names;
pub mod types;

pub use config::ToolConfig;
pub use error::{CoreError, ErrorKind};
pub use field::FieldElement;
pub use names::{check_name, is_valid_name, VirtualEntry};
pub use types::{PodEntries, PodValue, ValueType, POD_INT_MAX, POD_INT_MIN};
