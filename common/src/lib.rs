pub mod file_format;
pub mod file_utils;
pub mod log_setup;
pub mod serde;
pub mod shared_fn;
pub mod test_utils;

pub use file_format::{FileExtensionError, FileFormat};
pub use crate::serde::{deserialize, serialize};
pub use shared_fn::SharedFn;
