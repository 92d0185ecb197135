//! GoPro related structs and methods.

pub mod device_name;
pub mod session;

pub use device_name::DeviceName;
pub use session::{Batch, GoProSession};
