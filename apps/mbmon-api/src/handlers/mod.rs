//! Handlers 模块

pub mod alerts;
pub mod device;
pub mod history;
pub mod status;

pub use alerts::*;
pub use device::*;
pub use history::*;
pub use status::*;
