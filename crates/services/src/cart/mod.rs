pub mod ports;
pub mod service;
pub mod test_helpers;

pub use service::CartServiceImpl;
