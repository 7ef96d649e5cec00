pub mod ports;
pub mod test_helpers;
pub mod tokens;
