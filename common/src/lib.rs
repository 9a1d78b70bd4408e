pub mod float_ext;
pub mod log_setup;
pub mod test_utils;

pub use float_ext::FloatExt;
