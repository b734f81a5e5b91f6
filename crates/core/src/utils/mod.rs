pub mod date_utils;
pub mod numeric_utils;
