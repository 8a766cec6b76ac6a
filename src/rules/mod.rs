//! Rule implementations behind the custom schema keywords.

pub mod conditional;
pub mod content;
pub mod date;
pub mod delimited;
