pub mod check;
pub mod deletion;
pub mod hierarchy;
pub mod inbox_ops;
