mod order_number;
mod password;

pub use order_number::is_valid_order_number;
pub use password::{hash_password, verify_password};
