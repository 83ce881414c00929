pub mod account;

pub use account::{is_valid_username, Account, NewAccount, MAX_USERNAME_LEN};
