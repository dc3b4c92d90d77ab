// store

mod refresh_token_repo;

pub use refresh_token_repo::*;

// repo

mod password_reset_repo;
mod user_repo;

pub use password_reset_repo::*;
pub use user_repo::*;
