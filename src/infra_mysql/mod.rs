mod password_reset_repo_mysql;
mod user_repo_mysql;

pub use password_reset_repo_mysql::*;
pub use user_repo_mysql::*;
