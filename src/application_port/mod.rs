mod auth_service;
mod password_reset_service;
mod token_codec;

pub use auth_service::*;
pub use password_reset_service::*;
pub use token_codec::*;
