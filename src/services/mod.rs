pub mod identity;
pub mod incidents;
pub mod security;
pub mod status;

pub use identity::{authenticate, users_exist};
pub use security::{
    create_session_token, decode_session_token, hash_password, verify_password,
};
