/// Authentication module
///
/// Credential verification, dual-token issuance and validation, session
/// rotation, and the request gate.

mod claims;
mod password;
mod session;
mod tokens;

pub use claims::Claims;
pub use password::hash_password;
pub use password::verify_password;
pub use session::authenticate;
pub use session::login;
pub use session::logout;
pub use session::rotate_session;
pub use session::Identity;
pub use session::TokenPair;
pub use tokens::decode_token;
pub use tokens::issue_access;
pub use tokens::issue_refresh;
pub use tokens::TokenKind;
