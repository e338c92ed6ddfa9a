//! Custom request extractors.

mod session_user;
mod validated_json;

pub use session_user::MaybeUser;
pub use validated_json::ValidatedJson;
