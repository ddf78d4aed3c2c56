mod account;
mod health_check;

pub use account::{
    delete_image, details, me, signin, signout, signup, tokens, upload_image, AccountResponse,
    AuthResponse, CredentialsRequest, RefreshRequest,
};
pub use health_check::health_check;
