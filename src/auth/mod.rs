// Authentication module
// Manages the credential cache, token refresh, and interactive authorization

mod loopback;
mod provider;
mod refresh;
mod secrets;
mod store;
mod types;

pub use loopback::{
    authorization_url, callback_router, code_challenge_s256, wait_for_callback, CallbackPayload,
    CredentialAcquirer, LoopbackAcquirer, PkcePair,
};
pub use provider::CredentialProvider;
pub use refresh::{exchange_authorization_code, refresh_credential};
pub use secrets::load_client_secrets;
pub use store::CredentialStore;
pub use types::{
    ClientSecrets, Credential, TokenResponse, DEFAULT_AUTH_URI, DEFAULT_TOKEN_URI,
    DRIVE_READONLY_SCOPE,
};
