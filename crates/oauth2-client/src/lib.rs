//! OAuth 2.0 authorization-code client with PKCE
//!
//! Implements the `auth_client::Client` trait for providers speaking plain
//! OAuth 2.0 (authorization code grant, RFC 6749 §4.1) with PKCE (RFC 7636).
//!
//! Login flow:
//! 1. `redirect()` generates `state` + PKCE verifier, stores both in the
//!    session and sends the browser to the provider's authorization endpoint
//! 2. The provider redirects back to the callback with `code` and `state`
//! 3. `complete_handshake()` checks `state`, exchanges the code via
//!    `token::exchange_code()` and loads the user via `token::fetch_user_info()`
//! 4. The pending state is removed only once a profile was produced

pub mod client;
pub mod error;
pub mod pkce;
pub mod token;

pub use client::{OAuth2Client, OAuth2Settings};
pub use error::{Error, Result};
pub use pkce::{compute_challenge, generate_state, generate_verifier};
pub use token::{TokenResponse, exchange_code, fetch_user_info};
