// ── Credential acquisition ──
//
// The event stream accepts a bearer token on the upgrade request.
// How that token is obtained is pluggable: the client only sees an
// `Authenticator` that either hands one back or fails.

use futures_util::future::{self, BoxFuture};
use secrecy::SecretString;

use crate::error::Error;

/// Produces the bearer credential used to open the event stream.
///
/// Called once per connection attempt. A failure aborts that attempt
/// and is reported to the caller of `connect()` unchanged.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self) -> BoxFuture<'_, Result<SecretString, Error>>;
}

/// Hands out a pre-issued access token.
#[derive(Debug, Clone)]
pub struct StaticTokenAuthenticator {
    token: SecretString,
}

impl StaticTokenAuthenticator {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self) -> BoxFuture<'_, Result<SecretString, Error>> {
        Box::pin(future::ready(Ok(self.token.clone())))
    }
}
