//! Session cookies.
//!
//! A successful registration or login sets the `auth_token` cookie to `<user_id>:<signature>`, where the signature is
//! the URL-safe base64 encoding of HMAC-SHA256 over the user id, keyed with the server's cookie secret. Handlers that
//! need a logged-in user take an [`AuthenticatedUser`] argument, which rejects the request with a 401 unless the cookie
//! is present and correctly signed.
use std::{
    fmt::Debug,
    future::{ready, Ready},
};

use actix_web::{
    cookie::{Cookie, SameSite},
    dev::Payload,
    web,
    FromRequest,
    HttpRequest,
};
use hmac::{Hmac, Mac};
use log::*;
use lpg_common::Secret;
use sha2::Sha256;

use crate::errors::{AuthError, ServerError};

pub const AUTH_COOKIE: &str = "auth_token";

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct CookieSigner {
    keyed_mac: HmacSha256,
}

impl Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CookieSigner(****)")
    }
}

impl CookieSigner {
    pub fn new(key: &Secret<String>) -> Result<Self, ServerError> {
        let keyed_mac = HmacSha256::new_from_slice(key.reveal().as_bytes())
            .map_err(|e| ServerError::ConfigurationError(format!("Invalid cookie secret. {e}")))?;
        Ok(Self { keyed_mac })
    }

    fn mac(&self, user_id: i64) -> HmacSha256 {
        let mut mac = self.keyed_mac.clone();
        mac.update(user_id.to_string().as_bytes());
        mac
    }

    /// The cookie value for `user_id`.
    pub fn sign(&self, user_id: i64) -> String {
        let signature = self.mac(user_id).finalize().into_bytes();
        format!("{user_id}:{}", base64::encode_config(signature, base64::URL_SAFE_NO_PAD))
    }

    /// Returns the user id if `token` was issued by this signer.
    pub fn verify(&self, token: &str) -> Option<i64> {
        let (id, signature) = token.split_once(':')?;
        let user_id = id.parse::<i64>().ok()?;
        let signature = base64::decode_config(signature, base64::URL_SAFE_NO_PAD).ok()?;
        self.mac(user_id).verify_slice(&signature).ok()?;
        Some(user_id)
    }

    /// A session cookie for `user_id`, ready to be attached to a response.
    pub fn cookie(&self, user_id: i64) -> Cookie<'static> {
        Cookie::build(AUTH_COOKIE, self.sign(user_id)).path("/").http_only(true).same_site(SameSite::Strict).finish()
    }
}

/// The user a request was made by, taken from the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate_request(req))
    }
}

fn authenticate_request(req: &HttpRequest) -> Result<AuthenticatedUser, ServerError> {
    let signer = req.app_data::<web::Data<CookieSigner>>().ok_or_else(|| {
        error!("🔑️ No cookie signer has been configured for this route");
        ServerError::InitializeError("Cookie signer is missing".to_string())
    })?;
    let cookie = req.cookie(AUTH_COOKIE).ok_or(AuthError::MissingCookie)?;
    match signer.verify(cookie.value()) {
        Some(user_id) => Ok(AuthenticatedUser { user_id }),
        None => {
            debug!("🔑️ Rejected a request with an invalid session cookie");
            Err(AuthError::InvalidCookie.into())
        },
    }
}
