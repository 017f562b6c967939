//! Client identity: the `cid` cookie that lets the collector count returning
//! visitors, and the response headers that go with it.

use crate::errors::RelayError;
use crate::metrics_defs::CLIENT_IDS;
use cookie::Cookie;
use http::HeaderMap;
use http::header::{CACHE_CONTROL, COOKIE, EXPIRES, HeaderName, HeaderValue, SET_COOKIE};
use rand::TryRngCore;
use shared::counter;
use std::fmt;

pub const COOKIE_NAME: &str = "cid";
pub const CID_HEADER: HeaderName = HeaderName::from_static("cid");
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate, private";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(String);

impl ClientId {
    /// Draws 16 bytes from `rng` and masks bytes 6 and 8 the way existing
    /// client cookies were minted. The result resembles a UUID but is not a
    /// valid v4 UUID, and must stay that way.
    pub fn generate<R: TryRngCore>(rng: &mut R) -> Result<Self, RelayError> {
        let mut bytes = [0u8; 16];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| RelayError::Entropy(e.to_string()))?;

        bytes[8] = (bytes[8] | 0x80) & 0xBF;
        bytes[6] = (bytes[6] | 0x40) & 0x4F;

        Ok(ClientId(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    /// Read from the request's `cid` cookie
    Existing(ClientId),
    /// Freshly minted; the response must persist it
    Generated(ClientId),
    /// No cookie and the entropy source failed
    Unavailable,
}

impl ClientIdentity {
    pub fn resolve<R: TryRngCore>(headers: &HeaderMap, rng: &mut R) -> Self {
        if let Some(value) = cookie_value(headers, COOKIE_NAME) {
            tracing::info!(cid = %value, "Existing CID found");
            counter!(CLIENT_IDS, "source" => "cookie").increment(1);
            return ClientIdentity::Existing(ClientId(value));
        }

        match ClientId::generate(rng) {
            Ok(cid) => {
                tracing::info!(cid = %cid, "Generated new client UUID");
                counter!(CLIENT_IDS, "source" => "generated").increment(1);
                ClientIdentity::Generated(cid)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to generate client UUID");
                counter!(CLIENT_IDS, "source" => "failed").increment(1);
                ClientIdentity::Unavailable
            }
        }
    }

    pub fn client_id(&self) -> Option<&ClientId> {
        match self {
            ClientIdentity::Existing(cid) | ClientIdentity::Generated(cid) => Some(cid),
            ClientIdentity::Unavailable => None,
        }
    }

    /// Sets the cookie for a freshly generated id and, whenever an id is known,
    /// the no-cache headers and the `CID` echo.
    pub fn apply(&self, account: &str, headers: &mut HeaderMap) {
        let Some(cid) = self.client_id() else {
            return;
        };

        if let ClientIdentity::Generated(cid) = self {
            let cookie = Cookie::build((COOKIE_NAME, cid.as_str()))
                .path(format!("/{}", sanitize_cookie_path(account)))
                .build();
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(e) => tracing::warn!(error = %e, "Could not build cid cookie"),
            }
        }

        headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
        let now = chrono::Utc::now().format(HTTP_DATE_FORMAT).to_string();
        if let Ok(expires) = HeaderValue::from_str(&now) {
            headers.insert(EXPIRES, expires);
        }
        if let Ok(value) = HeaderValue::from_str(cid.as_str()) {
            headers.insert(CID_HEADER, value);
        }
    }
}

/// Returns the value of the first cookie called `name`, if it is non-empty.
/// Headers are decoded lossily so a non-ASCII sibling cookie cannot hide it.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers
        .get_all(COOKIE)
        .iter()
        .map(|header| String::from_utf8_lossy(header.as_bytes()))
        .find_map(|header| {
            Cookie::split_parse(header)
                .filter_map(Result::ok)
                .find(|cookie| cookie.name() == name)
                .map(|cookie| cookie.value_trimmed().to_string())
        })?;

    (!value.is_empty()).then_some(value)
}

/// Cookie paths may only carry printable ASCII other than `;`.
fn sanitize_cookie_path(path: &str) -> String {
    path.chars()
        .filter(|c| matches!(c, ' '..='~') && *c != ';')
        .collect()
}
