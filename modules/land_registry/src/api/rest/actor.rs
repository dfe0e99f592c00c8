//! Caller identity supplied by the upstream gateway
//!
//! Requests carry `x-actor-role` (`admin`, `mayor` or `farmer`) and `x-actor-id`.
//! Mayors also carry `x-actor-village`. Missing or malformed headers are 401.

use super::error::Problem;
use crate::contract::Actor;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use uuid::Uuid;

pub const ROLE_HEADER: &str = "x-actor-role";
pub const ID_HEADER: &str = "x-actor-id";
pub const VILLAGE_HEADER: &str = "x-actor-village";

/// Extractor for the calling actor
#[derive(Debug, Clone)]
pub struct CallerActor(pub Actor);

impl<S> FromRequestParts<S> for CallerActor
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers).map(CallerActor)
    }
}

fn unauthorized(detail: impl Into<String>) -> Problem {
    Problem::new(StatusCode::UNAUTHORIZED, "Unauthorized").with_detail(detail)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, Problem> {
    let raw = headers
        .get(name)
        .ok_or_else(|| unauthorized(format!("missing {} header", name)))?;
    // Village names carry diacritics, so accept any UTF-8 rather than visible ASCII
    let value = std::str::from_utf8(raw.as_bytes())
        .map_err(|_| unauthorized(format!("{} header is not valid UTF-8", name)))?
        .trim();

    if value.is_empty() {
        return Err(unauthorized(format!("{} header is empty", name)));
    }
    Ok(value)
}

fn uuid_header(headers: &HeaderMap) -> Result<Uuid, Problem> {
    let raw = header(headers, ID_HEADER)?;
    Uuid::parse_str(raw).map_err(|_| unauthorized(format!("{} must be a UUID", ID_HEADER)))
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Problem> {
    match header(headers, ROLE_HEADER)? {
        "admin" => Ok(Actor::Admin {
            id: header(headers, ID_HEADER)?.to_string(),
        }),
        "mayor" => Ok(Actor::Mayor {
            id: uuid_header(headers)?,
            village: header(headers, VILLAGE_HEADER)?.to_string(),
        }),
        "farmer" => Ok(Actor::Farmer {
            id: uuid_header(headers)?,
        }),
        other => Err(unauthorized(format!("unknown role '{}'", other))),
    }
}
