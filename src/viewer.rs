use std::{convert::Infallible, net::SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts, OptionalFromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::error::AppError;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Address of the anonymous requester, used to key ratings.
///
/// Taken from the first `X-Forwarded-For` entry when present, otherwise from the peer address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerIp(pub String);

impl ViewerIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    async fn resolve<S: Send + Sync>(parts: &mut Parts, state: &S) -> Option<Self> {
        if let Some(ip) = forwarded_for(&parts.headers) {
            return Some(Self(ip));
        }

        let ConnectInfo(peer) =
            <ConnectInfo<SocketAddr> as FromRequestParts<S>>::from_request_parts(parts, state)
                .await
                .ok()?;
        Some(Self(peer.ip().to_string()))
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(FORWARDED_FOR)?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

impl<S: Send + Sync> FromRequestParts<S> for ViewerIp {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Self::resolve(parts, state)
            .await
            .ok_or_else(|| AppError::invalid("ip", "Could not determine the client address."))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for ViewerIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::resolve(parts, state).await)
    }
}
