//! Best-effort client address, resolved by the HTTP layer.

use crate::AppResources;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// The caller's address: first `X-Forwarded-For` hop when trusted, then the socket peer.
///
/// Never rejects; the address is simply absent when neither source is available
/// (for example when the router is served without connect info).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientAddr(pub Option<IpAddr>);

impl ClientAddr {
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> Self {
        let forwarded = trust_forwarded
            .then(|| forwarded_for(headers))
            .flatten();
        // Dual-stack listeners report IPv4 peers as `::ffff:a.b.c.d`
        ClientAddr(
            forwarded
                .or(peer.map(|p| p.ip()))
                .map(|ip| ip.to_canonical()),
        )
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.0
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let trust_forwarded = parts
            .extensions
            .get::<AppResources>()
            .is_some_and(|r| r.config.trust_forwarded_for);
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::resolve(&parts.headers, peer, trust_forwarded))
    }
}
