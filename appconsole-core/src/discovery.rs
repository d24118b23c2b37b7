//! Thin contracts for the service-discovery collaborator.
//!
//! The core assumes "connect to service instance X" works; advertising and
//! resolving names of the service type is delegated to a platform DNS-SD
//! responder behind these seams. The shipped defaults cover development and
//! testing: a resolver for plain `host:port` instance names and an
//! advertiser that only logs.

use std::net::SocketAddr;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ConsoleError, Result};

/// Service type under which console services advertise, local domain.
pub const SERVICE_TYPE: &str = "_apparata-approach-v0001._tcp";

/// Resolves a service instance name to a connectable socket address.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, instance_name: &str) -> Result<SocketAddr>;
}

/// Advertises a service instance under [`SERVICE_TYPE`].
#[async_trait]
pub trait Advertiser: Send + Sync {
    async fn advertise(&self, instance_name: &str, port: u16) -> Result<()>;

    /// Withdraw the advertisement, e.g. when the listener is rebuilt.
    async fn withdraw(&self) -> Result<()> {
        Ok(())
    }
}

/// Resolver for instance names that are plain `host:port` strings.
pub struct StaticResolver;

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, instance_name: &str) -> Result<SocketAddr> {
        tokio::net::lookup_host(instance_name)
            .await
            .map_err(|_| {
                ConsoleError::Unknown(
                    format!("cannot resolve service instance '{instance_name}'").into(),
                )
            })?
            .next()
            .ok_or(ConsoleError::NoConnection)
    }
}

/// Advertiser that only logs; a platform responder owns the real
/// advertisement.
pub struct NullAdvertiser;

#[async_trait]
impl Advertiser for NullAdvertiser {
    async fn advertise(&self, instance_name: &str, port: u16) -> Result<()> {
        debug!(instance_name, port, service_type = SERVICE_TYPE, "advertisement delegated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_resolver_accepts_host_port() {
        let addr = StaticResolver.resolve("127.0.0.1:4020").await.unwrap();
        assert_eq!(addr.port(), 4020);
    }

    #[tokio::test]
    async fn static_resolver_rejects_garbage() {
        assert!(StaticResolver.resolve("not an address").await.is_err());
    }
}
