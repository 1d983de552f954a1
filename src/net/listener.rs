//! Listener binding for the configured addresses.
//!
//! # Responsibilities
//! - Bind every configured address before any of them serves
//! - Attach TLS material to `https` addresses
//! - Report the actual local address (port 0 resolves here)

use std::net::SocketAddr;

use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;

use crate::config::{AddressConfig, Protocol, ResterConfig};
use crate::error::StartupError;
use crate::net::tls::load_tls_config;

/// A bound socket, ready to be handed to a server instance.
pub enum BoundListener {
    Http(TcpListener),
    Https(std::net::TcpListener, RustlsConfig),
}

/// One bound address and the configuration it came from.
pub struct BoundAddress {
    pub address: AddressConfig,
    pub local_addr: SocketAddr,
    pub listener: BoundListener,
}

impl std::fmt::Debug for BoundAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundAddress")
            .field("address", &self.address)
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

/// Bind a single address.
pub async fn bind(
    address: &AddressConfig,
    tls: Option<&RustlsConfig>,
) -> Result<BoundAddress, StartupError> {
    let bind_err = |source| StartupError::Bind {
        address: address.bind_address(),
        source,
    };

    let listener = TcpListener::bind(address.bind_address())
        .await
        .map_err(bind_err)?;
    let local_addr = listener.local_addr().map_err(bind_err)?;

    let listener = match (address.protocol, tls) {
        (Protocol::Http, _) => BoundListener::Http(listener),
        (Protocol::Https, Some(tls)) => {
            BoundListener::Https(listener.into_std().map_err(bind_err)?, tls.clone())
        }
        (Protocol::Https, None) => {
            return Err(StartupError::Tls(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} requires a [tls] section", address.url()),
            )))
        }
    };

    tracing::info!(
        address = %local_addr,
        protocol = address.protocol.scheme(),
        "Listener bound"
    );

    Ok(BoundAddress {
        address: address.clone(),
        local_addr,
        listener,
    })
}

/// Bind every configured address, failing on the first error.
pub async fn bind_all(config: &ResterConfig) -> Result<Vec<BoundAddress>, StartupError> {
    let needs_tls = config
        .addresses
        .iter()
        .any(|a| a.protocol == Protocol::Https);
    let tls = match (&config.tls, needs_tls) {
        (Some(tls), true) => Some(load_tls_config(tls).await?),
        _ => None,
    };

    let mut bound = Vec::with_capacity(config.addresses.len());
    for address in &config.addresses {
        bound.push(bind(address, tls.as_ref()).await?);
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(port: u16) -> AddressConfig {
        AddressConfig {
            host: "127.0.0.1".into(),
            port,
            protocol: Protocol::Http,
        }
    }

    #[tokio::test]
    async fn test_bind_reports_local_addr() {
        let bound = bind(&local(0), None).await.unwrap();
        assert_ne!(bound.local_addr.port(), 0);
        assert!(matches!(bound.listener, BoundListener::Http(_)));
    }

    #[tokio::test]
    async fn test_port_in_use_is_bind_error() {
        let first = bind(&local(0), None).await.unwrap();
        let err = bind(&local(first.local_addr.port()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StartupError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_https_without_tls() {
        let address = AddressConfig {
            protocol: Protocol::Https,
            ..local(0)
        };
        assert!(matches!(
            bind(&address, None).await,
            Err(StartupError::Tls(_))
        ));
    }
}
