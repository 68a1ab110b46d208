//! TCP listeners for receiver prefixes.
//!
//! # Responsibilities
//! - Bind one listener per distinct `host:port` across a receiver's prefixes
//! - Report the bound addresses (ports may be 0 in configuration)
//! - Release everything bound so far if a later bind fails

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::error::{Error, Result};
use crate::routing::UriPrefix;

/// A bound listener and the address it serves.
#[derive(Debug)]
pub struct BoundListener {
    pub listener: TcpListener,
    pub local_addr: SocketAddr,
}

/// Distinct bind addresses of `prefixes`, in first-seen order.
pub fn bind_addresses(prefixes: &[UriPrefix]) -> Vec<String> {
    let mut addresses: Vec<String> = Vec::new();
    for prefix in prefixes {
        let address = prefix.bind_address();
        if !addresses.contains(&address) {
            addresses.push(address);
        }
    }
    addresses
}

/// Bind every distinct address of `prefixes`.
///
/// Listeners bound before a failure are dropped, closing their sockets.
pub async fn bind_prefixes(prefixes: &[UriPrefix]) -> Result<Vec<BoundListener>> {
    let mut bound = Vec::new();

    for address in bind_addresses(prefixes) {
        let listener = TcpListener::bind(address.as_str())
            .await
            .map_err(|source| Error::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| Error::Bind {
            address: address.clone(),
            source,
        })?;

        tracing::info!(
            address = %local_addr,
            configured = %address,
            "Listener bound"
        );

        bound.push(BoundListener {
            listener,
            local_addr,
        });
    }

    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes(raw: &[&str]) -> Vec<UriPrefix> {
        raw.iter().map(|p| UriPrefix::parse(p).unwrap()).collect()
    }

    #[test]
    fn shared_authorities_bind_once() {
        let prefixes = prefixes(&[
            "http://127.0.0.1:7001/orders/",
            "http://127.0.0.1:7001/invoices/",
            "http://+:7002/",
        ]);
        assert_eq!(
            bind_addresses(&prefixes),
            vec!["127.0.0.1:7001".to_string(), "0.0.0.0:7002".to_string()]
        );
    }

    #[tokio::test]
    async fn binds_ephemeral_ports() {
        let bound = bind_prefixes(&prefixes(&["http://127.0.0.1:0/"])).await.unwrap();
        assert_eq!(bound.len(), 1);
        assert_ne!(bound[0].local_addr.port(), 0);
    }

    #[tokio::test]
    async fn reports_bind_failures() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let prefix = format!("http://127.0.0.1:{}/", port);

        let err = bind_prefixes(&prefixes(&[prefix.as_str()])).await.unwrap_err();
        assert!(matches!(err, Error::Bind { .. }));
    }
}
