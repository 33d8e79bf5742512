//! Adapter construction from configuration.

use std::sync::Arc;

use elitechlog_transport::{IdleTransport, SnapshotTransport, Transport, TransportKind};
use tracing::debug;

use crate::config::TransportConfig;

/// One adapter per channel: a snapshot device where configured, an idle
/// channel otherwise.
pub fn build_transports(config: &TransportConfig) -> Vec<Arc<dyn Transport>> {
    TransportKind::ALL
        .into_iter()
        .map(|kind| {
            let path = match kind {
                TransportKind::Com => config.com.as_ref(),
                TransportKind::Usb => config.usb.as_ref(),
            };
            match path {
                Some(path) => {
                    debug!(%kind, path = %path.display(), "Using snapshot device");
                    let mut transport = SnapshotTransport::new(kind, path);
                    if let Some(chunk) = config.download_chunk {
                        transport = transport.with_chunk(chunk);
                    }
                    Arc::new(transport) as Arc<dyn Transport>
                }
                None => Arc::new(IdleTransport::new(kind)) as Arc<dyn Transport>,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_one_adapter_per_channel() {
        let config = TransportConfig {
            usb: Some(PathBuf::from("usb.json")),
            ..Default::default()
        };
        let transports = build_transports(&config);
        let kinds: Vec<TransportKind> = transports.iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, vec![TransportKind::Com, TransportKind::Usb]);
    }
}
