use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};

use crate::NetError;

/// TLS config trusting the platform store. `None` when the store yields no
/// usable certificate, in which case the agent keeps its bundled roots.
pub(crate) fn native_client_config() -> Result<Option<Arc<ClientConfig>>, NetError> {
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        log::debug!(target: "net", "native certificate store: {err}");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    if ignored > 0 {
        log::debug!(target: "net", "ignored {ignored} unparsable native certificates");
    }
    if added == 0 {
        return Ok(None);
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| NetError::Client(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Some(Arc::new(config)))
}
