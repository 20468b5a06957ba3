//! Building model managers from registry names.

use std::sync::Arc;
use std::time::Duration;

use billsight_fetch::{ConfigError, ModelManager, VisionModel};
use tracing::{info, warn};

use crate::registry::ProviderRegistry;

/// Builds a manager for the named primary and optional fallback provider.
///
/// The primary must resolve and construct. A fallback that is unknown, lacks
/// credentials, or names the primary again is logged and dropped, leaving a
/// primary-only manager.
///
/// # Errors
///
/// Returns [`ConfigError`] if the primary is not registered or its client
/// cannot be built.
pub fn build_manager(
    primary: &str,
    fallback: Option<&str>,
    timeout: Duration,
) -> Result<ModelManager, ConfigError> {
    let primary_config =
        ProviderRegistry::get(primary).ok_or_else(|| ConfigError::UnknownProvider(primary.to_string()))?;
    let primary_client: Arc<dyn VisionModel> = Arc::new(primary_config.build_client(timeout)?);

    let fallback_client = fallback
        .filter(|name| {
            if *name == primary {
                warn!(provider = %name, "Fallback is the same as primary, ignoring");
                false
            } else {
                true
            }
        })
        .and_then(|name| match ProviderRegistry::get(name) {
            Some(config) => match config.build_client(timeout) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn VisionModel>),
                Err(e) => {
                    warn!(provider = %name, error = %e, "Fallback provider unavailable, continuing without it");
                    None
                }
            },
            None => {
                warn!(provider = %name, "Unknown fallback provider, continuing without it");
                None
            }
        });

    info!(
        primary = %primary,
        fallback = ?fallback_client.as_ref().map(|c| c.name().to_string()),
        "Model manager ready"
    );

    Ok(ModelManager::new(primary_client, fallback_client).with_deadline(timeout))
}
