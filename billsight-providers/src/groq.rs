//! Models hosted on Groq.

use crate::config::{ProviderConfig, Role, SpeedTier};
use crate::service::Service;

/// Llama 4 Scout on Groq. Default fallback.
pub fn groq_llama_scout() -> ProviderConfig {
    ProviderConfig::builder(
        "groq_llama_scout",
        Service::Groq,
        "meta-llama/llama-4-scout-17b-16e-instruct",
    )
    .speed(SpeedTier::Fast)
    .role(Role::Fallback)
    .description("Meta Llama 4 Scout 17B on Groq; very low latency")
    .build()
}
