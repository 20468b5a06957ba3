//! Models hosted on OpenRouter.

use crate::config::{ProviderConfig, Role, SpeedTier};
use crate::service::Service;

/// Gemini 2.5 Flash. Default primary.
pub fn openrouter_gemini() -> ProviderConfig {
    ProviderConfig::builder("openrouter_gemini", Service::OpenRouter, "google/gemini-2.5-flash")
        .speed(SpeedTier::Fast)
        .role(Role::Primary)
        .description("Google Gemini 2.5 Flash; strong receipt OCR and layout understanding")
        .build()
}

/// Llama 3.2 11B Vision, free tier.
pub fn openrouter_llama_vision() -> ProviderConfig {
    ProviderConfig::builder(
        "openrouter_llama_vision",
        Service::OpenRouter,
        "meta-llama/llama-3.2-11b-vision-instruct:free",
    )
    .speed(SpeedTier::Medium)
    .description("Meta Llama 3.2 11B Vision (free tier)")
    .build()
}

/// Qwen2-VL 7B, free tier.
pub fn openrouter_qwen() -> ProviderConfig {
    ProviderConfig::builder("openrouter_qwen", Service::OpenRouter, "qwen/qwen-2-vl-7b-instruct:free")
        .speed(SpeedTier::Medium)
        .description("Qwen2-VL 7B Instruct (free tier)")
        .build()
}
