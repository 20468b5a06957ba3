//! Credential lookup from the process environment.

/// Reads a credential from `var`.
///
/// Returns `None` if the variable is unset, not valid unicode, or blank.
/// Surrounding whitespace is trimmed.
pub fn read_credential(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Masks a secret for display, keeping only a short prefix.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(6).collect();
    if secret.chars().count() <= 10 {
        "****".to_string()
    } else {
        format!("{prefix}****")
    }
}
