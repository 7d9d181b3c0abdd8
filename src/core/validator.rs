//! Structural credential checks, run before any network call

use crate::core::models::{ProviderCredential, ProviderKind};

fn present(field: &Option<String>) -> bool {
    field.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Whether `credential` has every field `kind` needs, ignoring `enabled`
pub fn has_required_fields(kind: ProviderKind, credential: &ProviderCredential) -> bool {
    match kind {
        ProviderKind::Baidu | ProviderKind::Alibaba | ProviderKind::Volcano => {
            present(&credential.app_id) && present(&credential.app_key)
        }
        ProviderKind::Tencent => present(&credential.secret_id) && present(&credential.secret_key),
        ProviderKind::Deepl => present(&credential.api_key),
        ProviderKind::Google => true,
    }
}

/// Disabled credentials and unknown provider names are never valid
pub fn validate(provider: &str, credential: &ProviderCredential) -> bool {
    if !credential.enabled {
        return false;
    }

    match provider.parse::<ProviderKind>() {
        Ok(kind) => has_required_fields(kind, credential),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields_per_provider() {
        let app = ProviderCredential::enabled().with_app("id", "key");
        let secret = ProviderCredential::enabled().with_secret("sid", "skey");
        let api = ProviderCredential::enabled().with_api_key("k");

        assert!(validate("baidu", &app));
        assert!(validate("alibaba", &app));
        assert!(validate("volcano", &app));
        assert!(!validate("tencent", &app));
        assert!(validate("tencent", &secret));
        assert!(!validate("deepl", &secret));
        assert!(validate("deepl", &api));
        assert!(validate("google", &ProviderCredential::enabled()));
    }

    #[test]
    fn test_disabled_is_invalid() {
        let mut cred = ProviderCredential::enabled().with_app("id", "key");
        cred.enabled = false;
        assert!(!validate("baidu", &cred));
        assert!(!validate("google", &ProviderCredential::default()));
    }

    #[test]
    fn test_partial_and_blank_fields() {
        let mut cred = ProviderCredential::enabled();
        cred.app_id = Some("id".to_string());
        assert!(!validate("baidu", &cred));

        cred.app_key = Some("   ".to_string());
        assert!(!validate("baidu", &cred));
    }

    #[test]
    fn test_unknown_provider() {
        assert!(!validate("bing", &ProviderCredential::enabled().with_api_key("k")));
    }
}
