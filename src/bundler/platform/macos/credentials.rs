//! Signing credential lifecycle for one packaging session.
//!
//! When certificate material is configured, the manager names an ephemeral
//! keychain, registers its deletion with the session's [`CleanupRegistry`]
//! up front, and imports the certificates on first use. The outcome is
//! memoized, so concurrent branches share one keychain and one result.

use super::keychain::{
    APP_IDENTITY_PREFIXES, INSTALLER_IDENTITY_PREFIXES, KeychainTool, generate_keychain_name,
    load_certificate, pick_identity,
};
use crate::bundler::{
    builder::CleanupRegistry,
    error::{Error, Result},
    settings::CodeSigningSettings,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Resolved signing material for the session.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CredentialContext {
    /// Application signing identity.
    pub name: Option<String>,
    /// Installer signing identity (Mac App Store packages).
    pub installer_name: Option<String>,
    /// Ephemeral keychain holding the imported certificates.
    pub keychain: Option<String>,
}

impl CredentialContext {
    /// Context with no credential at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// No identity and no keychain.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.installer_name.is_none() && self.keychain.is_none()
    }
}

struct KeychainPlan {
    name: String,
    settings: CodeSigningSettings,
}

/// Owns the ephemeral keychain for a session.
pub struct CredentialManager {
    plan: Option<KeychainPlan>,
    tool: Arc<dyn KeychainTool>,
    resolved: OnceCell<std::result::Result<CredentialContext, String>>,
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("keychain", &self.keychain_name())
            .field("resolved", &self.resolved.initialized())
            .finish()
    }
}

impl CredentialManager {
    /// Prepares the credential lifecycle.
    ///
    /// With both certificate and password present, a keychain name is
    /// generated and its teardown registered immediately; nothing is
    /// created until [`CredentialManager::context`] is first awaited.
    pub fn new(
        settings: &CodeSigningSettings,
        tool: Arc<dyn KeychainTool>,
        cleanup: &CleanupRegistry,
    ) -> Self {
        let plan = settings.has_certificate().then(|| {
            let name = generate_keychain_name();
            let teardown_tool = tool.clone();
            let teardown_name = name.clone();
            cleanup.register(format!("delete keychain {name}"), move || async move {
                teardown_tool.delete(&teardown_name).await;
            });
            KeychainPlan {
                name,
                settings: settings.clone(),
            }
        });

        Self {
            plan,
            tool,
            resolved: OnceCell::new(),
        }
    }

    /// Name of the ephemeral keychain, if one is planned.
    pub fn keychain_name(&self) -> Option<&str> {
        self.plan.as_ref().map(|plan| plan.name.as_str())
    }

    /// Resolves the session's credential context.
    ///
    /// Every caller awaits the same resolution; a failure is returned to
    /// every caller as [`Error::CredentialSetup`] without retrying.
    pub async fn context(&self) -> Result<CredentialContext> {
        self.resolved
            .get_or_init(|| async {
                match &self.plan {
                    Some(plan) => self.setup(plan).await.map_err(|e| match e {
                        Error::CredentialSetup(message) => message,
                        other => other.to_string(),
                    }),
                    None => Ok(CredentialContext::empty()),
                }
            })
            .await
            .clone()
            .map_err(Error::CredentialSetup)
    }

    async fn setup(&self, plan: &KeychainPlan) -> Result<CredentialContext> {
        let settings = &plan.settings;
        let (Some(certificate), Some(password)) =
            (&settings.certificate, &settings.certificate_password)
        else {
            return Ok(CredentialContext::empty());
        };

        log::info!("Importing signing certificate into keychain {}", plan.name);
        self.tool.create(&plan.name).await?;

        if let Some(auxiliary) = &settings.auxiliary_certificate {
            let bytes = load_certificate(auxiliary).await?;
            self.tool.import(&plan.name, &bytes, None).await?;
        }

        let bytes = load_certificate(certificate).await?;
        self.tool
            .import(&plan.name, &bytes, Some(password.as_str()))
            .await?;

        if let Some(installer) = &settings.installer_certificate {
            let bytes = load_certificate(installer).await?;
            let installer_password = settings
                .installer_certificate_password
                .as_deref()
                .unwrap_or(password.as_str());
            self.tool
                .import(&plan.name, &bytes, Some(installer_password))
                .await?;
        }

        let identities = self.tool.identities(&plan.name).await?;
        let context = CredentialContext {
            name: pick_identity(&identities, APP_IDENTITY_PREFIXES),
            installer_name: pick_identity(&identities, INSTALLER_IDENTITY_PREFIXES),
            keychain: Some(plan.name.clone()),
        };

        match &context.name {
            Some(name) => log::info!("✓ Certificate imported, signing as \"{}\"", name),
            None => log::warn!(
                "Keychain {} contains no application signing identity",
                plan.name
            ),
        }

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::Engine;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct FakeKeychain {
        creates: AtomicUsize,
        deletes: AtomicUsize,
        imports: Mutex<Vec<Option<String>>>,
        fail_create: bool,
    }

    #[async_trait]
    impl KeychainTool for FakeKeychain {
        async fn create(&self, _keychain: &str) -> Result<()> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_create {
                return Err(Error::CredentialSetup("keychain locked".into()));
            }
            Ok(())
        }

        async fn import(&self, _: &str, _: &[u8], password: Option<&str>) -> Result<()> {
            self.imports
                .lock()
                .unwrap()
                .push(password.map(str::to_string));
            Ok(())
        }

        async fn identities(&self, _: &str) -> Result<Vec<String>> {
            Ok(vec![
                "Developer ID Application: Example (T1)".into(),
                "3rd Party Mac Developer Installer: Example (T1)".into(),
            ])
        }

        async fn delete(&self, _: &str) {
            self.deletes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn certificate_settings() -> CodeSigningSettings {
        let blob = base64::engine::general_purpose::STANDARD.encode(b"p12");
        CodeSigningSettings {
            certificate: Some(blob.clone()),
            certificate_password: Some("secret".into()),
            installer_certificate: Some(blob),
            installer_certificate_password: None,
            auxiliary_certificate: None,
        }
    }

    #[tokio::test]
    async fn no_material_means_empty_context_and_no_cleanup() {
        let tool = Arc::new(FakeKeychain::default());
        let cleanup = CleanupRegistry::new();
        let manager = CredentialManager::new(&CodeSigningSettings::default(), tool.clone(), &cleanup);

        assert!(manager.context().await.unwrap().is_empty());
        assert_eq!(cleanup.pending(), 0);
        assert_eq!(tool.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn password_without_certificate_is_not_enough() {
        let tool = Arc::new(FakeKeychain::default());
        let cleanup = CleanupRegistry::new();
        let settings = CodeSigningSettings {
            certificate_password: Some("secret".into()),
            ..Default::default()
        };
        let manager = CredentialManager::new(&settings, tool, &cleanup);
        assert!(manager.keychain_name().is_none());
        assert!(manager.context().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_import() {
        let tool = Arc::new(FakeKeychain::default());
        let cleanup = CleanupRegistry::new();
        let manager = CredentialManager::new(&certificate_settings(), tool.clone(), &cleanup);

        let (a, b) = tokio::join!(manager.context(), manager.context());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a, b);
        assert_eq!(a.keychain.as_deref(), manager.keychain_name());
        assert_eq!(a.name.as_deref(), Some("Developer ID Application: Example (T1)"));
        assert_eq!(
            a.installer_name.as_deref(),
            Some("3rd Party Mac Developer Installer: Example (T1)")
        );
        assert_eq!(tool.creates.load(Ordering::SeqCst), 1);
        // installer certificate falls back to the application password
        assert_eq!(
            *tool.imports.lock().unwrap(),
            vec![Some("secret".to_string()), Some("secret".to_string())]
        );

        cleanup.run_all().await;
        cleanup.run_all().await;
        assert_eq!(tool.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_memoized_and_still_cleaned_up() {
        let tool = Arc::new(FakeKeychain {
            fail_create: true,
            ..Default::default()
        });
        let cleanup = CleanupRegistry::new();
        let manager = CredentialManager::new(&certificate_settings(), tool.clone(), &cleanup);

        assert!(matches!(
            manager.context().await,
            Err(Error::CredentialSetup(ref m)) if m == "keychain locked"
        ));
        assert!(manager.context().await.is_err());
        assert_eq!(tool.creates.load(Ordering::SeqCst), 1);

        cleanup.run_all().await;
        assert_eq!(tool.deletes.load(Ordering::SeqCst), 1);
    }
}
