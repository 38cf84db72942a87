//! Ephemeral keychain management.
//!
//! Certificates for a packaging run are imported into a throwaway keychain
//! so CI machines never keep signing material around and concurrent runs do
//! not fight over the login keychain.

use crate::bundler::{
    error::{Error, Result},
    utils::http,
};
use async_trait::async_trait;
use base64::Engine;
use std::{collections::HashMap, path::Path, process::Output, sync::Mutex};
use tokio::process::Command;

/// Application identity prefixes, most specific first.
pub const APP_IDENTITY_PREFIXES: &[&str] = &[
    "Developer ID Application:",
    "3rd Party Mac Developer Application:",
    "Apple Distribution:",
    "Mac Developer:",
    "Apple Development:",
];

/// Installer identity prefixes, most specific first.
pub const INSTALLER_IDENTITY_PREFIXES: &[&str] = &[
    "3rd Party Mac Developer Installer:",
    "Developer ID Installer:",
    "Mac Installer Distribution:",
];

/// Generates a collision-resistant keychain name for one packaging run.
pub fn generate_keychain_name() -> String {
    format!("csc-{}.keychain", uuid::Uuid::new_v4().simple())
}

/// Operations on secure storage needed by the credential manager.
#[async_trait]
pub trait KeychainTool: Send + Sync {
    /// Creates and unlocks a keychain and puts it on the search list.
    async fn create(&self, keychain: &str) -> Result<()>;

    /// Imports a certificate. `password` is `None` for plain `.cer` files.
    async fn import(&self, keychain: &str, certificate: &[u8], password: Option<&str>)
    -> Result<()>;

    /// Valid identity names in the keychain.
    async fn identities(&self, keychain: &str) -> Result<Vec<String>>;

    /// Deletes the keychain. Failures are logged, not returned.
    async fn delete(&self, keychain: &str);
}

/// [`KeychainTool`] backed by the `security` command line tool.
#[derive(Debug, Default)]
pub struct SecurityCli {
    passwords: Mutex<HashMap<String, String>>,
}

impl SecurityCli {
    /// Creates the tool.
    pub fn new() -> Self {
        Self::default()
    }

    fn password_for(&self, keychain: &str) -> Option<String> {
        self.passwords
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(keychain)
            .cloned()
    }

    /// Current user keychain search list.
    async fn search_list() -> Result<Vec<String>> {
        let output = run_security(&["list-keychains", "-d", "user"], "list keychains").await?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

#[async_trait]
impl KeychainTool for SecurityCli {
    async fn create(&self, keychain: &str) -> Result<()> {
        let password = uuid::Uuid::new_v4().simple().to_string();

        run_security(&["create-keychain", "-p", &password, keychain], "create keychain").await?;
        self.passwords
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(keychain.to_string(), password.clone());

        run_security(&["unlock-keychain", "-p", &password, keychain], "unlock keychain").await?;

        // No auto-lock during long DMG builds
        if let Err(e) = run_security(
            &["set-keychain-settings", "-t", "3600", "-u", keychain],
            "set keychain settings",
        )
        .await
        {
            log::warn!("{}", e);
        }

        let mut list = vec![keychain.to_string()];
        list.extend(Self::search_list().await?);
        let mut args = vec!["list-keychains", "-d", "user", "-s"];
        args.extend(list.iter().map(String::as_str));
        run_security(&args, "add keychain to search list").await?;

        log::debug!("Created ephemeral keychain: {}", keychain);
        Ok(())
    }

    async fn import(
        &self,
        keychain: &str,
        certificate: &[u8],
        password: Option<&str>,
    ) -> Result<()> {
        let suffix = if password.is_some() { ".p12" } else { ".cer" };
        let file = tempfile::Builder::new()
            .prefix("csc-")
            .suffix(suffix)
            .tempfile()
            .map_err(|e| Error::CredentialSetup(format!("Failed to create temp file: {e}")))?;
        tokio::fs::write(file.path(), certificate)
            .await
            .map_err(|e| Error::CredentialSetup(format!("Failed to write certificate: {e}")))?;
        let cert_path = crate::bundler::error::path_str(file.path())?;

        let mut args = vec![
            "import",
            cert_path,
            "-k",
            keychain,
            "-T",
            "/usr/bin/codesign",
            "-T",
            "/usr/bin/productbuild",
        ];
        if let Some(password) = password {
            args.extend(["-P", password]);
        }
        run_security(&args, "import certificate").await?;

        // Lets codesign use the key without a UI prompt on headless machines
        if password.is_some() {
            if let Some(keychain_password) = self.password_for(keychain) {
                let partition = run_security(
                    &[
                        "set-key-partition-list",
                        "-S",
                        "apple-tool:,apple:,codesign:",
                        "-s",
                        "-k",
                        &keychain_password,
                        keychain,
                    ],
                    "set key partition list",
                )
                .await;
                if let Err(e) = partition {
                    log::warn!("{} (signing may still work)", e);
                }
            }
        }

        log::debug!("Imported certificate into keychain: {}", keychain);
        Ok(())
    }

    async fn identities(&self, keychain: &str) -> Result<Vec<String>> {
        let output = run_security(&["find-identity", "-v", keychain], "find identities").await?;
        Ok(parse_identities(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn delete(&self, keychain: &str) {
        match run_security(&["delete-keychain", keychain], "delete keychain").await {
            Ok(_) => log::debug!("Deleted ephemeral keychain: {}", keychain),
            Err(e) => log::warn!("{}", e),
        }
        self.passwords
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(keychain);
    }
}

async fn run_security(args: &[&str], action: &str) -> Result<Output> {
    log::debug!("security {}", args.first().copied().unwrap_or_default());

    let output = Command::new("security")
        .args(args)
        .output()
        .await
        .map_err(|e| Error::CredentialSetup(format!("Failed to {action}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::CredentialSetup(format!(
            "Failed to {action}: {}",
            stderr.trim()
        )));
    }

    Ok(output)
}

/// Extracts quoted identity names from `security find-identity` output.
///
/// ```text
///   1) 4E3F...A1 "Developer ID Application: Example Inc (TEAM123)"
///      1 valid identities found
/// ```
pub fn parse_identities(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.contains("CSSMERR"))
        .filter_map(|line| {
            let start = line.find('"')?;
            let end = line.rfind('"')?;
            (end > start + 1).then(|| line[start + 1..end].to_string())
        })
        .collect()
}

/// First identity matching the highest-priority prefix.
pub fn pick_identity(identities: &[String], prefixes: &[&str]) -> Option<String> {
    prefixes.iter().find_map(|prefix| {
        identities
            .iter()
            .find(|identity| identity.starts_with(prefix))
            .cloned()
    })
}

/// Loads certificate bytes from a locator.
///
/// Accepts a file path, a `file://` URL, an `http(s)://` URL, or inline
/// base64 data.
pub async fn load_certificate(locator: &str) -> Result<Vec<u8>> {
    let path_str = locator.strip_prefix("file://").unwrap_or(locator);
    let path = Path::new(path_str);
    if path.is_file() {
        return tokio::fs::read(path).await.map_err(|e| {
            Error::CredentialSetup(format!(
                "Failed to read certificate {}: {e}",
                path.display()
            ))
        });
    }

    if locator.starts_with("http://") || locator.starts_with("https://") {
        return http::download(locator).await.map_err(|e| {
            Error::CredentialSetup(format!("Failed to download certificate {locator}: {e}"))
        });
    }

    let compact: String = locator.split_whitespace().collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| {
            Error::CredentialSetup(format!(
                "Certificate is neither an existing file nor valid base64: {e}"
            ))
        })
}
