//! macOS packaging: targets, variants, signing and distributable formats.
//!
//! # Pipeline
//!
//! For each architecture, one branch per [`BuildVariant`]:
//! 1. [`BundleBuilder`] produces the `.app` in the variant's output directory
//! 2. [`Signer`] signs it (and flattens it into a `.pkg` for the store)
//! 3. [`Distributor`] turns direct-distribution bundles into DMG and archives
//!
//! Signing credentials come from a session-wide [`CredentialManager`].

mod app;
mod archive;
mod artifact;
mod credentials;
mod distribute;
pub mod dmg;
mod keychain;
mod sign;
mod target;
mod variant;

pub use app::{BundleBuilder, PrebuiltBundleBuilder};
pub use archive::{ArchiveRequest, Archiver, SevenZipArchiver, seven_zip_args};
pub use artifact::{
    ArchiveSpec, Artifact, ArtifactFormat, ArtifactReporter, LogReporter, artifact_file_name,
};
pub use credentials::{CredentialContext, CredentialManager};
pub use distribute::{Distributor, archive_target};
pub use keychain::{
    APP_IDENTITY_PREFIXES, INSTALLER_IDENTITY_PREFIXES, KeychainTool, SecurityCli,
    generate_keychain_name, load_certificate, parse_identities, pick_identity,
};
pub use sign::{
    CodesignTool, FlatRequest, IdentityOverrides, SignRequest, Signer, SigningTool,
    codesign_args, productbuild_args,
};
pub use target::{Target, TargetSet};
pub use variant::BuildVariant;
