//! Package metadata and configuration.

/// Package metadata and configuration.
///
/// Contains the naming information every artifact is derived from.
/// This typically maps from the `Cargo.toml` `[package]` section.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_mac::bundler::PackageSettings;
///
/// let settings = PackageSettings {
///     product_name: "MyApp".into(),
///     name: "my-app".into(),
///     version: "1.0.0".into(),
///     description: "An awesome application".into(),
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct PackageSettings {
    /// Product name displayed to users.
    ///
    /// Names the `.app` bundle and every file the bundler writes
    /// (`MyApp.app`, `MyApp-1.0.0.dmg`).
    pub product_name: String,

    /// Package name used for artifact display names.
    ///
    /// Usually `Cargo.toml` `package.name`.
    pub name: String,

    /// Version string in semantic versioning format.
    ///
    /// Example: "1.0.0", "0.2.3-beta.1"
    pub version: String,

    /// Brief description of the application.
    pub description: String,
}
