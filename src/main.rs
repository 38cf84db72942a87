//! Kodegen Bundler Mac - macOS packager for prebuilt .app bundles.
//!
//! This binary signs an .app bundle and creates DMG, ZIP, 7z and
//! Mac App Store packages from it.

use kodegen_bundler_mac::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
