//! Target resolution.
//!
//! Turns the user's raw target list into a validated [`TargetSet`]. Pure:
//! no I/O happens here, so an unknown token fails before anything is built.

use crate::bundler::error::{Error, Result};
use std::fmt;

/// One requested output kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Target {
    /// DMG plus a ZIP labelled for the update channel.
    Default,
    /// Disk image (`dmg`).
    Dmg,
    /// ZIP archive (`zip`).
    Zip,
    /// Mac App Store installer package (`mas`).
    Mas,
    /// 7z archive (`7z`).
    SevenZip,
}

impl Target {
    /// Canonical token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Default => "default",
            Target::Dmg => "dmg",
            Target::Zip => "zip",
            Target::Mas => "mas",
            Target::SevenZip => "7z",
        }
    }

    /// Parses a token, accepting the long aliases.
    pub fn parse(token: &str) -> Result<Self> {
        match token.trim() {
            "default" => Ok(Target::Default),
            "dmg" | "disk-image" => Ok(Target::Dmg),
            "zip" | "archive" => Ok(Target::Zip),
            "mas" | "store-package" => Ok(Target::Mas),
            "7z" | "light-archive" => Ok(Target::SevenZip),
            _ => Err(Error::InvalidTarget {
                target: token.to_string(),
            }),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, duplicate-free, non-empty set of targets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TargetSet(Vec<Target>);

impl TargetSet {
    /// Resolves raw tokens into a target set.
    ///
    /// `None` or an empty list resolves to `{default}`. Duplicates collapse
    /// to their first occurrence. Any unknown token fails the whole list.
    ///
    /// ```
    /// use kodegen_bundler_mac::bundler::{Target, TargetSet};
    ///
    /// let targets = TargetSet::resolve(None::<&[&str]>).unwrap();
    /// assert_eq!(targets.as_slice(), &[Target::Default]);
    ///
    /// let err = TargetSet::resolve(Some(&["dmg", "pkg"][..])).unwrap_err();
    /// assert_eq!(err.to_string(), "Unknown target: pkg");
    /// ```
    pub fn resolve<S: AsRef<str>>(raw: Option<&[S]>) -> Result<Self> {
        let mut targets = Vec::new();
        for token in raw.unwrap_or_default() {
            let target = Target::parse(token.as_ref())?;
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        if targets.is_empty() {
            targets.push(Target::Default);
        }

        Ok(Self(targets))
    }

    /// Whether `target` was requested.
    pub fn contains(&self, target: Target) -> bool {
        self.0.contains(&target)
    }

    /// Targets in request order.
    pub fn iter(&self) -> impl Iterator<Item = Target> + '_ {
        self.0.iter().copied()
    }

    /// Targets in request order.
    pub fn as_slice(&self) -> &[Target] {
        &self.0
    }

    /// A Mac App Store package was requested.
    pub fn wants_store_variant(&self) -> bool {
        self.contains(Target::Mas)
    }

    /// Anything besides the Mac App Store package was requested.
    pub fn wants_direct_variant(&self) -> bool {
        self.0.iter().any(|t| *t != Target::Mas)
    }
}

impl fmt::Display for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Target::as_str).collect();
        f.write_str(&names.join(", "))
    }
}
