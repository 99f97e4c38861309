//! Configuration management infrastructure.
//!
//! Persists signing preferences as a TOML profile so callers can keep a
//! default digest and message layout between runs.

use crate::domain::registry::AlgorithmRegistry;
use crate::domain::signed_data::SignedDataFlags;
use crate::infra::error::{PkiError, PkiResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Stored signing preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningProfile {
    /// Digest algorithm applied to content and signed attributes
    pub digest_algorithm: String,

    /// Whether produced messages leave the content out (detached layout)
    pub detached: bool,

    /// Whether signer certificates are embedded in produced messages
    pub embed_certificates: bool,
}

impl Default for SigningProfile {
    fn default() -> Self {
        Self {
            digest_algorithm: "sha256".to_string(),
            detached: false,
            embed_certificates: true,
        }
    }
}

impl SigningProfile {
    /// Translate the profile into message encoding flags.
    #[must_use]
    pub fn flags(&self) -> SignedDataFlags {
        let mut flags = SignedDataFlags::NONE;
        if self.detached {
            flags |= SignedDataFlags::DETACHED;
        }
        if !self.embed_certificates {
            flags |= SignedDataFlags::OMIT_CERTIFICATES;
        }
        flags
    }

    /// Check the profile against the algorithm registry.
    ///
    /// # Errors
    ///
    /// Returns [`PkiError::Config`] when the digest name is unknown.
    pub fn validate(&self, registry: &AlgorithmRegistry) -> PkiResult<()> {
        registry.digest(&self.digest_algorithm).map_err(|_| {
            PkiError::Config(format!(
                "unknown digest algorithm: {}",
                self.digest_algorithm
            ))
        })?;
        Ok(())
    }
}

/// Loads and saves the signing profile file
pub struct ProfileManager {
    profile_path: PathBuf,
}

impl ProfileManager {
    /// Create a manager pointing at the default profile location.
    #[must_use]
    pub fn new() -> Self {
        Self {
            profile_path: Self::default_profile_path(),
        }
    }

    /// Create a manager with a custom profile path.
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            profile_path: path.as_ref().to_path_buf(),
        }
    }

    /// Default profile file path under the user's configuration directory.
    #[must_use]
    pub fn default_profile_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("cmskit-profile.toml"),
            |dir| dir.join("cmskit").join("profile.toml"),
        )
    }

    /// Load the profile, falling back to defaults when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns error if an existing file cannot be read or parsed.
    pub fn load(&self) -> PkiResult<SigningProfile> {
        if !self.profile_path.exists() {
            log::debug!(
                "No profile at {}, using defaults",
                self.profile_path.display()
            );
            return Ok(SigningProfile::default());
        }

        let content = fs::read_to_string(&self.profile_path).map_err(|e| {
            PkiError::Config(format!(
                "failed to read profile {}: {}",
                self.profile_path.display(),
                e
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| PkiError::Config(format!("failed to parse profile: {e}")))
    }

    /// Save the profile, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be serialized or written.
    pub fn save(&self, profile: &SigningProfile) -> PkiResult<()> {
        if let Some(parent) = self.profile_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PkiError::Config(format!(
                    "failed to create profile directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(profile)
            .map_err(|e| PkiError::Config(format!("failed to serialize profile: {e}")))?;

        fs::write(&self.profile_path, content).map_err(|e| {
            PkiError::Config(format!(
                "failed to write profile {}: {}",
                self.profile_path.display(),
                e
            ))
        })?;

        log::info!("Profile saved to {}", self.profile_path.display());
        Ok(())
    }

    /// Path of the managed profile file.
    #[must_use]
    pub fn profile_path(&self) -> &Path {
        &self.profile_path
    }
}

impl Default for ProfileManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_profile() {
        let profile = SigningProfile::default();
        assert_eq!(profile.digest_algorithm, "sha256");
        assert!(!profile.detached);
        assert!(profile.embed_certificates);
        assert_eq!(profile.flags(), SignedDataFlags::NONE);
    }

    #[test]
    fn test_profile_flags() {
        let profile = SigningProfile {
            digest_algorithm: "sha384".to_string(),
            detached: true,
            embed_certificates: false,
        };
        let flags = profile.flags();
        assert!(flags.contains(SignedDataFlags::DETACHED));
        assert!(flags.contains(SignedDataFlags::OMIT_CERTIFICATES));
    }

    #[test]
    fn test_profile_validation() {
        let registry = AlgorithmRegistry::builtin();
        assert!(SigningProfile::default().validate(&registry).is_ok());

        let bad = SigningProfile {
            digest_algorithm: "md42".to_string(),
            ..SigningProfile::default()
        };
        assert!(matches!(bad.validate(&registry), Err(PkiError::Config(_))));
    }

    #[test]
    fn test_profile_round_trip_with_temp_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("profile.toml");
        let manager = ProfileManager::with_path(&path);

        // Missing file falls back to defaults.
        let profile = manager.load().unwrap();
        assert_eq!(profile.digest_algorithm, "sha256");

        let custom = SigningProfile {
            digest_algorithm: "sha512".to_string(),
            detached: true,
            embed_certificates: true,
        };
        manager.save(&custom).unwrap();
        assert!(path.exists());

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.digest_algorithm, "sha512");
        assert!(loaded.detached);
    }

    #[test]
    fn test_partial_profile_parses_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("profile.toml");
        std::fs::write(&path, "digest_algorithm = \"sha1\"\n").unwrap();

        let manager = ProfileManager::with_path(&path);
        let profile = manager.load().unwrap();
        assert_eq!(profile.digest_algorithm, "sha1");
        assert!(profile.embed_certificates);
    }
}
