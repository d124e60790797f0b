use semver::Version;
use serde::{Deserialize, Serialize};

/// First enterprise release that ships the federation images in place of
/// the grpcserver images.
pub const FEDERATION_CUTOVER: Version = Version::new(1, 7, 0);

const OPEN_SOURCE_IMAGES: &[&str] = &[
    "gateway",
    "discovery",
    "gloo",
    "gloo-envoy-wrapper",
    "ingress",
    "access-logger",
    "sds",
    "certgen",
];

const ENTERPRISE_IMAGES: &[&str] = &[
    "rate-limit-ee",
    "gloo-ee",
    "gloo-ee-envoy-wrapper",
    "observability-ee",
    "extauth-ee",
    "ext-auth-plugins",
];

const GRPCSERVER_IMAGES: &[&str] = &["grpcserver-ee", "grpcserver-envoy", "grpcserver-ui"];

const FEDERATION_IMAGES: &[&str] = &[
    "gloo-fed",
    "gloo-fed-apiserver",
    "gloo-fed-apiserver-envoy",
    "gloo-federation-console",
    "gloo-fed-rbac-validating-webhook",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    #[value(name = "oss", alias = "open-source")]
    OpenSource,
    #[value(name = "enterprise", alias = "ee")]
    Enterprise,
}

impl Edition {
    /// Name used in the "latest release" headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Edition::OpenSource => "Gloo Open Source",
            Edition::Enterprise => "Gloo Enterprise",
        }
    }

    /// Name used in the per-image headings.
    pub fn image_label(&self) -> &'static str {
        match self {
            Edition::OpenSource => "Gloo",
            Edition::Enterprise => "Gloo Enterprise",
        }
    }

    /// Directory holding this edition's reports in the scan bucket.
    pub fn bucket_dir(&self) -> &'static str {
        match self {
            Edition::OpenSource => "gloo",
            Edition::Enterprise => "glooe",
        }
    }

    /// Returns the images shipped by the release at `version`.
    ///
    /// Enterprise releases before [`FEDERATION_CUTOVER`] carry the
    /// grpcserver images; later ones carry the federation images.
    pub fn images_for(&self, version: &Version) -> Vec<&'static str> {
        match self {
            Edition::OpenSource => OPEN_SOURCE_IMAGES.to_vec(),
            Edition::Enterprise => {
                let extra = if *version >= FEDERATION_CUTOVER {
                    FEDERATION_IMAGES
                } else {
                    GRPCSERVER_IMAGES
                };
                ENTERPRISE_IMAGES.iter().chain(extra).copied().collect()
            }
        }
    }
}

impl std::fmt::Display for Edition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_source_images_ignore_version() {
        let old = Edition::OpenSource.images_for(&Version::new(1, 2, 0));
        let new = Edition::OpenSource.images_for(&Version::new(1, 9, 0));
        assert_eq!(old, new);
        assert_eq!(old.len(), 8);
        assert_eq!(old[0], "gateway");
        assert_eq!(old[7], "certgen");
    }

    #[test]
    fn test_enterprise_before_cutover() {
        let images = Edition::Enterprise.images_for(&Version::new(1, 6, 9));
        assert_eq!(images.len(), 9);
        assert!(images.contains(&"grpcserver-ui"));
        assert!(!images.contains(&"gloo-fed"));
    }

    #[test]
    fn test_enterprise_at_cutover() {
        let images = Edition::Enterprise.images_for(&Version::new(1, 7, 0));
        assert_eq!(images.len(), 11);
        assert!(images.contains(&"gloo-fed-rbac-validating-webhook"));
        assert!(!images.contains(&"grpcserver-ee"));
        assert_eq!(&images[..6], ENTERPRISE_IMAGES);
    }

    #[test]
    fn test_enterprise_prerelease_of_cutover_is_legacy() {
        let version = Version::parse("1.7.0-beta1").unwrap();
        let images = Edition::Enterprise.images_for(&version);
        assert!(images.contains(&"grpcserver-envoy"));
    }

    #[test]
    fn test_edition_names() {
        assert_eq!(Edition::OpenSource.bucket_dir(), "gloo");
        assert_eq!(Edition::Enterprise.bucket_dir(), "glooe");
        assert_eq!(Edition::Enterprise.to_string(), "Gloo Enterprise");
        assert_eq!(Edition::OpenSource.image_label(), "Gloo");
    }
}
