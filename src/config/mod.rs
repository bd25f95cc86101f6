use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;

/// Bucket used when `ALLOWED_BUCKETS` is unset or empty
pub const DEFAULT_BUCKET: &str = "jiayu-test-phash";

/// Set of bucket identifiers the function may read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    buckets: BTreeSet<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new([DEFAULT_BUCKET])
    }
}

impl AllowList {
    pub fn new<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            buckets: buckets.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma separated list. Entries are trimmed and blanks dropped;
    /// an input with no usable entry falls back to the default bucket.
    pub fn parse(raw: &str) -> Self {
        let buckets: BTreeSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .collect();

        if buckets.is_empty() {
            Self::default()
        } else {
            Self { buckets }
        }
    }

    pub fn contains(&self, bucket: &str) -> bool {
        self.buckets.contains(bucket)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(String::as_str)
    }
}

/// Runtime configuration for the hashing function
#[derive(Debug, Clone)]
pub struct PhashConfig {
    /// Buckets that requests may name (env: ALLOWED_BUCKETS)
    pub allowed_buckets: AllowList,

    /// Directory for scratch files (env: SCRATCH_DIR, default: OS temp dir)
    pub scratch_dir: PathBuf,

    /// Largest object we are willing to download, in bytes.
    /// `None` disables the check (env: MAX_OBJECT_SIZE, `0` means none, default: 50 MB)
    pub max_object_size: Option<u64>,

    /// Endpoint override for S3-compatible stores (env: S3_ENDPOINT_URL)
    pub s3_endpoint_url: Option<String>,

    /// Path-style addressing, needed by MinIO (env: S3_FORCE_PATH_STYLE)
    pub s3_force_path_style: bool,
}

impl Default for PhashConfig {
    fn default() -> Self {
        Self {
            allowed_buckets: AllowList::default(),
            scratch_dir: env::temp_dir(),
            max_object_size: Some(50 * 1024 * 1024), // 50 MB
            s3_endpoint_url: None,
            s3_force_path_style: false,
        }
    }
}

impl PhashConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            allowed_buckets: lookup("ALLOWED_BUCKETS")
                .map(|v| AllowList::parse(&v))
                .unwrap_or(default.allowed_buckets),

            scratch_dir: lookup("SCRATCH_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.scratch_dir),

            max_object_size: match lookup("MAX_OBJECT_SIZE").and_then(|v| v.parse::<u64>().ok()) {
                Some(0) => None,
                Some(limit) => Some(limit),
                None => default.max_object_size,
            },

            s3_endpoint_url: lookup("S3_ENDPOINT_URL").filter(|v| !v.trim().is_empty()),

            s3_force_path_style: lookup("S3_FORCE_PATH_STYLE")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.s3_force_path_style),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PhashConfig::default();
        assert!(config.allowed_buckets.contains(DEFAULT_BUCKET));
        assert_eq!(config.allowed_buckets.len(), 1);
        assert_eq!(config.max_object_size, Some(50 * 1024 * 1024));
        assert!(config.s3_endpoint_url.is_none());
        assert!(!config.s3_force_path_style);
    }

    #[test]
    fn test_unset_allow_list_uses_default_bucket() {
        let config = PhashConfig::from_lookup(lookup_from(&[]));
        assert!(config.allowed_buckets.contains("jiayu-test-phash"));
        assert!(!config.allowed_buckets.contains("other-bucket"));
    }

    #[test]
    fn test_allow_list_membership_with_several_buckets() {
        let config = PhashConfig::from_lookup(lookup_from(&[(
            "ALLOWED_BUCKETS",
            "photos, thumbs ,,archive",
        )]));
        let allowed = &config.allowed_buckets;
        assert_eq!(allowed.len(), 3);
        assert!(allowed.contains("photos"));
        assert!(allowed.contains("thumbs"));
        assert!(allowed.contains("archive"));
        assert!(!allowed.contains("jiayu-test-phash"));
        assert!(!allowed.contains(""));
    }

    #[test]
    fn test_blank_allow_list_falls_back() {
        assert_eq!(AllowList::parse(" , ,"), AllowList::default());
    }

    #[test]
    fn test_object_size_and_s3_settings() {
        let config = PhashConfig::from_lookup(lookup_from(&[
            ("MAX_OBJECT_SIZE", "0"),
            ("S3_ENDPOINT_URL", "http://127.0.0.1:9000"),
            ("S3_FORCE_PATH_STYLE", "TRUE"),
            ("SCRATCH_DIR", "/var/tmp/phash"),
        ]));
        assert_eq!(config.max_object_size, None);
        assert_eq!(
            config.s3_endpoint_url.as_deref(),
            Some("http://127.0.0.1:9000")
        );
        assert!(config.s3_force_path_style);
        assert_eq!(config.scratch_dir, PathBuf::from("/var/tmp/phash"));

        let config = PhashConfig::from_lookup(lookup_from(&[("MAX_OBJECT_SIZE", "not-a-number")]));
        assert_eq!(config.max_object_size, Some(50 * 1024 * 1024));
    }
}
