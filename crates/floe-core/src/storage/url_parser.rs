//! URL parsing for storage backends.
//!
//! Extracts backend configuration from the `bucket` option, which may be any
//! of the URL forms accepted by S3, GCS, Azure or a local filesystem path.

use object_store::path::Path;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::error::{InvalidUrlSnafu, StorageError};

use super::{AzureConfig, GcsConfig, LocalConfig, S3Config};

const S3_PATH: &str =
    r"^https://s3\.(?P<region>[\w\-]+)\.amazonaws\.com/(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";
const S3_VIRTUAL: &str =
    r"^https://(?P<bucket>[a-z0-9\-\.]+)\.s3\.(?P<region>[\w\-]+)\.amazonaws\.com(/(?P<key>.+))?$";
const S3_URL: &str = r"^[sS]3[aA]?://(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";
const S3_ENDPOINT_URL: &str = r"^[sS]3[aA]?::(?<protocol>https?)://(?P<endpoint>[^:/]+):(?<port>\d+)/(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";

const GCS_VIRTUAL: &str =
    r"^https://(?P<bucket>[a-z0-9\-_\.]+)\.storage\.googleapis\.com(/(?P<key>.+))?$";
const GCS_PATH: &str =
    r"^https://storage\.googleapis\.com/(?P<bucket>[a-z0-9\-_\.]+)(/(?P<key>.+))?$";
const GCS_URL: &str = r"^[gG][sS]://(?P<bucket>[a-z0-9\-\._]+)(/(?P<key>.+))?$";

const ABFS_URL: &str = r"^abfss?://(?P<container>[a-z0-9\-]+)@(?P<account>[a-z0-9]+)\.dfs\.core\.windows\.net(/(?P<key>.+))?$";
const AZURE_HTTPS: &str = r"^https://(?P<account>[a-z0-9]+)\.(blob|dfs)\.core\.windows\.net/(?P<container>[a-z0-9\-]+)(/(?P<key>.+))?$";

const FILE_URI: &str = r"^file://(?P<path>.*)$";
const FILE_URL: &str = r"^file:(?P<path>.*)$";
const FILE_PATH: &str = r"^/(?P<path>.*)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    S3,
    Gcs,
    Azure,
    Local,
}

/// Patterns in match priority order. More specific forms come first so that
/// e.g. an S3 endpoint URL is not mistaken for a plain `s3://` URL.
static MATCHERS: LazyLock<Vec<(Backend, Regex)>> = LazyLock::new(|| {
    [
        (Backend::S3, S3_PATH),
        (Backend::S3, S3_VIRTUAL),
        (Backend::S3, S3_ENDPOINT_URL),
        (Backend::S3, S3_URL),
        (Backend::Gcs, GCS_PATH),
        (Backend::Gcs, GCS_VIRTUAL),
        (Backend::Gcs, GCS_URL),
        (Backend::Azure, ABFS_URL),
        (Backend::Azure, AZURE_HTTPS),
        (Backend::Local, FILE_URI),
        (Backend::Local, FILE_URL),
        (Backend::Local, FILE_PATH),
    ]
    .into_iter()
    .map(|(backend, pattern)| (backend, Regex::new(pattern).expect("Invalid URL pattern")))
    .collect()
});

/// Backend configuration enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    S3(S3Config),
    Gcs(GcsConfig),
    Azure(AzureConfig),
    Local(LocalConfig),
}

impl BackendConfig {
    /// Parse a storage URL into a backend configuration.
    ///
    /// A trailing slash is ignored: `s3://bucket/` and `s3://bucket` are the same root.
    pub fn parse_url(url: &str) -> Result<Self, StorageError> {
        let trimmed = match url.trim_end_matches('/') {
            "" => url,
            trimmed => trimmed,
        };

        let Some((backend, captures)) = MATCHERS
            .iter()
            .find_map(|(backend, regex)| regex.captures(trimmed).map(|c| (*backend, c)))
        else {
            return InvalidUrlSnafu {
                url: url.to_string(),
            }
            .fail();
        };

        match backend {
            Backend::S3 => Ok(Self::parse_s3(&captures)),
            Backend::Gcs => Ok(Self::parse_gcs(&captures)),
            Backend::Azure => Ok(Self::parse_azure(&captures)),
            Backend::Local => Ok(Self::parse_local(&captures)),
        }
    }

    fn parse_s3(captures: &Captures) -> Self {
        let region = std::env::var("AWS_DEFAULT_REGION")
            .ok()
            .or_else(|| captures.name("region").map(|m| m.as_str().to_string()));

        let endpoint = std::env::var("AWS_ENDPOINT").ok().or_else(|| {
            captures.name("endpoint").map(|endpoint| {
                let port = captures
                    .name("port")
                    .and_then(|p| p.as_str().parse::<u16>().ok())
                    .unwrap_or(443);
                let protocol = captures
                    .name("protocol")
                    .map(|p| p.as_str())
                    .unwrap_or("https");
                format!("{protocol}://{}:{port}", endpoint.as_str())
            })
        });

        BackendConfig::S3(S3Config {
            endpoint,
            region,
            bucket: capture(captures, "bucket"),
            key: key(captures),
        })
    }

    fn parse_gcs(captures: &Captures) -> Self {
        BackendConfig::Gcs(GcsConfig {
            bucket: capture(captures, "bucket"),
            key: key(captures),
        })
    }

    fn parse_azure(captures: &Captures) -> Self {
        BackendConfig::Azure(AzureConfig {
            account: capture(captures, "account"),
            container: capture(captures, "container"),
            key: key(captures),
        })
    }

    fn parse_local(captures: &Captures) -> Self {
        let path = capture(captures, "path");
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        BackendConfig::Local(LocalConfig { path })
    }

    /// The key prefix inside the bucket, if the URL carried one.
    pub(crate) fn key(&self) -> Option<&Path> {
        match self {
            BackendConfig::S3(s3) => s3.key.as_ref(),
            BackendConfig::Gcs(gcs) => gcs.key.as_ref(),
            BackendConfig::Azure(azure) => azure.key.as_ref(),
            // The local root already includes the full path
            BackendConfig::Local(_) => None,
        }
    }
}

/// Every pattern names the groups it is matched against.
fn capture(captures: &Captures, group: &str) -> String {
    captures
        .name(group)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn key(captures: &Captures) -> Option<Path> {
    captures.name("key").map(|m| Path::from(m.as_str()))
}
