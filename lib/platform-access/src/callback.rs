//! Allow-list for post-login callback hosts.
//!
//! After OAuth completes the API redirects the browser back to the host that
//! started the login. That host must be the API itself, an exact entry in the
//! allow-list, or match a wildcard entry such as
//! `https://*.roleypoly.pages.dev`, where each `*` stands for one DNS label
//! (`[a-z0-9-]+`).

use regex::Regex;

/// Compiled callback host allow-list.
#[derive(Debug, Clone)]
pub struct CallbackHosts {
    api_public_uri: String,
    exact: Vec<String>,
    wildcards: Vec<Regex>,
}

impl CallbackHosts {
    /// Builds the allow-list from configuration.
    ///
    /// Entries containing `*` become full-match patterns; everything else
    /// in them is matched literally.
    #[must_use]
    pub fn new(api_public_uri: impl Into<String>, allowed: &[String]) -> Self {
        let (wild, exact): (Vec<&String>, Vec<&String>) =
            allowed.iter().partition(|host| host.contains('*'));

        let wildcards = wild
            .into_iter()
            .filter_map(|pattern| {
                let source = pattern
                    .split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join("[a-z0-9-]+");
                match Regex::new(&format!("^{source}$")) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!(pattern = %pattern, error = %e, "Ignoring invalid callback host pattern");
                        None
                    }
                }
            })
            .collect();

        Self {
            api_public_uri: api_public_uri.into(),
            exact: exact.into_iter().cloned().collect(),
            wildcards,
        }
    }

    /// Returns true if the browser may be sent back to `host`.
    #[must_use]
    pub fn is_allowed(&self, host: &str) -> bool {
        host == self.api_public_uri
            || self.exact.iter().any(|h| h == host)
            || self.wildcards.iter().any(|re| re.is_match(host))
    }
}
