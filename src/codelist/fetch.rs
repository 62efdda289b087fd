use super::{Codelist, CodelistSource, parse_codelist_csv};
use crate::config::AppConfig;
use crate::error::{BodsError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Downloads codelist CSVs from the published data standard.
pub struct RemoteCodelists {
    client: reqwest::blocking::Client,
    base_url: String,
    version: String,
    cache_dir: Option<PathBuf>,
}

impl RemoteCodelists {
    /// # Errors
    ///
    /// Returns [`BodsError::Codelist`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bodsight/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            version: version.into(),
            cache_dir: None,
        })
    }

    /// # Errors
    ///
    /// Returns [`BodsError::Codelist`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            config.codelist_base_url.clone(),
            config.standard_version.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?
        .with_cache_dir(config.codelist_cache_dir.clone()))
    }

    /// Fetched lists are stored under `<dir>/<version>/` and reused from there.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cache_dir = dir;
        self
    }

    pub fn url(&self, list: Codelist) -> String {
        list.url(&self.base_url, &self.version)
    }

    fn cache_path(&self, list: Codelist) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| {
            dir.join(&self.version)
                .join(format!("{}.csv", list.file_stem()))
        })
    }

    fn download(&self, list: Codelist) -> Result<Vec<u8>> {
        let url = self.url(list);
        tracing::debug!("Fetching codelist {list} from {url}");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(BodsError::Codelist(format!(
                "{url} returned HTTP {status}"
            )));
        }
        Ok(response.bytes()?.to_vec())
    }

    fn store(&self, list: Codelist, bytes: &[u8]) {
        let Some(path) = self.cache_path(list) else {
            return;
        };
        let written = path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&path, bytes));
        if let Err(e) = written {
            tracing::warn!("Could not cache codelist {list} at {}: {e}", path.display());
        }
    }
}

impl CodelistSource for RemoteCodelists {
    fn codes(&self, list: Codelist) -> Result<Vec<String>> {
        if let Some(path) = self.cache_path(list)
            && path.is_file()
        {
            tracing::debug!("Using cached codelist {}", path.display());
            let bytes = std::fs::read(&path)?;
            return parse_codelist_csv(&bytes);
        }

        let bytes = self.download(list)?;
        let codes = parse_codelist_csv(&bytes)?;
        self.store(list, &bytes);
        tracing::info!("Loaded {} codes for {list}", codes.len());
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const PERSON_TYPES: &str = "code,title\nknownPerson,Known\nanonymousPerson,Anonymous\nunknownPerson,Unknown\n";

    #[test]
    fn test_fetch_from_server() -> Result<()> {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/0.2.0/schema/codelists/personType.csv");
            then.status(200).body(PERSON_TYPES);
        });

        let source = RemoteCodelists::new(server.base_url(), "0.2.0", Duration::from_secs(5))?;
        let codes = source.codes(Codelist::PersonType)?;

        mock.assert();
        assert_eq!(codes, vec!["knownPerson", "anonymousPerson", "unknownPerson"]);
        Ok(())
    }

    #[test]
    fn test_http_error_status() -> Result<()> {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(404);
        });

        let source = RemoteCodelists::new(server.base_url(), "9.9.9", Duration::from_secs(5))?;
        let err = source
            .codes(Codelist::EntityType)
            .expect_err("404 must fail");
        assert!(matches!(err, BodsError::Codelist(_)));
        assert!(err.to_string().contains("404"));
        Ok(())
    }

    #[test]
    fn test_cache_is_written_then_reused() -> Result<()> {
        let cache = tempfile::tempdir()?;
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/0.2.0/schema/codelists/personType.csv");
            then.status(200).body(PERSON_TYPES);
        });

        let source = RemoteCodelists::new(server.base_url(), "0.2.0", Duration::from_secs(5))?
            .with_cache_dir(Some(cache.path().to_path_buf()));

        let first = source.codes(Codelist::PersonType)?;
        let second = source.codes(Codelist::PersonType)?;

        mock.assert_hits(1);
        assert_eq!(first, second);
        assert!(cache.path().join("0.2.0").join("personType.csv").is_file());
        Ok(())
    }

    #[test]
    fn test_cached_file_skips_network() -> Result<()> {
        let cache = tempfile::tempdir()?;
        let dir = cache.path().join("0.2.0");
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("interestLevel.csv"), "code\ndirect\nindirect\nunknown\n")?;

        // Nothing listens on this address; only the cache can answer.
        let source = RemoteCodelists::new("http://127.0.0.1:9", "0.2.0", Duration::from_secs(1))?
            .with_cache_dir(Some(cache.path().to_path_buf()));
        let codes = source.codes(Codelist::InterestLevel)?;
        assert_eq!(codes, vec!["direct", "indirect", "unknown"]);
        Ok(())
    }
}
