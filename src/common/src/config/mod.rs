use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "promcsv.toml";

/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "PROMCSV_";

/// Keys whose environment values are taken verbatim. Query expressions and
/// layouts such as `{job="a"}` or `2006` must not be parsed as TOML values.
const STRING_KEYS: [&str; 4] = ["url", "query", "delim", "date_format"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Configuration {
    /// Base address of the Prometheus server
    pub url: String,
    /// Query expression
    pub query: String,
    /// Range query start in Unix seconds; 0 or less issues an instant query
    pub start: i64,
    /// Range query end in Unix seconds; 0 or less means now
    pub end: i64,
    /// Range query resolution; zero means five minutes
    #[serde(with = "humantime_serde")]
    pub step: Duration,
    /// CSV field delimiter
    pub delim: String,
    /// Timestamp layout; `-` or empty prints raw seconds
    pub date_format: String,
    /// Render formatted timestamps in UTC instead of local time
    pub utc: bool,
    /// HTTP request timeout; none waits for the server indefinitely
    #[serde(with = "humantime_serde", default)]
    pub timeout: Option<Duration>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            url: String::from("http://localhost:9090/"),
            query: String::from("up"),
            start: 0,
            end: 0,
            step: Duration::ZERO,
            delim: String::from(";"),
            date_format: String::from("2006-01-02 15:04:05"),
            utc: false,
            timeout: None,
        }
    }
}

impl Configuration {
    /// Layered sources: defaults, TOML file, `PROMCSV_*` environment.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&STRING_KEYS))
            .merge(Serialized::defaults(string_env()))
    }

    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        Self::figment(path).extract().map_err(Box::new)
    }

    /// Load and apply overrides (typically command-line flags) on top.
    pub fn load_with<T: Serialize>(path: &Path, overrides: &T) -> Result<Self, Box<figment::Error>> {
        Self::figment(path)
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(Box::new)
    }
}

/// `PROMCSV_*` values for [`STRING_KEYS`], unparsed
fn string_env() -> BTreeMap<&'static str, String> {
    STRING_KEYS
        .iter()
        .filter_map(|key| {
            let name = format!("{ENV_PREFIX}{}", key.to_uppercase());
            std::env::var(name).ok().map(|value| (*key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_match_flag_defaults() {
        let config = Configuration::default();

        assert_eq!(config.url, "http://localhost:9090/");
        assert_eq!(config.query, "up");
        assert_eq!(config.start, 0);
        assert_eq!(config.end, 0);
        assert_eq!(config.step, Duration::ZERO);
        assert_eq!(config.delim, ";");
        assert_eq!(config.date_format, "2006-01-02 15:04:05");
        assert!(!config.utc);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_configless_operation() {
        Jail::expect_with(|_jail| {
            let config = Configuration::load().map_err(|e| *e)?;
            assert_eq!(config, Configuration::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                    url = "http://prom:9090/"
                    query = "rate(http_requests_total[5m])"
                    step = "30s"
                    timeout = "10s"
                "#,
            )?;
            jail.set_env("PROMCSV_QUERY", "up");
            jail.set_env("PROMCSV_DATE_FORMAT", "-");

            let config = Configuration::load().map_err(|e| *e)?;
            assert_eq!(config.url, "http://prom:9090/");
            assert_eq!(config.query, "up");
            assert_eq!(config.step, Duration::from_secs(30));
            assert_eq!(config.timeout, Some(Duration::from_secs(10)));
            assert_eq!(config.date_format, "-");
            Ok(())
        });
    }

    #[test]
    fn test_env_strings_are_not_parsed() {
        Jail::expect_with(|jail| {
            jail.set_env("PROMCSV_QUERY", r#"{job="a"}"#);
            jail.set_env("PROMCSV_DATE_FORMAT", "2006");
            jail.set_env("PROMCSV_START", "1700000000");

            let config = Configuration::load().map_err(|e| *e)?;
            assert_eq!(config.query, r#"{job="a"}"#);
            assert_eq!(config.date_format, "2006");
            assert_eq!(config.start, 1_700_000_000);

            jail.set_env("PROMCSV_QUERY", "1");
            jail.set_env("PROMCSV_URL", "http://[::1]:9090/");
            let config = Configuration::load().map_err(|e| *e)?;
            assert_eq!(config.query, "1");
            assert_eq!(config.url, "http://[::1]:9090/");
            Ok(())
        });
    }

    #[test]
    fn test_overrides_win() {
        #[derive(Serialize)]
        struct Flags {
            delim: &'static str,
        }

        Jail::expect_with(|jail| {
            jail.set_env("PROMCSV_DELIM", ",");
            let config =
                Configuration::load_with(Path::new(DEFAULT_CONFIG_FILE), &Flags { delim: "\t" })
                    .map_err(|e| *e)?;
            assert_eq!(config.delim, "\t");
            Ok(())
        });
    }

    #[test]
    fn test_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "start = 1700000000\nend = 1700003600\n").unwrap();

        let config = Configuration::load_from_path(&path).unwrap();
        assert_eq!(config.start, 1_700_000_000);
        assert_eq!(config.end, 1_700_003_600);
    }
}
