use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

/// Default status codes excluded from schema inference ("no content").
const DEFAULT_SKIP_STATUSES: [u16; 1] = [204];
/// Default network timeout in milliseconds.
const DEFAULT_TIMEOUT: u64 = 30_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// request options for the transport
    pub request: RequestConfig,
    /// ordered keys used to unwrap an envelope response down to its payload
    pub data_path: Vec<String>,
    /// validation mode, defaults to lenient
    pub mode: Mode,
    /// status codes skipped from schema inference but counted successful
    pub skip_statuses: Vec<u16>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// base url prepended to relative routes
    pub base_url: String,
    /// default headers sent with every request
    pub headers: HashMap<String, String>,
    /// request timeout in milliseconds
    pub timeout: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            headers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Validation mode: lenient auto-patches what it can, strict turns every
/// auto-patch (unnamed routes, duplicate names, undocumented statuses) into
/// a hard failure.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    #[default]
    Lenient,
    Strict,
}

impl Mode {
    pub fn is_strict(&self) -> bool {
        matches!(self, Mode::Strict)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request: RequestConfig::default(),
            data_path: Vec::new(),
            mode: Mode::default(),
            skip_statuses: DEFAULT_SKIP_STATUSES.to_vec(),
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Self {
        let data = fs::read_to_string(path.as_ref()).expect(&format!("failed to load config file {:?}", path.as_ref()));

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Self {
        let config = toml::from_str::<Config>(toml_str).expect("failed to parse the toml str");
        config
    }
}

#[cfg(test)]
mod test {
    use crate::{Config, Mode};

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        data_path = ["data"]
        mode = "strict"
        skip_statuses = [204, 404]

        [request]
        base_url = "http://localhost:3000"
        timeout = 5000

        [request.headers]
        x-api-version = "1"
        "#;
        let config = Config::load_from_str(toml_str);
        assert_eq!(config.data_path, ["data"]);
        assert_eq!(config.mode, Mode::Strict);
        assert_eq!(config.skip_statuses, [204, 404]);
        assert_eq!(config.request.base_url, "http://localhost:3000");
        assert_eq!(config.request.timeout, 5000);
        assert_eq!(config.request.headers["x-api-version"], "1");
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("");
        assert_eq!(config.mode, Mode::Lenient);
        assert_eq!(config.skip_statuses, [204]);
        assert_eq!(config.request.timeout, 30_000);
        assert!(config.data_path.is_empty());
    }
}
