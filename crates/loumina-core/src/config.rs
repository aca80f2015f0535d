use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::path::PathBuf;

use crate::corpus::DEFAULT_EXTENSIONS;
use crate::error::{Error, Result};

pub const ENV_PREFIX: &str = "LOUMINA_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub corpus_root: String,
    pub state_dir: String,
    #[serde(deserialize_with = "string_or_list")]
    pub extensions: Vec<String>,
    pub retrieval: RetrievalSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub k: usize,
    pub alpha: f64,
    pub half_life_days: f64,
    pub max_vocab: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            corpus_root: ".".to_string(),
            state_dir: "state".to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k: 5,
            alpha: 0.6,
            half_life_days: 30.0,
            max_vocab: 4096,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(Error::InvalidConfig("extensions must not be empty".into()));
        }
        let r = &self.retrieval;
        if r.k == 0 {
            return Err(Error::InvalidConfig("retrieval.k must be at least 1".into()));
        }
        if r.max_vocab == 0 {
            return Err(Error::InvalidConfig("retrieval.max_vocab must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&r.alpha) {
            return Err(Error::InvalidConfig(format!(
                "retrieval.alpha must be in [0, 1], got {}",
                r.alpha
            )));
        }
        if !r.half_life_days.is_finite() || r.half_life_days <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "retrieval.half_life_days must be positive, got {}",
                r.half_life_days
            )));
        }
        Ok(())
    }

    /// `corpus_root` after `~`/`$VAR` expansion.
    pub fn corpus_root_path(&self) -> PathBuf {
        expand_path(&self.corpus_root)
    }

    pub fn state_dir_path(&self) -> PathBuf {
        expand_path(&self.state_dir)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

// LOUMINA_EXTS arrives as ".md,.txt"; config files may use a list.
fn string_or_list<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(match StringOrList::deserialize(d)? {
        StringOrList::One(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        StringOrList::Many(v) => v,
    })
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("loumina.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("loumina.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("loumina.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("loumina.test.toml")),
            _ => {}
        }
        figment = figment.merge(Self::env_provider());

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    // Short aliases kept for deployments that already export them.
    fn env_provider() -> Env {
        Env::prefixed(ENV_PREFIX).map(|key| {
            let key = key.as_str().to_ascii_lowercase();
            match key.as_str() {
                "state" => "state_dir".into(),
                "exts" => "extensions".into(),
                "freshness_halflife" => "retrieval.half_life_days".into(),
                _ => key.replace("__", ".").into(),
            }
        })
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Typed, validated view of the merged configuration.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
