use std::{
    collections::BTreeMap,
    env,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The API URL used when neither the environment nor the config file sets one.
pub const DEFAULT_API_URL: &str = "https://api.tinybird.co";

/// An error encountered while loading or resolving a configuration profile.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The config file could not be read.
    #[error("Failed to load config file")]
    Io(#[from] io::Error),
    /// The config file is not valid YAML, or has the wrong shape.
    #[error("Invalid configuration")]
    Invalid(#[from] serde_yaml::Error),
    /// The requested profile is missing from the config file.
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),
    /// The token is not ASCII, so it can't be sent in a URL.
    #[error("Token contains invalid characters")]
    InvalidToken,
    /// Neither the environment nor the config file provides a token.
    #[error("No token found (set TB_ADMIN_TOKEN or add one to the config file)")]
    NoToken,
}

/// A fully resolved configuration profile: the API URL and admin token to
/// construct an [`ApiClient`](crate::ApiClient) with.
#[derive(Clone, Serialize)]
pub struct Profile {
    /// The name of the profile.
    pub name: String,
    /// The base URL of the API, e.g. `https://api.tinybird.co`.
    pub api_url: String,
    /// The token used to authenticate every request.
    #[serde(skip)]
    pub token: String,
    /// The user-agent used on requests. Intended for internal use.
    #[serde(skip)]
    pub user_agent: String,
    /// The config file this profile was loaded from, or the canonical one if
    /// no config file exists.
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("token", &"********")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// A profile stored in the config file.
#[derive(Debug, Default, Clone, Deserialize)]
struct ConfigProfile {
    api_url: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct Config {
    profiles: BTreeMap<String, ConfigProfile>,
}

impl Profile {
    /// Build a profile directly from an API URL and token, without reading
    /// any configuration.
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: "default".to_owned(),
            api_url: api_url.into(),
            token: token.into(),
            user_agent: make_ua(None),
            config_path: PathBuf::new(),
        }
    }

    /// Load the selected profile from the configuration file (usually
    /// ~/.config/tinybird.yaml). If no configuration file is present, then
    /// the configuration will be loaded solely from the environment.
    ///
    /// If `TB_PROFILE` is set, that will be used to select the profile.
    /// Otherwise the profile `default` will be used.
    ///
    /// The following environment variables override the corresponding
    /// values in the config file:
    ///
    /// | Environment Variable | Config Value |
    /// |----------------------|--------------|
    /// | `TB_ADMIN_TOKEN`     | `token`      |
    /// | `TB_API_URL`         | `api_url`    |
    pub fn from_default_env() -> Result<Self, Error> {
        if let Ok(s) = env::var("TB_PROFILE") {
            Self::from_env(&s)
        } else {
            Self::from_env("default")
        }
    }

    /// Load the given profile from the configuration file (usually
    /// ~/.config/tinybird.yaml), applying the `TB_ADMIN_TOKEN` and
    /// `TB_API_URL` overrides. If no configuration file is present, then the
    /// configuration will be loaded solely from the environment.
    pub fn from_env(name: &str) -> Result<Self, Error> {
        let config_path = find_config()?;
        Self::from_env_with_path(name, config_path)
    }

    fn from_env_with_path(name: &str, config_path: PathBuf) -> Result<Self, Error> {
        let token = env::var("TB_ADMIN_TOKEN").ok();
        let api_url = env::var("TB_API_URL").ok();

        let profile = match read_profile(&config_path, name) {
            Ok(p) => p,
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config file found");
                Default::default()
            }
            Err(e) => return Err(e),
        };

        let api_url = api_url
            .or(profile.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());

        let Some(token) = token.or(profile.token) else {
            return Err(Error::NoToken);
        };

        if !token.is_ascii() {
            return Err(Error::InvalidToken);
        }

        Ok(Self {
            name: name.to_owned(),
            api_url,
            token,
            user_agent: make_ua(None),
            config_path,
        })
    }

    /// Modifies the user-agent to have a different prefix. Intended for
    /// internal use.
    #[doc(hidden)]
    pub fn with_ua_product(self, ua_product: &str) -> Self {
        Self {
            user_agent: make_ua(Some(ua_product)),
            ..self
        }
    }

    /// Load the given profile (or 'default') from the given file, which must
    /// be a valid configuration file. Does not read any environment
    /// variables.
    ///
    /// Usually, you will want to use [Profile::from_env] instead.
    pub fn read(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self, Error> {
        let path = path.as_ref();
        let name = name.unwrap_or("default").to_owned();
        let profile = read_profile(path, &name)?;
        Self::from_raw(profile, name, path.to_owned())
    }

    /// Read all profiles from the given file, which must be a valid
    /// configuration file. Does not read any environment variables.
    pub fn read_all(path: impl AsRef<Path>) -> Result<impl Iterator<Item = Self>, Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;

        let profiles: Result<Vec<_>, Error> = config
            .profiles
            .into_iter()
            .map(|(name, raw)| Profile::from_raw(raw, name, path.to_owned()))
            .collect();

        Ok(profiles?.into_iter())
    }

    fn from_raw(raw: ConfigProfile, name: String, path: PathBuf) -> Result<Self, Error> {
        let ConfigProfile { api_url, token } = raw;

        let api_url = api_url.unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let token = token.ok_or(Error::NoToken)?;
        if !token.is_ascii() {
            return Err(Error::InvalidToken);
        }

        Ok(Self {
            name,
            api_url,
            token,
            user_agent: make_ua(None),
            config_path: path,
        })
    }
}

fn find_config() -> Result<PathBuf, Error> {
    let Some(home) = env::home_dir() else {
        return Err(Error::Io(io::Error::other(
            "No $HOME found for the current user",
        )));
    };

    let canonical = home.join(".config/tinybird.yaml");
    if canonical.exists() {
        return Ok(canonical);
    }

    // Try some fallback paths, and if that doesn't work, return the canonical
    // location.
    for fallback in [".config/tinybird.yml", ".tinybird/config.yaml"] {
        let path = home.join(fallback);
        if path.exists() {
            return Ok(path);
        }
    }

    Ok(canonical)
}

fn read_profile(p: &Path, name: &str) -> Result<ConfigProfile, Error> {
    let file = File::open(p)?;
    let mut config: Config = serde_yaml::from_reader(file).map_err(Error::Invalid)?;
    let Some(config_profile) = config.profiles.remove(name) else {
        return Err(Error::ProfileNotFound(name.to_string()));
    };

    debug!(path = %p.display(), "loaded config file");

    Ok(config_profile)
}

fn make_ua(product: Option<&str>) -> String {
    format!("{}/{}", product.unwrap_or("tinybird-rs"), env!("TB_VERSION"))
}
