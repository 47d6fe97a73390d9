use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{ConfigError, ConfigResult};

/// Environment variable pointing at an explicit config file.
pub static CONFIG_PATH_VAR: &str = "EDUPORTAL_CONFIG";

static LOCAL_CONFIG: &str = "./config.toml";

/// Where a config file may live, in lookup order.
#[derive(Debug, Default)]
struct Lookup {
    explicit: Option<OsString>,
    home: Option<OsString>,
    use_local: bool,
}

impl Lookup {
    fn from_env(use_local: bool) -> Self {
        Self {
            explicit: std::env::var_os(CONFIG_PATH_VAR),
            home: std::env::var_os("HOME"),
            use_local,
        }
    }

    fn user_config(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| {
            Path::new(home)
                .join(".config")
                .join(crate::APPLICATION_NAME)
                .join("config.toml")
        })
    }

    /// An explicit path wins even when the file is missing.
    fn resolve(&self) -> PathBuf {
        if let Some(explicit) = &self.explicit {
            return PathBuf::from(explicit);
        }
        if self.use_local {
            return PathBuf::from(LOCAL_CONFIG);
        }

        self.user_config()
            .filter(|path| path.exists())
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG))
    }
}

pub fn find_config_file(use_local: bool) -> PathBuf {
    Lookup::from_env(use_local).resolve()
}

pub fn read_config(use_local: bool) -> ConfigResult<Vec<u8>> {
    let filename = find_config_file(use_local);

    tracing::trace!("looking for config at: {}", filename.display());
    if !filename.exists() {
        return Err(ConfigError::ConfigNotFound);
    }

    let filename = filename.canonicalize()?;
    debug!("loading eduportal config from {}", filename.display());

    Ok(std::fs::read(filename)?)
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn local_lookup_uses_working_directory() {
        let lookup = Lookup {
            use_local: true,
            ..Default::default()
        };
        assert_eq!(lookup.resolve(), PathBuf::from(LOCAL_CONFIG));
    }

    #[test]
    fn explicit_path_beats_everything() {
        let lookup = Lookup {
            explicit: Some("/etc/eduportal/prod.toml".into()),
            home: Some("/home/nobody".into()),
            use_local: true,
        };
        assert_eq!(lookup.resolve(), PathBuf::from("/etc/eduportal/prod.toml"));
    }

    #[test]
    fn user_config_is_used_when_present() {
        let home = tempfile::tempdir().unwrap();
        let dir = home.path().join(".config").join(crate::APPLICATION_NAME);
        fs::create_dir_all(&dir).unwrap();
        let config_file = dir.join("config.toml");
        fs::write(&config_file, "[host]").unwrap();

        let lookup = Lookup {
            home: Some(home.path().into()),
            ..Default::default()
        };
        assert_eq!(lookup.resolve(), config_file);
    }

    #[test]
    fn missing_user_config_falls_back_to_local() {
        let home = tempfile::tempdir().unwrap();
        let lookup = Lookup {
            home: Some(home.path().into()),
            ..Default::default()
        };
        assert_eq!(lookup.resolve(), PathBuf::from(LOCAL_CONFIG));
    }
}
