use std::net::SocketAddr;
use std::path::PathBuf;

use coincast_core::AppConfig;

use crate::error::ServerError;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_STATIC_DIR: &str = "static";

/// Web-only settings layered over the shared [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub app: AppConfig,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app = AppConfig::from_lookup(&lookup)?;
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_addr = get("COINCAST_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_owned());
        let addr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ServerError::InvalidAddr { value: raw_addr.clone() })?;

        let static_dir = get("COINCAST_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        Ok(Self {
            addr,
            static_dir,
            app,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coincast_core::ProviderId;

    #[test]
    fn defaults_bind_localhost_8000() {
        let settings = ServerSettings::from_lookup(|_| None).expect("defaults are valid");

        assert_eq!(settings.addr, SocketAddr::from(([127, 0, 0, 1], 8000)));
        assert_eq!(settings.static_dir, PathBuf::from("static"));
        assert_eq!(settings.app.provider, ProviderId::Cryptocompare);
    }

    #[test]
    fn rejects_unparseable_address() {
        let err = ServerSettings::from_lookup(|key| {
            (key == "COINCAST_ADDR").then(|| String::from("localhost"))
        })
        .expect_err("must fail");

        assert!(matches!(err, ServerError::InvalidAddr { .. }));
    }
}
