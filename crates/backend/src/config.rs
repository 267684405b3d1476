use std::path::PathBuf;

/// Server settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Directory holding one `<collection>.json` file per collection.
    pub data_dir: PathBuf,
    /// Directory of the built frontend (`index.html`, bundles).
    pub dist_dir: PathBuf,
    /// Directory served under `/static`.
    pub assets_dir: PathBuf,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            data_dir: PathBuf::from("data"),
            dist_dir: PathBuf::from("dist"),
            assets_dir: PathBuf::from("assets"),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or unparsable values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(port = %raw, "Invalid PORT, using {}", defaults.port);
                defaults.port
            }),
            None => defaults.port,
        };
        ServerConfig {
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            dist_dir: lookup("DIST_DIR").map(PathBuf::from).unwrap_or(defaults.dist_dir),
            assets_dir: lookup("ASSETS_DIR").map(PathBuf::from).unwrap_or(defaults.assets_dir),
            port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(ServerConfig::from_lookup(|_| None), ServerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("DATA_DIR", "/srv/map-data"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_dir, PathBuf::from("/srv/map-data"));
        assert_eq!(config.dist_dir, PathBuf::from("dist"));
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = ServerConfig::from_lookup(lookup_from(&[("PORT", "eighty")]));
        assert_eq!(config.port, 3000);
    }
}
