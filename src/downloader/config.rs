// Engine configuration: tool overrides and network settings

use std::path::PathBuf;

pub const ENV_YTDLP: &str = "VIDFETCH_YTDLP";
pub const ENV_FFMPEG: &str = "VIDFETCH_FFMPEG";
pub const ENV_PROXY: &str = "VIDFETCH_PROXY";
pub const ENV_SOCKET_TIMEOUT: &str = "VIDFETCH_SOCKET_TIMEOUT";

/// Network configuration passed through to yt-dlp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// SOCKS5/HTTP proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Socket timeout in seconds
    pub timeout: Option<u32>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Some(30),
        }
    }
}

impl NetworkConfig {
    /// Build proxy and timeout arguments for yt-dlp
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        if let Some(timeout) = self.timeout {
            args.push("--socket-timeout".to_string());
            args.push(timeout.to_string());
        }

        args
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Explicit yt-dlp binary; otherwise looked up on PATH
    pub ytdlp_path: Option<PathBuf>,
    /// Explicit ffmpeg binary; otherwise looked up on PATH
    pub ffmpeg_path: Option<PathBuf>,
    pub network: NetworkConfig,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with a caller-supplied variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self::default();
        config.ytdlp_path = non_empty(ENV_YTDLP).map(PathBuf::from);
        config.ffmpeg_path = non_empty(ENV_FFMPEG).map(PathBuf::from);
        config.network.proxy = non_empty(ENV_PROXY);

        if let Some(raw) = non_empty(ENV_SOCKET_TIMEOUT) {
            match raw.parse::<u32>() {
                Ok(seconds) => config.network.timeout = Some(seconds),
                Err(e) => tracing::warn!(value = %raw, error = %e, "ignoring invalid {}", ENV_SOCKET_TIMEOUT),
            }
        }

        config
    }

    pub fn with_ytdlp_path(mut self, path: Option<PathBuf>) -> Self {
        self.ytdlp_path = path;
        self
    }

    pub fn with_ffmpeg_path(mut self, path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = path;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.network.proxy = proxy;
        self
    }

    pub fn with_timeout(mut self, seconds: Option<u32>) -> Self {
        self.network.timeout = seconds;
        self
    }
}

/// The user's download directory, or the working directory
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = EngineConfig::from_lookup(lookup(&[]));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.network.to_args(), ["--socket-timeout", "30"]);
    }

    #[test]
    fn reads_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_YTDLP, "/opt/tools/yt-dlp"),
            (ENV_FFMPEG, " /opt/tools/ffmpeg "),
            (ENV_PROXY, "socks5://127.0.0.1:1080"),
            (ENV_SOCKET_TIMEOUT, "12"),
        ]));
        assert_eq!(config.ytdlp_path, Some(PathBuf::from("/opt/tools/yt-dlp")));
        assert_eq!(config.ffmpeg_path, Some(PathBuf::from("/opt/tools/ffmpeg")));
        assert_eq!(
            config.network.to_args(),
            ["--proxy", "socks5://127.0.0.1:1080", "--socket-timeout", "12"]
        );
    }

    #[test]
    fn invalid_timeout_keeps_default() {
        let config = EngineConfig::from_lookup(lookup(&[(ENV_SOCKET_TIMEOUT, "soon"), (ENV_PROXY, "  ")]));
        assert_eq!(config.network, NetworkConfig::default());
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::default()
            .with_proxy(Some("http://proxy:8080".to_string()))
            .with_timeout(None);
        assert_eq!(config.network.to_args(), ["--proxy", "http://proxy:8080"]);
    }
}
