//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::PathBuf;

const APP_DIR: &str = "agent-roundtable";
const PROJECT_FILES: [&str; 2] = ["roundtable.toml", ".roundtable.toml"];
const ENV_PREFIX: &str = "ROUNDTABLE_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `ROUNDTABLE_*` environment variables (`__` separates sections,
    ///    e.g. `ROUNDTABLE_TIMEOUTS__IDLE_MS=5000`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./roundtable.toml` or `./.roundtable.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/agent-roundtable/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, ENV_PREFIX)
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(config_path: Option<&PathBuf>, env_prefix: &str) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(env_prefix).split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/agent-roundtable/config.toml if set,
    /// otherwise the platform config directory equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe which config files take part, as TOML comment lines
    pub fn describe_sources(config_path: Option<&PathBuf>) -> String {
        let mut lines = vec!["# Configuration sources (lowest to highest priority):".to_string()];
        lines.push("#   [     ] built-in defaults".to_string());

        if let Some(path) = Self::global_config_path() {
            lines.push(source_line(path.exists(), "Global ", &path.display().to_string()));
        }
        match Self::project_config_path() {
            Some(path) => lines.push(source_line(true, "Project", &path.display().to_string())),
            None => lines.push(source_line(
                false,
                "Project",
                "./roundtable.toml or ./.roundtable.toml",
            )),
        }
        if let Some(path) = config_path {
            lines.push(source_line(path.exists(), "Explicit", &path.display().to_string()));
        }
        lines.push(format!("#   [     ] Env:     {}*", ENV_PREFIX));
        lines.join("\n")
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(config: &FileConfig) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(config)
    }
}

fn source_line(found: bool, kind: &str, location: &str) -> String {
    let mark = if found { "FOUND" } else { "     " };
    format!("#   [{}] {}: {}", mark, kind, location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.discussion.max_rounds, 3);
        assert!(config.discussion.enable_consensus);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("agent-roundtable"));
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[discussion]\nmax_rounds = 7\n\n[timeouts]\nidle_ms = 1234\n",
        )
        .unwrap();

        let config = ConfigLoader::figment(Some(&path), "ROUNDTABLE_TEST_UNUSED_")
            .extract::<FileConfig>()
            .unwrap();
        assert_eq!(config.discussion.max_rounds, 7);
        assert_eq!(config.timeouts.idle_ms, 1234);
        // Untouched keys keep their defaults
        assert_eq!(config.timeouts.hard_ms, 900_000);
        assert_eq!(config.discussion.language, "en");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[analysis]\nparticipant = \"codex\"\n").unwrap();

        // SAFETY: the prefix is unique to this test
        unsafe {
            std::env::set_var("ROUNDTABLE_LOADER_TEST_ANALYSIS__PARTICIPANT", "gemini");
        }
        let config = ConfigLoader::figment(Some(&path), "ROUNDTABLE_LOADER_TEST_")
            .extract::<FileConfig>()
            .unwrap();
        unsafe {
            std::env::remove_var("ROUNDTABLE_LOADER_TEST_ANALYSIS__PARTICIPANT");
        }
        assert_eq!(config.analysis.participant, "gemini");
    }

    #[test]
    fn test_type_errors_surface() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[discussion]\nmax_rounds = \"many\"\n").unwrap();
        let result = ConfigLoader::figment(Some(&path), "ROUNDTABLE_TEST_UNUSED_").extract::<FileConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn test_describe_sources_lists_explicit_file() {
        let path = PathBuf::from("/nonexistent/roundtable.toml");
        let text = ConfigLoader::describe_sources(Some(&path));
        assert!(text.lines().all(|l| l.starts_with('#')));
        assert!(text.contains("/nonexistent/roundtable.toml"));
    }

    #[test]
    fn test_to_toml_roundtrips() {
        let text = ConfigLoader::to_toml(&FileConfig::default()).unwrap();
        let back: FileConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, FileConfig::default());
    }
}
