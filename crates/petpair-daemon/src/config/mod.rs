use std::{collections::BTreeMap, env, fs, path::Path};

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

use crate::pet::{ActionProfile, SpeciesProfile, StatDeltas};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Loads configuration with `var` standing in for the process environment.
    pub fn load_with(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let project_root = var("PETPAIR_ROOT").unwrap_or_else(|| ".".to_string());
        let mut config = Self::locate(Path::new(&project_root), &var)?;
        config.apply_env_overrides(&var)?;
        config.rules.validate()?;
        Ok(config)
    }

    fn locate(project_root: &Path, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = var("PETPAIR_CONFIG") {
            return Self::from_path(Path::new(&path));
        }

        let default_path = project_root.join("config/petpair.toml");
        if default_path.exists() {
            return Self::from_path(&default_path);
        }

        let example_path = project_root.join("config/petpair.example.toml");
        if example_path.exists() {
            tracing::warn!("Using example configuration at {:?}", example_path);
            return Self::from_path(&example_path);
        }

        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_toml(&contents).with_context(|| format!("invalid config: {:?}", path))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    /// Hosting platforms hand out the port through `PORT`.
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = var("PORT") {
            let port: u16 = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?;
            self.server.set_port(port);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_listen_addr")]
    pub listen_addr: String,
}

impl ServerConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8000".into()
    }

    fn set_port(&mut self, port: u16) {
        let host = self
            .listen_addr
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".into());
        self.listen_addr = format!("{host}:{port}");
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "StorageConfig::default_url")]
    pub url: String,
    #[serde(default = "StorageConfig::default_auth_token_env")]
    pub auth_token_env: String,
}

impl StorageConfig {
    fn default_url() -> String {
        "pets.db".into()
    }
    fn default_auth_token_env() -> String {
        "TURSO_AUTH_TOKEN".into()
    }

    pub fn in_memory() -> Self {
        Self {
            url: ":memory:".into(),
            ..Self::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            auth_token_env: Self::default_auth_token_env(),
        }
    }
}

/// Game balance: species decay, action effects and levelling.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "RulesConfig::default_decay_debounce_hours")]
    pub decay_debounce_hours: f64,
    #[serde(default = "RulesConfig::default_level_threshold")]
    pub level_threshold: u32,
    #[serde(default = "RulesConfig::default_happiness_bonus_step")]
    pub happiness_bonus_step: u8,
    #[serde(default)]
    pub enforce_eligibility: bool,
    #[serde(default = "RulesConfig::default_names")]
    pub names: Vec<String>,
    #[serde(default = "RulesConfig::default_species")]
    pub species: BTreeMap<String, SpeciesProfile>,
    #[serde(default = "RulesConfig::default_actions")]
    pub actions: BTreeMap<String, ActionProfile>,
}

impl RulesConfig {
    fn default_decay_debounce_hours() -> f64 {
        0.1
    }
    fn default_level_threshold() -> u32 {
        100
    }
    fn default_happiness_bonus_step() -> u8 {
        20
    }

    fn default_names() -> Vec<String> {
        [
            "Murzik", "Bobik", "Ryzhik", "Snowball", "Paws", "Meow", "Woof", "Fluffy", "Starlight",
            "Sunny", "Rainbow", "Cloudy", "Blossom", "Butterfly",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    fn default_species() -> BTreeMap<String, SpeciesProfile> {
        BTreeMap::from([
            (
                "cat".into(),
                SpeciesProfile::new("Kitty", "🐱", 2.0, 1.5, 1.8),
            ),
            (
                "dog".into(),
                SpeciesProfile::new("Puppy", "🐕", 2.5, 1.2, 2.0),
            ),
            (
                "rabbit".into(),
                SpeciesProfile::new("Bunny", "🐰", 1.8, 2.0, 1.5),
            ),
        ])
    }

    fn default_actions() -> BTreeMap<String, ActionProfile> {
        BTreeMap::from([
            (
                "feed".into(),
                ActionProfile::new("Feed", "🍽️", StatDeltas::new(30, 5, 0), 5),
            ),
            (
                "play".into(),
                ActionProfile::new("Play", "🎾", StatDeltas::new(-5, 25, -10), 15)
                    .with_min_energy(10),
            ),
            (
                "sleep".into(),
                ActionProfile::new("Put to bed", "😴", StatDeltas::new(-2, 0, 40), 10)
                    .with_max_energy(80),
            ),
            (
                "pet".into(),
                ActionProfile::new("Pet", "🤗", StatDeltas::new(0, 15, 0), 8),
            ),
        ])
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.decay_debounce_hours.is_finite() && self.decay_debounce_hours >= 0.0,
            "rules.decay_debounce_hours must be a non-negative number"
        );
        ensure!(self.level_threshold > 0, "rules.level_threshold must be positive");
        ensure!(
            self.happiness_bonus_step > 0,
            "rules.happiness_bonus_step must be positive"
        );
        ensure!(!self.names.is_empty(), "rules.names must not be empty");
        ensure!(!self.species.is_empty(), "at least one species must be configured");
        ensure!(!self.actions.is_empty(), "at least one action must be configured");

        for (tag, profile) in &self.species {
            for (stat, rate) in [
                ("hunger_rate", profile.hunger_rate),
                ("happiness_rate", profile.happiness_rate),
                ("energy_rate", profile.energy_rate),
            ] {
                if !rate.is_finite() || rate < 0.0 {
                    bail!("species {tag:?}: {stat} must be a non-negative number, got {rate}");
                }
            }
        }

        for (tag, profile) in &self.actions {
            for bound in [profile.min_energy, profile.max_energy].into_iter().flatten() {
                ensure!(
                    bound <= 100,
                    "action {tag:?}: energy bounds must lie within 0..=100"
                );
            }
            if let (Some(min), Some(max)) = (profile.min_energy, profile.max_energy) {
                ensure!(
                    min <= max,
                    "action {tag:?}: min_energy ({min}) exceeds max_energy ({max})"
                );
            }
        }

        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            decay_debounce_hours: Self::default_decay_debounce_hours(),
            level_threshold: Self::default_level_threshold(),
            happiness_bonus_step: Self::default_happiness_bonus_step(),
            enforce_eligibility: false,
            names: Self::default_names(),
            species: Self::default_species(),
            actions: Self::default_actions(),
        }
    }
}
