use std::{
    env::{self, VarError},
    sync::Arc,
    time::Duration,
};

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::script::Button;

mod float_to_duration {
    use super::*;
    use serde::{de::Unexpected, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let duration = f64::deserialize(deserializer)?;
        if duration <= 0f64 {
            return Err(serde::de::Error::invalid_value(
                Unexpected::Float(duration),
                &"Positive number",
            ));
        }
        Ok(Duration::from_secs_f64(duration))
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ReceiverSettings {
    pub host: String,
    pub port: u16,
    #[serde(with = "float_to_duration")]
    pub read_timeout_s: Duration,
    #[serde(with = "float_to_duration")]
    pub reconnect_interval_s: Duration,
    pub max_script_size: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub script_directory: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HostSettings {
    pub tick_rate_hz: u32,
    pub autoload_received: bool,
    pub autoplay: bool,
    pub prometheus_port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HotkeySettings {
    pub toggle_pause: Vec<Button>,
    pub frame_advance: Vec<Button>,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            toggle_pause: vec![Button::ZL, Button::ZR, Button::DDown],
            frame_advance: vec![Button::ZL, Button::ZR, Button::DRight],
        }
    }
}

pub type Settings = Arc<InnerSettings>;

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct InnerSettings {
    pub receiver: ReceiverSettings,
    pub storage: StorageSettings,
    pub host: HostSettings,
    #[serde(default)]
    pub hotkeys: HotkeySettings,
}

impl InnerSettings {
    pub fn from_env() -> Result<Arc<Self>, ConfigError> {
        let conf_var = env::var("CLY_CONFIG_FILE");
        Self::do_from_env(conf_var).map(Arc::new)
    }

    fn do_from_env(conf_var: Result<String, VarError>) -> Result<Self, ConfigError> {
        let config_file = conf_var.map_err(|_| {
            ConfigError::Message("CLY_CONFIG_FILE env var not set, place the path to the config file there.".into())
        })?;
        let c = Config::builder()
            .add_source(File::with_name(&config_file[..]))
            .build()?;
        let ret: Self = c.try_deserialize()?;
        ret.validate()?;
        Ok(ret)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.tick_rate_hz == 0 {
            return Err(ConfigError::Message("host.tick_rate_hz must be positive.".into()));
        }
        if self.hotkeys.toggle_pause.is_empty() || self.hotkeys.frame_advance.is_empty() {
            return Err(ConfigError::Message("Hotkey chords must not be empty.".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.host.tick_rate_hz
    }
}

#[cfg(test)]
pub mod test {
    use std::io::Write;

    use crate::util::test::get_file_path;

    use super::*;

    pub fn default_config() -> InnerSettings {
        InnerSettings {
            receiver: ReceiverSettings {
                host: "192.168.2.62".into(),
                port: 8171,
                read_timeout_s: Duration::from_secs(10),
                reconnect_interval_s: Duration::from_secs(1),
                max_script_size: 16 * 1024 * 1024,
            },
            storage: StorageSettings {
                script_directory: "/tmp/calypso/scripts".into(),
            },
            host: HostSettings {
                tick_rate_hz: 60,
                autoload_received: true,
                autoplay: false,
                prometheus_port: Some(8001),
            },
            hotkeys: HotkeySettings::default(),
        }
    }

    #[test]
    fn test_example_config_load() {
        let conf_file = get_file_path("example_config.yml");
        let conf = InnerSettings::do_from_env(Ok(conf_file)).unwrap();
        assert_eq!(conf, default_config());
    }

    #[test]
    fn test_config_needs_file() {
        InnerSettings::do_from_env(Err(VarError::NotPresent)).expect_err("Config init should've failed");
    }

    fn load_yaml(contents: &str) -> Result<InnerSettings, ConfigError> {
        let mut f = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        InnerSettings::do_from_env(Ok(f.path().to_str().unwrap().into()))
    }

    const MINIMAL: &str = "
receiver:
  host: localhost
  port: 1234
  read_timeout_s: 0.5
  reconnect_interval_s: 2
  max_script_size: 1024
storage:
  script_directory: scripts
host:
  tick_rate_hz: 30
  autoload_received: false
  autoplay: false
";

    #[test]
    fn test_hotkeys_are_optional() {
        let conf = load_yaml(MINIMAL).unwrap();
        assert_eq!(conf.hotkeys, HotkeySettings::default());
        assert_eq!(conf.host.prometheus_port, None);
        assert_eq!(conf.receiver.read_timeout_s, Duration::from_millis(500));
    }

    #[test]
    fn test_custom_hotkeys() {
        let yaml = format!("{}hotkeys:\n  toggle_pause: [Minus]\n  frame_advance: [Plus, DUp]\n", MINIMAL);
        let conf = load_yaml(&yaml).unwrap();
        assert_eq!(conf.hotkeys.toggle_pause, vec![Button::Minus]);
        assert_eq!(conf.hotkeys.frame_advance, vec![Button::Plus, Button::DUp]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        load_yaml(&MINIMAL.replace("tick_rate_hz: 30", "tick_rate_hz: 0")).expect_err("Zero tick rate");
        load_yaml(&MINIMAL.replace("read_timeout_s: 0.5", "read_timeout_s: -1")).expect_err("Negative timeout");
        let yaml = format!("{}hotkeys:\n  toggle_pause: []\n  frame_advance: [Plus]\n", MINIMAL);
        load_yaml(&yaml).expect_err("Empty chord");
    }

    #[test]
    fn test_tick_interval() {
        let mut conf = default_config();
        conf.host.tick_rate_hz = 50;
        assert_eq!(conf.tick_interval(), Duration::from_millis(20));
    }
}
