use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::physics::{
    DEFAULT_HUMIDITY, DEFAULT_MOLAR_CO2, DEFAULT_PRESSURE_KPA, DEFAULT_TEMPERATURE_F,
};
use crate::{PhysicalParameters, Result, TemperatureUnit, TunerConfig};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: EnvironmentConfig,
    pub tuner: TunerConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    pub fn physical_parameters(&self) -> Result<PhysicalParameters> {
        self.environment.physical_parameters()
    }
}

/// Air the instrument is played in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub temperature: f64,
    pub temperature_unit: TemperatureUnit,
    /// Barometric pressure in kPa.
    pub pressure: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Molar fraction of CO2.
    pub molar_co2: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE_F,
            temperature_unit: TemperatureUnit::Fahrenheit,
            pressure: DEFAULT_PRESSURE_KPA,
            humidity: DEFAULT_HUMIDITY,
            molar_co2: DEFAULT_MOLAR_CO2,
        }
    }
}

impl EnvironmentConfig {
    pub fn physical_parameters(&self) -> Result<PhysicalParameters> {
        PhysicalParameters::builder()
            .with_temperature(self.temperature, self.temperature_unit)
            .with_pressure(self.pressure)
            .with_humidity(self.humidity)
            .with_molar_co2(self.molar_co2)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DesignerError;

    #[test]
    fn defaults_match_default_parameters() {
        let params = AppConfig::default().physical_parameters().unwrap();
        let expected = PhysicalParameters::default();
        assert!((params.speed_of_sound() - expected.speed_of_sound()).abs() < 1e-12);
        assert!((params.air_density() - expected.air_density()).abs() < 1e-12);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"environment": {"temperature": 20.0, "temperature_unit": "celsius"}}"#,
        )
        .unwrap();
        assert_eq!(config.environment.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(config.environment.humidity, DEFAULT_HUMIDITY);
        assert_eq!(config.tuner, TunerConfig::default());
    }

    #[test]
    fn impossible_air_is_rejected() {
        let config = EnvironmentConfig {
            humidity: 140.0,
            ..EnvironmentConfig::default()
        };
        assert!(matches!(
            config.physical_parameters(),
            Err(DesignerError::InvalidParameters(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("woodwind-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"tuner": {"coarse_step_cents": 10.0}}"#).unwrap();
        let config = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.tuner.coarse_step_cents, 10.0);
        assert_eq!(config.environment, EnvironmentConfig::default());
    }
}
