//! Ambient physical constants shared by every acoustic computation.
//!
//! A [`PhysicalParameters`] bundle is computed once from temperature,
//! pressure, humidity and CO2 content and is read-only afterwards, so it can
//! be shared between calculators and tuners behind an `Arc`.

mod air;

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{DesignerError, Result};

use air::{AirProperties, AirState, CELSIUS_OFFSET};

/// Scale a temperature reading is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    /// Converts a reading in this unit to kelvin.
    pub fn to_kelvin(self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => value + CELSIUS_OFFSET,
            TemperatureUnit::Fahrenheit => (value + 40.0) * 5.0 / 9.0 - 40.0 + CELSIUS_OFFSET,
            TemperatureUnit::Kelvin => value,
        }
    }
}

pub const DEFAULT_TEMPERATURE_F: f64 = 72.0;
pub const DEFAULT_PRESSURE_KPA: f64 = 101.325;
pub const DEFAULT_HUMIDITY: f64 = 45.0;
pub const DEFAULT_MOLAR_CO2: f64 = 0.00039;

/// Immutable bundle of air properties at a given ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalParameters {
    temperature: f64,
    pressure: f64,
    humidity: f64,
    molar_co2: f64,
    properties: AirProperties,
    wave_number_1hz: f64,
}

impl PhysicalParameters {
    /// Parameters at the given temperature, with default pressure, humidity
    /// and CO2 content.
    pub fn new(temperature: f64, unit: TemperatureUnit) -> Result<Self> {
        Self::builder().with_temperature(temperature, unit).build()
    }

    pub fn builder() -> ParametersBuilder {
        ParametersBuilder::default()
    }

    /// Rejects inputs that are individually in range but together describe
    /// air that cannot exist, such as saturated air above boiling point.
    fn check_derived(&self) -> Result<()> {
        let xw = self.molar_water_vapour();
        if !(xw.is_finite() && xw < 1.0) {
            return Err(DesignerError::InvalidParameters(format!(
                "water vapour molar fraction must be below 1, got {xw}"
            )));
        }
        for (name, value) in [
            ("speed of sound", self.speed_of_sound()),
            ("air density", self.air_density()),
            ("Prandtl number", self.prandtl_number()),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(DesignerError::InvalidParameters(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn from_state(state: AirState) -> Self {
        let properties = AirProperties::compute(&state);
        Self {
            temperature: state.temperature,
            pressure: state.pressure,
            humidity: state.humidity,
            molar_co2: state.molar_co2,
            wave_number_1hz: 2.0 * PI / properties.speed_of_sound,
            properties,
        }
    }

    /// Kelvin.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// kPa.
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Relative humidity, percent of saturation.
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn molar_co2(&self) -> f64 {
        self.molar_co2
    }

    pub fn molar_water_vapour(&self) -> f64 {
        self.properties.molar_water_vapour
    }

    /// kg/m^3.
    pub fn air_density(&self) -> f64 {
        self.properties.air_density
    }

    /// kg/(m.s).
    pub fn dynamic_viscosity(&self) -> f64 {
        self.properties.dynamic_viscosity
    }

    /// Isobaric specific heat, J/(kg.K).
    pub fn specific_heat(&self) -> f64 {
        self.properties.specific_heat
    }

    pub fn specific_heats_ratio(&self) -> f64 {
        self.properties.specific_heats_ratio
    }

    /// W/(m.K).
    pub fn thermal_conductivity(&self) -> f64 {
        self.properties.thermal_conductivity
    }

    pub fn prandtl_number(&self) -> f64 {
        self.properties.prandtl_number
    }

    /// m/s.
    pub fn speed_of_sound(&self) -> f64 {
        self.properties.speed_of_sound
    }

    pub fn epsilon_constant(&self) -> f64 {
        self.properties.epsilon_constant
    }

    pub fn alpha_constant(&self) -> f64 {
        self.properties.alpha_constant
    }

    /// Characteristic impedance of a bore of the given radius, kg/(m^4.s).
    pub fn wave_impedance(&self, radius: f64) -> f64 {
        self.air_density() * self.speed_of_sound() / (PI * radius * radius)
    }

    /// Relative wall-loss factor for a bore of `radius` at `frequency`.
    pub fn epsilon(&self, frequency: f64, radius: f64) -> f64 {
        self.epsilon_constant() / (radius * frequency.sqrt())
    }

    /// Boundary-layer attenuation in nepers per metre for a bore of `radius`,
    /// equal to the imaginary part of the lossy wave number.
    pub fn attenuation(&self, frequency: f64, radius: f64) -> f64 {
        self.alpha_constant() * self.wave_number(frequency).sqrt() / radius
    }

    /// Wave number in rad/m.
    pub fn wave_number(&self, frequency: f64) -> f64 {
        frequency * self.wave_number_1hz
    }

    pub fn frequency(&self, wave_number: f64) -> f64 {
        wave_number / self.wave_number_1hz
    }
}

impl Default for PhysicalParameters {
    fn default() -> Self {
        Self::from_state(ParametersBuilder::default().state())
    }
}

/// Builder for [`PhysicalParameters`]; unset fields take the defaults of a
/// 72 °F room at sea level.
#[derive(Debug, Clone, Copy)]
pub struct ParametersBuilder {
    temperature: f64,
    pressure: f64,
    humidity: f64,
    molar_co2: f64,
}

impl Default for ParametersBuilder {
    fn default() -> Self {
        Self {
            temperature: TemperatureUnit::Fahrenheit.to_kelvin(DEFAULT_TEMPERATURE_F),
            pressure: DEFAULT_PRESSURE_KPA,
            humidity: DEFAULT_HUMIDITY,
            molar_co2: DEFAULT_MOLAR_CO2,
        }
    }
}

impl ParametersBuilder {
    pub fn with_temperature(mut self, temperature: f64, unit: TemperatureUnit) -> Self {
        self.temperature = unit.to_kelvin(temperature);
        self
    }

    /// Pressure in kPa.
    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    /// Relative humidity in percent of saturation.
    pub fn with_humidity(mut self, humidity: f64) -> Self {
        self.humidity = humidity;
        self
    }

    pub fn with_molar_co2(mut self, molar_co2: f64) -> Self {
        self.molar_co2 = molar_co2;
        self
    }

    pub fn build(self) -> Result<PhysicalParameters> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(DesignerError::InvalidParameters(format!(
                "absolute temperature must be positive, got {} K",
                self.temperature
            )));
        }
        if !(self.pressure.is_finite() && self.pressure > 0.0) {
            return Err(DesignerError::InvalidParameters(format!(
                "pressure must be positive, got {} kPa",
                self.pressure
            )));
        }
        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(DesignerError::InvalidParameters(format!(
                "relative humidity must lie in 0..=100 %, got {}",
                self.humidity
            )));
        }
        if !(0.0..=1.0).contains(&self.molar_co2) {
            return Err(DesignerError::InvalidParameters(format!(
                "CO2 molar fraction must lie in 0..=1, got {}",
                self.molar_co2
            )));
        }
        let params = PhysicalParameters::from_state(self.state());
        params.check_derived()?;
        Ok(params)
    }

    fn state(&self) -> AirState {
        AirState {
            temperature: self.temperature,
            pressure: self.pressure,
            humidity: self.humidity,
            molar_co2: self.molar_co2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64, tolerance: f64) -> bool {
        (actual - expected).abs() <= tolerance * expected.abs()
    }

    fn dry_air(celsius: f64) -> PhysicalParameters {
        PhysicalParameters::builder()
            .with_temperature(celsius, TemperatureUnit::Celsius)
            .with_pressure(101.325)
            .with_humidity(0.0)
            .with_molar_co2(0.00039)
            .build()
            .unwrap()
    }

    #[test]
    fn converts_temperature_units() {
        assert!((TemperatureUnit::Celsius.to_kelvin(20.0) - 293.15).abs() < 1e-12);
        assert!((TemperatureUnit::Fahrenheit.to_kelvin(-40.0) - 233.15).abs() < 1e-12);
        assert!((TemperatureUnit::Fahrenheit.to_kelvin(212.0) - 373.15).abs() < 1e-9);
        assert_eq!(TemperatureUnit::Kelvin.to_kelvin(300.0), 300.0);
    }

    #[test]
    fn dry_air_at_freezing() {
        let params = dry_air(0.0);
        assert!(close(params.speed_of_sound(), 331.43495349518037, 1e-9));
        assert!(close(params.air_density(), 1.2931565359886497, 1e-9));
        assert!(close(params.epsilon(1.0, 0.001), 1.5171852624336475, 1e-9));
    }

    #[test]
    fn dry_air_at_room_temperature() {
        let params = dry_air(20.0);
        assert!(close(params.speed_of_sound(), 343.2878525006776, 1e-9));
        assert!(close(params.air_density(), 1.2051536496637991, 1e-9));
        assert!(close(params.epsilon(1.0, 0.001), 1.6161041209381368, 1e-9));
    }

    #[test]
    fn humidity_speeds_up_sound_and_thins_air() {
        let dry = dry_air(20.0);
        let saturated = PhysicalParameters::builder()
            .with_temperature(20.0, TemperatureUnit::Celsius)
            .with_humidity(100.0)
            .build()
            .unwrap();
        assert!(saturated.speed_of_sound() > dry.speed_of_sound());
        assert!(saturated.speed_of_sound() < dry.speed_of_sound() + 2.0);
        assert!(saturated.air_density() < dry.air_density());
    }

    #[test]
    fn lower_pressure_thins_air_without_changing_sound_speed_much() {
        let sea_level = dry_air(20.0);
        let altitude = PhysicalParameters::builder()
            .with_temperature(20.0, TemperatureUnit::Celsius)
            .with_pressure(89.996)
            .with_humidity(0.0)
            .build()
            .unwrap();
        assert!(altitude.air_density() < sea_level.air_density() * 0.9);
        assert!((altitude.speed_of_sound() - sea_level.speed_of_sound()).abs() < 0.1);
    }

    #[test]
    fn wave_impedance_scales_with_inverse_area() {
        let params = dry_air(20.0);
        let narrow = params.wave_impedance(0.005);
        let wide = params.wave_impedance(0.010);
        assert!(close(narrow / wide, 4.0, 1e-12));
        assert!(close(
            narrow,
            params.air_density() * params.speed_of_sound() / (PI * 0.005 * 0.005),
            1e-12
        ));
    }

    #[test]
    fn wave_number_round_trips_through_frequency() {
        let params = PhysicalParameters::default();
        let k = params.wave_number(440.0);
        assert!(close(k, 2.0 * PI * 440.0 / params.speed_of_sound(), 1e-12));
        assert!(close(params.frequency(k), 440.0, 1e-12));
    }

    #[test]
    fn defaults_describe_a_warm_room() {
        let params = PhysicalParameters::default();
        assert!(close(params.temperature(), 295.372_222, 1e-6));
        assert_eq!(params.humidity(), DEFAULT_HUMIDITY);
        assert!(params.speed_of_sound() > 344.0 && params.speed_of_sound() < 346.0);
        assert_eq!(params, PhysicalParameters::builder().build().unwrap());
    }

    #[test]
    fn rejects_impossible_air() {
        let below_absolute_zero = PhysicalParameters::new(-300.0, TemperatureUnit::Celsius);
        assert!(matches!(
            below_absolute_zero,
            Err(DesignerError::InvalidParameters(_))
        ));
        let soaked = PhysicalParameters::builder().with_humidity(120.0).build();
        assert!(matches!(soaked, Err(DesignerError::InvalidParameters(_))));
        let vacuum = PhysicalParameters::builder().with_pressure(0.0).build();
        assert!(vacuum.is_err());
    }

    #[test]
    fn saturated_air_above_boiling_is_rejected() {
        for celsius in [105.0, 120.0] {
            let steam = PhysicalParameters::builder()
                .with_temperature(celsius, TemperatureUnit::Celsius)
                .with_humidity(100.0)
                .build();
            assert!(
                matches!(steam, Err(DesignerError::InvalidParameters(_))),
                "{celsius} C accepted"
            );
        }
        let hot_dry_air = dry_air(105.0);
        assert!(hot_dry_air.speed_of_sound() > 380.0 && hot_dry_air.speed_of_sound() < 395.0);
        assert_eq!(hot_dry_air.molar_water_vapour(), 0.0);
    }

    #[test]
    fn attenuation_matches_wall_loss_factor() {
        let params = PhysicalParameters::default();
        for (frequency, radius) in [(100.0, 0.01), (440.0, 0.008), (2000.0, 0.002)] {
            let from_epsilon = params.epsilon(frequency, radius) * params.wave_number(frequency);
            assert!(close(params.attenuation(frequency, radius), from_epsilon, 1e-12));
        }
    }
}
