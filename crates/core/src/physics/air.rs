//! Thermodynamic and transport properties of moist air containing CO2.
//!
//! Formulas follow CIPM-2007 for density and vapour content, Sutherland's law
//! for the dry-air transport properties and Tsilingiris (2007) for the water
//! vapour terms and the mixing rules.

use std::f64::consts::PI;

/// J/(mol.K)
pub const UNIVERSAL_GAS_CONSTANT: f64 = 8.314472;
/// kg/kmol
pub const MOLAR_MASS_WATER_VAPOUR: f64 = 18.01527;
pub const MOLAR_MASS_O2: f64 = 31.9988;
pub const MOLAR_MASS_CO2: f64 = 44.01;
/// Molar mass of CO2-free dry air, kg/kmol.
pub const MOLAR_MASS_DRY_AIR: f64 = 28.960745;

pub const CELSIUS_OFFSET: f64 = 273.15;

/// Ambient state the derived properties are computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AirState {
    /// Kelvin.
    pub temperature: f64,
    /// kPa.
    pub pressure: f64,
    /// Percent of saturation.
    pub humidity: f64,
    /// mol/mol.
    pub molar_co2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AirProperties {
    pub molar_water_vapour: f64,
    pub air_density: f64,
    pub dynamic_viscosity: f64,
    pub specific_heat: f64,
    pub specific_heats_ratio: f64,
    pub thermal_conductivity: f64,
    pub prandtl_number: f64,
    pub speed_of_sound: f64,
    pub epsilon_constant: f64,
    pub alpha_constant: f64,
}

impl AirProperties {
    pub fn compute(state: &AirState) -> Self {
        let t = state.temperature;
        let celsius = t - CELSIUS_OFFSET;

        let molar_water_vapour = molar_water_vapour(state.pressure, t, state.humidity);
        let molar_mass_dry_air =
            MOLAR_MASS_DRY_AIR + (MOLAR_MASS_CO2 - MOLAR_MASS_O2) * state.molar_co2;
        let molar_mass_moist_air = (1.0 - molar_water_vapour) * molar_mass_dry_air
            + molar_water_vapour * MOLAR_MASS_WATER_VAPOUR;
        let gas_constant = UNIVERSAL_GAS_CONSTANT / (0.001 * molar_mass_moist_air);

        let air_density = state.pressure * 1e3
            / (compressibility(state.pressure, t, molar_water_vapour) * gas_constant * t);

        // Mixing coefficients shared by viscosity and conductivity.
        let air_viscosity = 1.4592e-6 * t.powf(1.5) / (t + 109.1);
        let vapour_viscosity = 8.058131868e-6 + t * 4.000549451e-8;
        let viscosity_ratio = (air_viscosity / vapour_viscosity).sqrt();
        let phi_air_vapour = 0.5
            * (1.0 + viscosity_ratio * (MOLAR_MASS_WATER_VAPOUR / molar_mass_dry_air).powf(0.25))
                .powi(2)
            / (2.0 * (1.0 + molar_mass_dry_air / MOLAR_MASS_WATER_VAPOUR)).sqrt();
        let phi_vapour_air = 0.5
            * (1.0 + (molar_mass_dry_air / MOLAR_MASS_WATER_VAPOUR).powf(0.25) / viscosity_ratio)
                .powi(2)
            / (2.0 * (1.0 + MOLAR_MASS_WATER_VAPOUR / molar_mass_dry_air)).sqrt();
        let humidity_ratio = molar_water_vapour / (1.0 - molar_water_vapour);

        let dynamic_viscosity = air_viscosity / (1.0 + phi_air_vapour * humidity_ratio)
            + humidity_ratio * vapour_viscosity / (humidity_ratio + phi_vapour_air);

        // Specific heat of air is reduced by 2 J/(kg.K) relative to the
        // published fit so that gamma comes out right.
        let mass_fraction_vapour =
            molar_water_vapour * MOLAR_MASS_WATER_VAPOUR / molar_mass_moist_air;
        let mass_fraction_co2 = state.molar_co2 * MOLAR_MASS_CO2 / molar_mass_moist_air;
        let air_specific_heat = 1032.0
            + t * (-0.284887
                + t * (0.7816818e-3 + t * (-0.4970786e-6 + t * 0.1077024e-9)));
        let vapour_specific_heat =
            1869.10989 + celsius * (-0.2578421578 + celsius * 1.941058941e-2);
        let co2_specific_heat = 817.02 + celsius * (1.0562 - celsius * 6.67e-4);
        let specific_heat = air_specific_heat * (1.0 - mass_fraction_vapour - mass_fraction_co2)
            + vapour_specific_heat * mass_fraction_vapour
            + co2_specific_heat * mass_fraction_co2;
        let specific_heats_ratio = specific_heat / (specific_heat - gas_constant);

        let air_conductivity = 2.3340e-3 * t.powf(1.5) / (t + 164.54);
        let vapour_conductivity =
            0.01761758242 + celsius * (5.558941059e-5 + celsius * 1.663336663e-7);
        let thermal_conductivity = air_conductivity / (1.0 + phi_air_vapour * humidity_ratio)
            + humidity_ratio * vapour_conductivity / (humidity_ratio + phi_vapour_air);

        let prandtl_number = dynamic_viscosity * specific_heat / thermal_conductivity;
        let speed_of_sound = (specific_heats_ratio * gas_constant * t).sqrt();

        let loss_factor = 1.0 + (specific_heats_ratio - 1.0) / prandtl_number.sqrt();
        let epsilon_constant =
            1.0 / (2.0 * PI.sqrt()) * (dynamic_viscosity / air_density).sqrt() * loss_factor;
        let alpha_constant =
            (dynamic_viscosity / (2.0 * air_density * speed_of_sound)).sqrt() * loss_factor;

        Self {
            molar_water_vapour,
            air_density,
            dynamic_viscosity,
            specific_heat,
            specific_heats_ratio,
            thermal_conductivity,
            prandtl_number,
            speed_of_sound,
            epsilon_constant,
            alpha_constant,
        }
    }
}

/// Saturation vapour pressure in kPa (CIPM-2007).
fn saturated_vapour_pressure(temperature: f64) -> f64 {
    0.001
        * (1.2378847e-5 * temperature.powi(2) - 1.9121316e-2 * temperature + 33.93711047
            - 6.3431645e3 / temperature)
            .exp()
}

fn enhancement_factor(pressure: f64, temperature: f64) -> f64 {
    1.00062 + 3.14e-5 * pressure + 5.6e-7 * temperature.powi(2)
}

fn molar_water_vapour(pressure: f64, temperature: f64, humidity: f64) -> f64 {
    0.01 * humidity * enhancement_factor(pressure, temperature)
        * saturated_vapour_pressure(temperature)
        / pressure
}

fn compressibility(pressure: f64, temperature: f64, molar_water_vapour: f64) -> f64 {
    let pascal = pressure * 1000.0;
    let xw = molar_water_vapour;
    1.0 - pascal / temperature
        * (1.58123e-6 - 2.9331e-8 * temperature
            + 1.1043e-10 * temperature.powi(2)
            + (5.707e-6 - 2.051e-8 * temperature) * xw
            + (1.9898e-4 - 2.376e-6 * temperature) * xw.powi(2))
        + (pascal / temperature).powi(2) * (1.83e-11 - 0.765e-8 * xw.powi(2))
}
