use std::fmt;

use crate::foundation::error::{CubeMovieError, CubeMovieResult};

/// Physical dimension of a spectral-axis unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpectralDimension {
    Velocity,
    Frequency,
    Wavelength,
}

/// Units understood on the spectral (depth) axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpectralUnit {
    MetrePerSecond,
    KilometrePerSecond,
    Hertz,
    Kilohertz,
    Megahertz,
    Gigahertz,
    Metre,
    Millimetre,
    Micrometre,
    Nanometre,
    Angstrom,
}

impl SpectralUnit {
    /// Parse a unit string as written in FITS headers (`CUNIT3`) or on the command line.
    pub fn parse(s: &str) -> CubeMovieResult<Self> {
        let compact: String = s.trim().chars().filter(|c| !c.is_whitespace()).collect();
        let unit = match compact.as_str() {
            "m/s" | "ms-1" | "ms^-1" | "M/S" => Self::MetrePerSecond,
            "km/s" | "kms-1" | "kms^-1" | "KM/S" => Self::KilometrePerSecond,
            "Hz" | "HZ" | "hz" => Self::Hertz,
            "kHz" | "KHZ" | "khz" => Self::Kilohertz,
            "MHz" | "MHZ" | "mhz" => Self::Megahertz,
            "GHz" | "GHZ" | "ghz" => Self::Gigahertz,
            "m" | "M" => Self::Metre,
            "mm" | "MM" => Self::Millimetre,
            "um" | "UM" | "micron" | "µm" => Self::Micrometre,
            "nm" | "NM" => Self::Nanometre,
            "Angstrom" | "ANGSTROM" | "angstrom" | "Å" => Self::Angstrom,
            _ => {
                return Err(CubeMovieError::configuration(format!(
                    "unknown spectral unit '{s}'"
                )));
            }
        };
        Ok(unit)
    }

    pub fn dimension(self) -> SpectralDimension {
        match self {
            Self::MetrePerSecond | Self::KilometrePerSecond => SpectralDimension::Velocity,
            Self::Hertz | Self::Kilohertz | Self::Megahertz | Self::Gigahertz => {
                SpectralDimension::Frequency
            }
            Self::Metre | Self::Millimetre | Self::Micrometre | Self::Nanometre | Self::Angstrom => {
                SpectralDimension::Wavelength
            }
        }
    }

    /// Multiplier converting a value in this unit to the SI base unit of its dimension.
    fn si_factor(self) -> f64 {
        match self {
            Self::MetrePerSecond | Self::Hertz | Self::Metre => 1.0,
            Self::KilometrePerSecond | Self::Kilohertz => 1e3,
            Self::Megahertz => 1e6,
            Self::Gigahertz => 1e9,
            Self::Millimetre => 1e-3,
            Self::Micrometre => 1e-6,
            Self::Nanometre => 1e-9,
            Self::Angstrom => 1e-10,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::MetrePerSecond => "m/s",
            Self::KilometrePerSecond => "km/s",
            Self::Hertz => "Hz",
            Self::Kilohertz => "kHz",
            Self::Megahertz => "MHz",
            Self::Gigahertz => "GHz",
            Self::Metre => "m",
            Self::Millimetre => "mm",
            Self::Micrometre => "µm",
            Self::Nanometre => "nm",
            Self::Angstrom => "Å",
        }
    }
}

impl fmt::Display for SpectralUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl TryFrom<String> for SpectralUnit {
    type Error = CubeMovieError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SpectralUnit> for String {
    fn from(value: SpectralUnit) -> Self {
        value.symbol().to_string()
    }
}

/// A value on the spectral axis together with its unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: SpectralUnit,
}

impl Quantity {
    pub fn new(value: f64, unit: SpectralUnit) -> Self {
        Self { value, unit }
    }

    /// Convert to `unit`. Only conversions within one physical dimension are supported; a
    /// frequency cannot become a velocity without a rest frequency.
    pub fn to(self, unit: SpectralUnit) -> CubeMovieResult<Self> {
        if self.unit == unit {
            return Ok(self);
        }
        if self.unit.dimension() != unit.dimension() {
            return Err(CubeMovieError::configuration(format!(
                "cannot convert spectral axis from {} to {}",
                self.unit, unit
            )));
        }
        Ok(Self {
            value: self.value * self.unit.si_factor() / unit.si_factor(),
            unit,
        })
    }

    /// Format as `"<value> <unit>"` with `decimals` fractional digits.
    ///
    /// Negative `decimals` round to tens, hundreds, ... and print no fractional digits.
    pub fn format(self, decimals: i32) -> String {
        let value = if decimals >= 0 {
            format!("{:.*}", decimals as usize, self.value)
        } else {
            let p = 10f64.powi(-decimals);
            format!("{:.0}", (self.value / p).round() * p)
        };
        format!("{value} {}", self.unit)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cube/units.rs"]
mod tests;
