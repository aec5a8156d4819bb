//! Physical constants and unit conversions.
//!
//! Energies are in electron-volts, potentials in volts, lengths in
//! nanometres. A unit charge in a potential of 1 V has an energy of 1 eV.

/// Boltzmann constant in eV/K.
pub const BOLTZMANN_EV: f64 = 8.617_333_262e-5;

/// `e^2 / (4 pi eps0)` in eV nm.
pub const COULOMB_EV_NM: f64 = 1.439_964_547;

/// Coulomb prefactor `ke` in volts at one lattice spacing.
///
/// `ke * q / r` (with `r` in lattice units) is the potential of charge `q`
/// in a medium of relative permittivity `dielectric` with sites
/// `spacing_nm` apart.
pub fn coulomb_prefactor(dielectric: f64, spacing_nm: f64) -> f64 {
    COULOMB_EV_NM / (dielectric * spacing_nm)
}

/// Inverse thermal energy `1 / kT` in 1/eV. Infinite temperature gives 0.
pub fn inverse_kt(temperature: f64) -> f64 {
    if temperature.is_infinite() {
        0.0
    } else {
        1.0 / (BOLTZMANN_EV * temperature)
    }
}
