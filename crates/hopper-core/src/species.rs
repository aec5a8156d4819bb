//! Site species, the carrier strategy table, and lattice faces.

use std::fmt;

/// Occupant-type tag stored per lattice site.
///
/// The tag always mirrors the actual occupant. `Defect` sites carry no
/// agent object; `Source` and `Drain` are flux agents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Species {
    /// Unoccupied.
    #[default]
    Empty = 0,
    /// Mobile negative carrier.
    Electron = 1,
    /// Mobile positive carrier.
    Hole = 2,
    /// Immobile defect (optionally charged).
    Defect = 3,
    /// Carrier injector.
    Source = 4,
    /// Carrier absorber.
    Drain = 5,
}

impl Species {
    /// Lower-case name, used for logs and checkpoint labels.
    pub fn name(self) -> &'static str {
        match self {
            Species::Empty => "empty",
            Species::Electron => "electron",
            Species::Hole => "hole",
            Species::Defect => "defect",
            Species::Source => "source",
            Species::Drain => "drain",
        }
    }

    /// The carrier this species represents, if it is mobile.
    pub fn carrier(self) -> Option<Carrier> {
        match self {
            Species::Electron => Some(Carrier::Electron),
            Species::Hole => Some(Carrier::Hole),
            _ => None,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mobile carrier kind.
///
/// This is the strategy table for the behaviours that differ between
/// electrons and holes: charge sign, the opposite species, and how a
/// background potential converts into an energy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Carrier {
    /// Negative carrier, charge `-1`.
    Electron,
    /// Positive carrier, charge `+1`.
    Hole,
}

impl Carrier {
    /// Both carriers, electrons first.
    pub const ALL: [Carrier; 2] = [Carrier::Electron, Carrier::Hole];

    /// Integer charge sign.
    #[inline]
    pub fn charge(self) -> i32 {
        match self {
            Carrier::Electron => -1,
            Carrier::Hole => 1,
        }
    }

    /// Charge sign as a float, for energy arithmetic.
    #[inline]
    pub fn charge_f64(self) -> f64 {
        f64::from(self.charge())
    }

    /// The site species tag for this carrier.
    #[inline]
    pub fn species(self) -> Species {
        match self {
            Carrier::Electron => Species::Electron,
            Carrier::Hole => Species::Hole,
        }
    }

    /// The opposite carrier (recombination partner).
    #[inline]
    pub fn other(self) -> Carrier {
        match self {
            Carrier::Electron => Carrier::Hole,
            Carrier::Hole => Carrier::Electron,
        }
    }

    /// Potential energy of this carrier in a potential `v`.
    #[inline]
    pub fn binding_potential(self, v: f64) -> f64 {
        self.charge_f64() * v
    }

    /// Energy change for moving this carrier from potential `from` to `to`.
    #[inline]
    pub fn energy_change(self, from: f64, to: f64) -> f64 {
        self.binding_potential(to) - self.binding_potential(from)
    }

    /// Lower-case name.
    pub fn name(self) -> &'static str {
        self.species().name()
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One face of the lattice cube.
///
/// `Left`/`Right` bound the x (transport) axis, `Front`/`Back` the y
/// axis, and `Bottom`/`Top` the z axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    /// `x == 0`.
    Left,
    /// `x == X - 1`.
    Right,
    /// `y == 0`.
    Front,
    /// `y == Y - 1`.
    Back,
    /// `z == 0`.
    Bottom,
    /// `z == Z - 1`.
    Top,
}

impl Face {
    /// All faces in canonical order.
    pub const ALL: [Face; 6] = [
        Face::Left,
        Face::Right,
        Face::Front,
        Face::Back,
        Face::Bottom,
        Face::Top,
    ];

    /// Axis index (0 = x, 1 = y, 2 = z) normal to this face.
    pub fn axis(self) -> usize {
        match self {
            Face::Left | Face::Right => 0,
            Face::Front | Face::Back => 1,
            Face::Bottom | Face::Top => 2,
        }
    }

    /// `true` for the face at coordinate zero of its axis.
    pub fn is_low(self) -> bool {
        matches!(self, Face::Left | Face::Front | Face::Bottom)
    }

    /// Position in [`Face::ALL`].
    pub fn ordinal(self) -> usize {
        match self {
            Face::Left => 0,
            Face::Right => 1,
            Face::Front => 2,
            Face::Back => 3,
            Face::Bottom => 4,
            Face::Top => 5,
        }
    }

    /// Lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Face::Left => "left",
            Face::Right => "right",
            Face::Front => "front",
            Face::Back => "back",
            Face::Bottom => "bottom",
            Face::Top => "top",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_table_is_consistent() {
        for carrier in Carrier::ALL {
            assert_eq!(carrier.other().other(), carrier);
            assert_eq!(carrier.species().carrier(), Some(carrier));
            assert_eq!(carrier.charge(), -carrier.other().charge());
        }
    }

    #[test]
    fn energy_change_follows_charge_sign() {
        // Electrons roll down towards higher potential, holes towards lower.
        assert!(Carrier::Electron.energy_change(0.0, 1.0) < 0.0);
        assert!(Carrier::Hole.energy_change(0.0, 1.0) > 0.0);
        assert_eq!(Carrier::Hole.energy_change(0.25, 0.25), 0.0);
    }

    #[test]
    fn non_carrier_species_have_no_carrier() {
        for s in [Species::Empty, Species::Defect, Species::Source, Species::Drain] {
            assert!(s.carrier().is_none(), "{s} should not be mobile");
        }
    }

    #[test]
    fn faces_pair_up_per_axis() {
        for face in Face::ALL {
            assert_eq!(Face::ALL[face.ordinal()], face);
        }
        assert_eq!(Face::Left.axis(), Face::Right.axis());
        assert!(Face::Bottom.is_low());
        assert!(!Face::Top.is_low());
    }

    #[test]
    fn display_uses_names() {
        assert_eq!(Species::Drain.to_string(), "drain");
        assert_eq!(Carrier::Hole.to_string(), "hole");
        assert_eq!(Face::Back.to_string(), "back");
    }
}
