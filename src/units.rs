use ndarray::{Array, Dimension};

use crate::constants::{ATOMIC_MASS_UNIT, DEG_TO_RAD, ELEMENTARY_CHARGE};

/// Values that can be rescaled by a constant factor.
///
/// Implemented for plain scalars and owned arrays of any dimension so that
/// every conversion behaves the same for a single value and for a whole column.
pub trait Scalable: Sized {
    fn scaled(self, factor: f64) -> Self;
}

impl Scalable for f64 {
    #[inline]
    fn scaled(self, factor: f64) -> Self {
        self * factor
    }
}

impl<D: Dimension> Scalable for Array<f64, D> {
    #[inline]
    fn scaled(self, factor: f64) -> Self {
        self.mapv_into(|value| value * factor)
    }
}

/// Physical class of a quantity, deciding how it moves between its
/// display (or on-disk) unit and SI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitClass {
    /// amu <-> kg
    Mass,
    /// e <-> C
    Charge,
    /// deg <-> rad
    Angle,
    /// eV <-> J
    Energy,
    /// eV/T <-> J/T
    MagneticMoment,
    /// Already SI in every representation.
    Plain,
}

impl UnitClass {
    /// SI value of one display unit.
    #[inline]
    pub fn factor(self) -> f64 {
        match self {
            UnitClass::Mass => ATOMIC_MASS_UNIT,
            UnitClass::Charge => ELEMENTARY_CHARGE,
            UnitClass::Angle => DEG_TO_RAD,
            UnitClass::Energy | UnitClass::MagneticMoment => ELEMENTARY_CHARGE,
            UnitClass::Plain => 1.0,
        }
    }

    /// Converts from the display unit to SI.
    #[inline]
    pub fn to_si<V: Scalable>(self, value: V) -> V {
        match self {
            UnitClass::Plain => value,
            _ => value.scaled(self.factor()),
        }
    }

    /// Converts from SI to the display unit.
    #[inline]
    pub fn to_display<V: Scalable>(self, value: V) -> V {
        match self {
            UnitClass::Plain => value,
            _ => value.scaled(self.factor().recip()),
        }
    }

    /// The display unit label.
    pub fn display_unit(self) -> &'static str {
        match self {
            UnitClass::Mass => "amu",
            UnitClass::Charge => "e",
            UnitClass::Angle => "deg",
            UnitClass::Energy => "eV",
            UnitClass::MagneticMoment => "eV/T",
            UnitClass::Plain => "",
        }
    }

    /// Classifies a `unit` attribute string as written in the container.
    ///
    /// Units that are already SI (or dimensionless) map to `Plain`.
    pub fn from_stored_unit(unit: &str) -> Self {
        match unit.trim() {
            "amu" => UnitClass::Mass,
            "e" => UnitClass::Charge,
            "deg" => UnitClass::Angle,
            "eV" => UnitClass::Energy,
            "eV/T" => UnitClass::MagneticMoment,
            _ => UnitClass::Plain,
        }
    }

    /// How a quantity is stored when its dataset carries no `unit` attribute.
    ///
    /// Matches the display convention except for the gyro-angle, which is
    /// written in radians.
    pub fn stored_default(key: &str) -> Self {
        match key {
            "zeta" => UnitClass::Plain,
            _ => UnitClass::for_quantity(key),
        }
    }

    /// The display class of a canonical quantity key.
    pub fn for_quantity(key: &str) -> Self {
        match key {
            "mass" => UnitClass::Mass,
            "charge" => UnitClass::Charge,
            "phi" | "phimod" | "phiprt" | "theta" | "zeta" => UnitClass::Angle,
            "ekin" => UnitClass::Energy,
            "mu" => UnitClass::MagneticMoment,
            _ => UnitClass::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn round_trip_is_exact_enough() {
        for class in [
            UnitClass::Mass,
            UnitClass::Charge,
            UnitClass::Angle,
            UnitClass::Energy,
            UnitClass::MagneticMoment,
        ] {
            for value in [1.0, -3.5, 4.002602, 1.0e6, 2.5e-3] {
                let back = class.to_display(class.to_si(value));
                assert_relative_eq!(back, value, max_relative = 1e-12);
                let back = class.to_si(class.to_display(value));
                assert_relative_eq!(back, value, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn scalar_and_array_agree() {
        let values = array![1.0, 2.0, 90.0];
        let converted = UnitClass::Angle.to_si(values.clone());
        for (scalar, converted) in values.iter().zip(converted.iter()) {
            assert_eq!(UnitClass::Angle.to_si(*scalar), *converted);
        }
        assert_relative_eq!(converted[2], std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn stored_units_are_classified() {
        assert_eq!(UnitClass::from_stored_unit("amu"), UnitClass::Mass);
        assert_eq!(UnitClass::from_stored_unit("eV/T"), UnitClass::MagneticMoment);
        assert_eq!(UnitClass::from_stored_unit("kg*m/s"), UnitClass::Plain);
        assert_eq!(UnitClass::for_quantity("ekin"), UnitClass::Energy);
        assert_eq!(UnitClass::for_quantity("r"), UnitClass::Plain);
    }

    #[test]
    fn constants_match_codata() {
        use physical_constants::{ATOMIC_MASS_CONSTANT, ELEMENTARY_CHARGE as E};
        assert_relative_eq!(UnitClass::Mass.factor(), ATOMIC_MASS_CONSTANT, max_relative = 1e-7);
        assert_relative_eq!(UnitClass::Charge.factor(), E, max_relative = 1e-7);
    }
}
