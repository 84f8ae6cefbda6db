use clap::ValueEnum;
use strum_macros::{Display, EnumIter};

/// Pairing-friendly curves the harness can prove over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Display, EnumIter)]
pub enum Curve {
    #[value(name = "bn254")]
    #[strum(serialize = "bn254")]
    Bn254,
    #[value(name = "bls12-381")]
    #[strum(serialize = "bls12-381")]
    Bls12_381,
    #[value(name = "bls12-377")]
    #[strum(serialize = "bls12-377")]
    Bls12_377,
    #[value(name = "bw6-761")]
    #[strum(serialize = "bw6-761")]
    Bw6_761,
    #[value(name = "mnt4-298")]
    #[strum(serialize = "mnt4-298")]
    Mnt4_298,
    #[value(name = "mnt6-298")]
    #[strum(serialize = "mnt6-298")]
    Mnt6_298,
}

impl Curve {
    /// Inner curve of the 2-chain whose outer curve is `self`: the inner scalar
    /// field equals the outer base field.
    pub fn inner_of_chain(self) -> Option<Curve> {
        match self {
            Curve::Bw6_761 => Some(Curve::Bls12_377),
            Curve::Mnt6_298 => Some(Curve::Mnt4_298),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn only_outer_curves_have_an_inner_partner() {
        let outers: Vec<_> = Curve::iter()
            .filter(|c| c.inner_of_chain().is_some())
            .collect();
        assert_eq!(outers, vec![Curve::Bw6_761, Curve::Mnt6_298]);
    }

    #[test]
    fn cli_names_match_display() {
        for curve in Curve::iter() {
            let parsed = Curve::from_str(&curve.to_string(), true).unwrap();
            assert_eq!(parsed, curve);
        }
    }
}
