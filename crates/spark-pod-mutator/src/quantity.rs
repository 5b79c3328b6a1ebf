//! Canonical [`Quantity`] strings for plain counts.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// The decimal SI suffixes Kubernetes uses for whole numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, strum::Display)]
pub enum DecimalMultiple {
    #[strum(serialize = "")]
    Empty,

    #[strum(serialize = "k")]
    Kilo,

    #[strum(serialize = "M")]
    Mega,

    #[strum(serialize = "G")]
    Giga,

    #[strum(serialize = "T")]
    Tera,

    #[strum(serialize = "P")]
    Peta,

    #[strum(serialize = "E")]
    Exa,
}

impl DecimalMultiple {
    pub fn scale_up(self) -> Option<Self> {
        match self {
            Self::Empty => Some(Self::Kilo),
            Self::Kilo => Some(Self::Mega),
            Self::Mega => Some(Self::Giga),
            Self::Giga => Some(Self::Tera),
            Self::Tera => Some(Self::Peta),
            Self::Peta => Some(Self::Exa),
            Self::Exa => None,
        }
    }
}

/// Renders `count` the way the API server serializes a `DecimalSI`
/// quantity, moving trailing thousands into the suffix (`1000` becomes
/// `1k`).
pub fn decimal_si(count: i64) -> Quantity {
    let mut value = count;
    let mut multiple = DecimalMultiple::Empty;

    while value != 0 && value % 1000 == 0 {
        let Some(next) = multiple.scale_up() else {
            break;
        };
        value /= 1000;
        multiple = next;
    }

    Quantity(format!("{value}{multiple}"))
}
