//! Material tags, phase categories, and the rules/presentation table.

use indexmap::IndexMap;
use std::fmt;

/// Behavioural category of a material, driving the transport rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No matter; only a transfer target.
    Empty,
    /// Falls under gravity when unsupported, may shift laterally while
    /// cantilevered.
    Granular,
    /// Falls and equalizes level with neighbours regardless of support.
    Fluid,
    /// Never moves; always a support source.
    Immovable,
}

/// Concrete material occupying a cell.
///
/// The tag identifies the substance for presentation and rules lookup;
/// its [`Phase`] decides which transport rules apply. Discriminants are
/// stable and form the on-wire tag byte for the binary codec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Material {
    #[default]
    Empty = 0,
    Dirt = 1,
    Sand = 2,
    Water = 3,
    Stone = 4,
}

impl Material {
    /// All non-empty materials, in presentation order.
    pub const ALL: [Material; 4] = [
        Material::Dirt,
        Material::Sand,
        Material::Water,
        Material::Stone,
    ];

    /// The transport category for this material.
    pub fn phase(self) -> Phase {
        match self {
            Material::Empty => Phase::Empty,
            Material::Dirt | Material::Sand => Phase::Granular,
            Material::Water => Phase::Fluid,
            Material::Stone => Phase::Immovable,
        }
    }

    /// The stable tag byte used by the binary codec.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Inverse of [`tag()`](Material::tag). Returns `None` for unknown bytes.
    pub fn from_tag(tag: u8) -> Option<Material> {
        match tag {
            0 => Some(Material::Empty),
            1 => Some(Material::Dirt),
            2 => Some(Material::Sand),
            3 => Some(Material::Water),
            4 => Some(Material::Stone),
            _ => None,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Material::Empty => "empty",
            Material::Dirt => "dirt",
            Material::Sand => "sand",
            Material::Water => "water",
            Material::Stone => "stone",
        };
        write!(f, "{name}")
    }
}

/// Per-material tuning values consulted by the transport rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialProps {
    /// Relative density; heavier materials claim capacity first when two
    /// transfers target the same cell.
    pub density: f32,
    /// Fraction of a fill difference moved per step during lateral
    /// transfer. Fluids equalize fast, granular matter creeps.
    pub flow_rate: f32,
    /// Human-readable name for presentation layers.
    pub display_name: &'static str,
}

/// Registration-ordered lookup table from material tag to its properties.
///
/// Iteration order is the registration order, which presentation layers
/// rely on for stable palettes.
#[derive(Clone, Debug)]
pub struct MaterialTable {
    props: IndexMap<Material, MaterialProps>,
}

impl MaterialTable {
    /// Properties for a material. Unregistered materials (including
    /// `Empty`) fall back to inert defaults.
    pub fn get(&self, material: Material) -> MaterialProps {
        self.props.get(&material).copied().unwrap_or(MaterialProps {
            density: 0.0,
            flow_rate: 0.0,
            display_name: "empty",
        })
    }

    /// Materials in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (Material, &MaterialProps)> {
        self.props.iter().map(|(m, p)| (*m, p))
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        let mut props = IndexMap::new();
        props.insert(
            Material::Dirt,
            MaterialProps {
                density: 1.6,
                flow_rate: 0.15,
                display_name: "dirt",
            },
        );
        props.insert(
            Material::Sand,
            MaterialProps {
                density: 1.5,
                flow_rate: 0.3,
                display_name: "sand",
            },
        );
        props.insert(
            Material::Water,
            MaterialProps {
                density: 1.0,
                flow_rate: 0.5,
                display_name: "water",
            },
        );
        props.insert(
            Material::Stone,
            MaterialProps {
                density: 2.7,
                flow_rate: 0.0,
                display_name: "stone",
            },
        );
        Self { props }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_match_categories() {
        assert_eq!(Material::Empty.phase(), Phase::Empty);
        assert_eq!(Material::Dirt.phase(), Phase::Granular);
        assert_eq!(Material::Sand.phase(), Phase::Granular);
        assert_eq!(Material::Water.phase(), Phase::Fluid);
        assert_eq!(Material::Stone.phase(), Phase::Immovable);
    }

    #[test]
    fn tag_round_trips_every_material() {
        for m in [Material::Empty, Material::Dirt, Material::Sand, Material::Water, Material::Stone]
        {
            assert_eq!(Material::from_tag(m.tag()), Some(m));
        }
    }

    #[test]
    fn unknown_tag_is_none() {
        assert_eq!(Material::from_tag(200), None);
    }

    #[test]
    fn default_table_covers_all_materials() {
        let table = MaterialTable::default();
        for m in Material::ALL {
            assert!(table.get(m).density > 0.0, "{m} missing from default table");
        }
    }

    #[test]
    fn empty_falls_back_to_inert_props() {
        let table = MaterialTable::default();
        let props = table.get(Material::Empty);
        assert_eq!(props.density, 0.0);
        assert_eq!(props.flow_rate, 0.0);
    }

    #[test]
    fn table_iterates_in_registration_order() {
        let table = MaterialTable::default();
        let order: Vec<Material> = table.iter().map(|(m, _)| m).collect();
        assert_eq!(
            order,
            vec![Material::Dirt, Material::Sand, Material::Water, Material::Stone]
        );
    }
}
