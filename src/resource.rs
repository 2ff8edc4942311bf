use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Ore,
    Wood,
    Water,
    Oil,
    Livestock,
    Fissile,
}

impl ResourceKind {
    pub const COUNT: usize = 6;

    pub const ALL: [ResourceKind; Self::COUNT] = [
        ResourceKind::Ore,
        ResourceKind::Wood,
        ResourceKind::Water,
        ResourceKind::Oil,
        ResourceKind::Livestock,
        ResourceKind::Fissile,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Ore => "Ore",
            ResourceKind::Wood => "Wood",
            ResourceKind::Water => "Water",
            ResourceKind::Oil => "Oil",
            ResourceKind::Livestock => "Livestock",
            ResourceKind::Fissile => "Fissile Materials",
        }
    }

    /// Pollution produced per unit extracted. Informational only.
    pub fn pollution_coefficient(self) -> f64 {
        match self {
            ResourceKind::Ore => 1.0,
            ResourceKind::Wood => 0.1,
            ResourceKind::Water => 0.001,
            ResourceKind::Oil => 1.0,
            ResourceKind::Livestock => 0.75,
            ResourceKind::Fissile => 1.0,
        }
    }

    fn key(self) -> &'static str {
        match self {
            ResourceKind::Ore => "ore",
            ResourceKind::Wood => "wood",
            ResourceKind::Water => "water",
            ResourceKind::Oil => "oil",
            ResourceKind::Livestock => "livestock",
            ResourceKind::Fissile => "fissile",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource kind '{0}'")]
pub struct UnknownResource(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResource;

    /// Accepts the lowercase key (`fissile`) or the display label
    /// (`Fissile Materials`), case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| {
                kind.key().eq_ignore_ascii_case(wanted) || kind.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownResource(value.to_string()))
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for ResourceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Fixed-size map keyed by [`ResourceKind`] ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceMap<T>([T; ResourceKind::COUNT]);

impl<T: Copy> ResourceMap<T> {
    pub fn filled(value: T) -> Self {
        Self([value; ResourceKind::COUNT])
    }
}

impl<T> ResourceMap<T> {
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &T)> {
        ResourceKind::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ResourceKind, &mut T)> {
        ResourceKind::ALL.into_iter().zip(self.0.iter_mut())
    }
}

impl<T> Index<ResourceKind> for ResourceMap<T> {
    type Output = T;

    fn index(&self, kind: ResourceKind) -> &T {
        &self.0[kind.index()]
    }
}

impl<T> IndexMut<ResourceKind> for ResourceMap<T> {
    fn index_mut(&mut self, kind: ResourceKind) -> &mut T {
        &mut self.0[kind.index()]
    }
}
