//! Named output sizes.
//!
//! A [`SizeTable`] maps size names (which become file names) to a
//! [`SizeSpec`]: a [`Geometry`] plus a [`ResizePolicy`]. The table keeps
//! declaration order.
//!
//! In TOML a size can be written three ways:
//!
//! ```toml
//! [sizes]
//! large = ">800x600"                                   # scale
//! square = [">100x100", "crop"]                        # geometry + policy
//! banner = { geometry = "1200x300", policy = "crop" }  # table form
//! ```

use crate::imaging::{Geometry, GeometryError};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How an image is fitted to its geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizePolicy {
    /// Resize to the computed dimensions.
    #[default]
    Scale,
    /// Cover the computed dimensions, then clip from the top-left corner.
    Crop,
}

impl ResizePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scale => "scale",
            Self::Crop => "crop",
        }
    }
}

impl FromStr for ResizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scale" => Ok(Self::Scale),
            "crop" => Ok(Self::Crop),
            other => Err(format!(
                "unknown resize policy {other:?} (expected \"scale\" or \"crop\")"
            )),
        }
    }
}

/// One output size: a geometry and the policy used to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSizeSpec", into = "RawSizeSpec")]
pub struct SizeSpec {
    pub geometry: Geometry,
    pub policy: ResizePolicy,
}

impl SizeSpec {
    pub fn scale(geometry: Geometry) -> Self {
        Self {
            geometry,
            policy: ResizePolicy::Scale,
        }
    }

    pub fn crop(geometry: Geometry) -> Self {
        Self {
            geometry,
            policy: ResizePolicy::Crop,
        }
    }
}

/// Parses `geometry` or `geometry:policy` (the CLI form).
impl FromStr for SizeSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (geometry, policy) = match s.rsplit_once(':') {
            Some((g, p)) => (g, p.parse()?),
            None => (s, ResizePolicy::Scale),
        };
        let geometry = geometry
            .parse()
            .map_err(|e: GeometryError| e.to_string())?;
        Ok(Self { geometry, policy })
    }
}

/// The shapes a size may take in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSizeSpec {
    Bare(String),
    List(Vec<String>),
    Table {
        geometry: String,
        #[serde(default)]
        policy: ResizePolicy,
    },
}

impl TryFrom<RawSizeSpec> for SizeSpec {
    type Error = String;

    fn try_from(raw: RawSizeSpec) -> Result<Self, Self::Error> {
        let (geometry, policy) = match raw {
            RawSizeSpec::Bare(g) => (g, ResizePolicy::Scale),
            RawSizeSpec::Table { geometry, policy } => (geometry, policy),
            RawSizeSpec::List(items) => match items.as_slice() {
                [g] => (g.clone(), ResizePolicy::Scale),
                [g, p] => (g.clone(), p.parse()?),
                _ => {
                    return Err(format!(
                        "size must be [geometry] or [geometry, policy], got {} items",
                        items.len()
                    ));
                }
            },
        };
        let geometry = geometry
            .parse()
            .map_err(|e: GeometryError| e.to_string())?;
        Ok(Self { geometry, policy })
    }
}

impl From<SizeSpec> for RawSizeSpec {
    fn from(spec: SizeSpec) -> Self {
        match spec.policy {
            ResizePolicy::Scale => RawSizeSpec::Bare(spec.geometry.to_string()),
            ResizePolicy::Crop => RawSizeSpec::List(vec![
                spec.geometry.to_string(),
                ResizePolicy::Crop.as_str().to_string(),
            ]),
        }
    }
}

/// Ordered mapping of size name → [`SizeSpec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeTable {
    entries: Vec<(String, SizeSpec)>,
}

impl SizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a size. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, spec: SizeSpec) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.entries.push((name, spec)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SizeSpec> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    /// The first declared size name, used when no size is requested.
    pub fn first_name(&self) -> Option<&str> {
        self.entries.first().map(|(n, _)| n.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn entries(&self) -> &[(String, SizeSpec)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, SizeSpec)> for SizeTable {
    fn from_iter<T: IntoIterator<Item = (N, SizeSpec)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (name, spec) in iter {
            table.insert(name, spec);
        }
        table
    }
}

impl Serialize for SizeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, spec) in &self.entries {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SizeTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = SizeTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of size names to geometries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SizeTable, A::Error> {
                let mut table = SizeTable::new();
                while let Some((name, spec)) = access.next_entry::<String, SizeSpec>()? {
                    table.insert(name, spec);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
