//! Memory map model.
//!
//! A memory map is an ordered list of named regions. Names are unique
//! within a map and every region must fit inside a 64-bit address space;
//! both rules are enforced on insertion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Access permissions of a memory region (a non-empty subset of R, W, X).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Access {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl Access {
    /// Read, write and execute.
    pub const RWX: Access = Access {
        read: true,
        write: true,
        execute: true,
    };
    /// Read and execute.
    pub const RX: Access = Access {
        read: true,
        write: false,
        execute: true,
    };
    /// Read and write.
    pub const RW: Access = Access {
        read: true,
        write: true,
        execute: false,
    };
    /// Read only.
    pub const R: Access = Access {
        read: true,
        write: false,
        execute: false,
    };
}

impl FromStr for Access {
    type Err = ModelError;

    /// Parse a permission string such as `"RWX"` or `"RX"`.
    ///
    /// Letters may appear in any order but only once each; the empty
    /// string and anything outside `R`, `W`, `X` are rejected.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ModelError::InvalidAccess {
            value: s.to_string(),
        };
        if s.is_empty() {
            return Err(invalid());
        }
        let mut access = Access {
            read: false,
            write: false,
            execute: false,
        };
        for c in s.chars() {
            let slot = match c {
                'R' => &mut access.read,
                'W' => &mut access.write,
                'X' => &mut access.execute,
                _ => return Err(invalid()),
            };
            if *slot {
                return Err(invalid());
            }
            *slot = true;
        }
        Ok(access)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read {
            f.write_str("R")?;
        }
        if self.write {
            f.write_str("W")?;
        }
        if self.execute {
            f.write_str("X")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Access {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Access> for String {
    fn from(access: Access) -> Self {
        access.to_string()
    }
}

/// Which kinds of sections a region may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressSpace {
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "data")]
    Data,
    #[serde(rename = "code/data")]
    CodeData,
}

impl AddressSpace {
    /// The tag used in descriptor files.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressSpace::Code => "code",
            AddressSpace::Data => "data",
            AddressSpace::CodeData => "code/data",
        }
    }

    pub fn holds_code(&self) -> bool {
        matches!(self, AddressSpace::Code | AddressSpace::CodeData)
    }

    pub fn holds_data(&self) -> bool {
        matches!(self, AddressSpace::Data | AddressSpace::CodeData)
    }
}

impl FromStr for AddressSpace {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "code" => Ok(AddressSpace::Code),
            "data" => Ok(AddressSpace::Data),
            "code/data" => Ok(AddressSpace::CodeData),
            other => Err(ModelError::InvalidSpace {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named region of a board's memory map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MemoryRegion {
    /// Region name (e.g., "SRAM", "DDR3").
    pub name: String,
    /// Base address.
    #[serde(with = "hex_address")]
    pub base: u64,
    /// Length in bytes.
    #[serde(with = "hex_address")]
    pub len: u64,
    /// Address space tag.
    pub space: AddressSpace,
    /// Access permissions.
    pub access: Access,
}

impl MemoryRegion {
    pub fn new(
        name: impl Into<String>,
        base: u64,
        len: u64,
        space: AddressSpace,
        access: Access,
    ) -> Self {
        Self {
            name: name.into(),
            base,
            len,
            space,
            access,
        }
    }

    /// One past the last address, or `None` if `base + len` overflows.
    pub fn end(&self) -> Option<u64> {
        self.base.checked_add(self.len)
    }

    /// Whether the half-open ranges of the two regions intersect.
    pub fn overlaps(&self, other: &MemoryRegion) -> bool {
        let a_end = self.base.saturating_add(self.len);
        let b_end = other.base.saturating_add(other.len);
        self.base < b_end && other.base < a_end
    }
}

/// Addresses are written as `"0x..."` strings because TOML integers stop at
/// `i64::MAX`. Plain integers and decimal strings are still accepted.
mod hex_address {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{value:X}"))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Int(value) => Ok(value),
            Repr::Text(text) => parse(&text)
                .ok_or_else(|| de::Error::custom(format!("invalid address '{text}'"))),
        }
    }

    pub(super) fn parse(text: &str) -> Option<u64> {
        match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16).ok(),
            None => text.parse().ok(),
        }
    }
}

/// An ordered memory map with unique region names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryMap {
    regions: Vec<MemoryRegion>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from regions, rejecting duplicates and overflowing regions.
    pub fn from_regions(regions: impl IntoIterator<Item = MemoryRegion>) -> Result<Self> {
        let mut map = Self::new();
        for region in regions {
            map.insert(region)?;
        }
        Ok(map)
    }

    /// Wrap regions known to be well formed; used for built-in boards,
    /// whose tests re-check uniqueness and bounds.
    pub(crate) fn from_literal(regions: Vec<MemoryRegion>) -> Self {
        Self { regions }
    }

    /// Append a region to the map.
    pub fn insert(&mut self, region: MemoryRegion) -> Result<()> {
        if self.contains(&region.name) {
            return Err(ModelError::DuplicateRegion { name: region.name });
        }
        if region.end().is_none() {
            return Err(ModelError::AddressOverflow {
                name: region.name,
                base: region.base,
                len: region.len,
            });
        }
        self.regions.push(region);
        Ok(())
    }

    /// Look up a region by name.
    pub fn get(&self, name: &str) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryRegion> {
        self.regions.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Sum of all region lengths, or `None` if it does not fit in a `u64`.
    pub fn total_len(&self) -> Option<u64> {
        self.regions
            .iter()
            .try_fold(0u64, |acc, r| acc.checked_add(r.len))
    }

    /// Every pair of regions whose ranges intersect.
    pub fn overlapping_pairs(&self) -> Vec<(&MemoryRegion, &MemoryRegion)> {
        let mut pairs = Vec::new();
        for i in 0..self.regions.len() {
            for j in (i + 1)..self.regions.len() {
                if self.regions[i].overlaps(&self.regions[j]) {
                    pairs.push((&self.regions[i], &self.regions[j]));
                }
            }
        }
        pairs
    }

    /// Names that occur more than once. Only reachable for maps that were
    /// deserialized rather than built through [`MemoryMap::insert`].
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut dups: Vec<&str> = Vec::new();
        for (i, r) in self.regions.iter().enumerate() {
            if self.regions[..i].iter().any(|p| p.name == r.name) && !dups.contains(&r.name.as_str())
            {
                dups.push(&r.name);
            }
        }
        dups
    }
}

impl<'a> IntoIterator for &'a MemoryMap {
    type Item = &'a MemoryRegion;
    type IntoIter = std::slice::Iter<'a, MemoryRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
