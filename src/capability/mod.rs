//! Capability resolution.
//!
//! The engine exposes its pluggable capabilities (capture mechanism, test data
//! format) as foreign enumerations. A [`CapabilityTable`] is built once from
//! the members an enumeration declares and maps each canonical (uppercase)
//! name to a typed [`CapabilityToken`].
//!
//! Lookups are case-insensitive on the caller side: the requested name is
//! uppercased and compared against canonical names. A name that the
//! enumeration does not declare, or that has no Rust variant, is
//! [`WaatError::CapabilityNotFound`]. There is no fallback member.

pub mod format;
pub mod tool;

pub use format::InputFileType;
pub use tool::WebAnalyticTool;

use crate::bridge::{EnumerationSource, ForeignEnumeration};
use crate::WaatError;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// A closed set of capabilities mirrored from one foreign enumeration.
pub trait Capability: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// The foreign enumeration this capability is declared in
    const ENUMERATION: ForeignEnumeration;

    /// Map a canonical (uppercase) name to its variant
    fn from_canonical(name: &str) -> Option<Self>;

    /// Canonical name as declared by the engine
    fn canonical_name(&self) -> &'static str;
}

/// A resolved enumeration member.
///
/// Carries the Rust variant plus the member's position in the foreign
/// enumeration, which is what the bridge needs to hand the member back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityToken<C: Capability> {
    capability: C,
    ordinal: usize,
}

impl<C: Capability> CapabilityToken<C> {
    pub fn new(capability: C, ordinal: usize) -> Self {
        CapabilityToken {
            capability,
            ordinal,
        }
    }

    pub fn capability(&self) -> C {
        self.capability
    }

    /// Position of the member in the foreign enumeration
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &'static str {
        self.capability.canonical_name()
    }
}

impl<C: Capability> fmt::Display for CapabilityToken<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", C::ENUMERATION, self.name())
    }
}

/// Canonical name to token mapping for one enumeration.
#[derive(Debug, Clone)]
pub struct CapabilityTable<C: Capability> {
    by_name: HashMap<&'static str, CapabilityToken<C>>,
}

impl<C: Capability> CapabilityTable<C> {
    /// Build the table from member names in declaration order.
    pub fn from_members<S: AsRef<str>>(members: &[S]) -> Self {
        let mut by_name = HashMap::new();

        for (ordinal, member) in members.iter().enumerate() {
            let member = member.as_ref();
            let Some(capability) = C::from_canonical(member) else {
                debug!(
                    enumeration = %C::ENUMERATION,
                    member,
                    "skipping enumeration member with no known variant"
                );
                continue;
            };
            // First declaration wins
            by_name
                .entry(capability.canonical_name())
                .or_insert_with(|| CapabilityToken::new(capability, ordinal));
        }

        CapabilityTable { by_name }
    }

    /// Build the table from what the engine declares.
    pub fn load<S: EnumerationSource + ?Sized>(source: &mut S) -> Result<Self, WaatError> {
        let members = source
            .declared_members(C::ENUMERATION)
            .map_err(|source| WaatError::Delegation {
                operation: "values",
                source,
            })?;
        Ok(Self::from_members(&members))
    }

    /// Look up a member by name, ignoring case.
    pub fn resolve(&self, name: &str) -> Result<CapabilityToken<C>, WaatError> {
        let canonical = name.to_uppercase();
        self.by_name
            .get(canonical.as_str())
            .cloned()
            .ok_or_else(|| WaatError::CapabilityNotFound {
                enumeration: C::ENUMERATION.to_string(),
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Resolve a single name against an enumeration source.
pub fn resolve<C: Capability, S: EnumerationSource + ?Sized>(
    source: &mut S,
    name: &str,
) -> Result<CapabilityToken<C>, WaatError> {
    CapabilityTable::<C>::load(source)?.resolve(name)
}
