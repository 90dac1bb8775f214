//! `msDS-IntId` assignment.
//!
//! Forests at functional level 2003 or higher give every schema element that
//! is not part of the base schema a 32-bit internal identifier. Identifiers
//! come from `0x80000000..=0xBFFFFFFF`, which reads as negative when stored
//! as a signed integer and so never collides with the non-negative
//! attribute-ID space.

use super::set::SchemaSet;
use super::types::{ForestState, FunctionalLevel, SchemaElementDefinition};
use crate::value_objects::Oid;
use log::{trace, warn};
use sha2::{Digest, Sha256};

/// First identifier of the reserved range.
pub const INT_ID_RANGE_START: u32 = 0x8000_0000;
/// Last identifier of the reserved range.
pub const INT_ID_RANGE_END: u32 = 0xBFFF_FFFF;

const RANGE_SIZE: u32 = INT_ID_RANGE_END - INT_ID_RANGE_START + 1;

/// Decides whether an element gets an `msDS-IntId` and picks the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntIdAssigner;

impl IntIdAssigner {
    pub fn new() -> Self {
        Self
    }

    /// The assignment policy alone: level at least 2003 and the base-object
    /// flag clear.
    pub fn should_assign(definition: &SchemaElementDefinition, forest: &ForestState) -> bool {
        forest.functional_level >= FunctionalLevel::DS_DC_FUNCTION_2003
            && !definition.system_flags().is_base_object()
    }

    /// Whether `id` lies in the reserved range.
    pub fn in_range(id: i32) -> bool {
        (INT_ID_RANGE_START..=INT_ID_RANGE_END).contains(&(id as u32))
    }

    /// Offset into the reserved range where probing starts for `oid`.
    pub fn seed_for(oid: &Oid) -> u32 {
        let digest = Sha256::digest(oid.as_str().as_bytes());
        let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        word % RANGE_SIZE
    }

    /// Choose an identifier for `definition`, or `None` when the policy says
    /// it gets none, it already carries one, or the range is exhausted.
    pub fn assign(
        &self,
        definition: &SchemaElementDefinition,
        forest: &ForestState,
        schema: &SchemaSet,
    ) -> Option<i32> {
        if !Self::should_assign(definition, forest) || definition.internal_id().is_some() {
            return None;
        }
        if schema.internal_id_count() as u64 >= RANGE_SIZE as u64 {
            warn!("msDS-IntId range exhausted; '{}' gets no identifier", definition.name());
            return None;
        }

        let seed = Self::seed_for(definition.object_identifier());
        for step in 0..RANGE_SIZE {
            let candidate = (INT_ID_RANGE_START + (seed + step) % RANGE_SIZE) as i32;
            if !schema.is_internal_id_taken(candidate) {
                trace!(
                    "msDS-IntId {} for '{}' after {} probe(s)",
                    candidate,
                    definition.name(),
                    step + 1
                );
                return Some(candidate);
            }
        }
        None
    }
}
