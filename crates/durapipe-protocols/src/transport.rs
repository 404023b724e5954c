//! Marshalling boundary between typed entities and their wire form.

use serde_json::Value;

use crate::error::TransportError;

/// Conversion between a typed entity and the untyped JSON map that crosses
/// the durability boundary.
///
/// The boundary does not preserve rich type identity - only plain maps and
/// scalars survive the round trip reliably - so every entity handed to an
/// activity call is lowered to transport form first and reconstructed on the
/// other side. Implementations are explicit per entity type; there is no
/// reflective fallback. Payloads without a recognized entity type go through
/// the raw activity path instead, unreconstructed.
pub trait Transport: Sized {
    /// Lower to transport form. Always a JSON object, field-for-field.
    fn to_transport(&self) -> Value;

    /// Reconstruct the typed entity from transport form.
    fn from_transport(value: Value) -> Result<Self, TransportError>;
}
