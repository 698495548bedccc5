//! Miscellaneous built-in asset types

use crate::asset::{Asset, AssetBase, AssetType, TypeTag};
use crate::property::Property;

/// An opaque byte blob
#[derive(Debug)]
pub struct RawData {
    base: AssetBase,
    /// The payload
    pub data: Property<Vec<u8>>,
}

impl RawData {
    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.data.with(Vec::len)
    }

    /// Check whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Asset for RawData {
    fn base(&self) -> &AssetBase {
        &self.base
    }
}

impl AssetType for RawData {
    const TYPE: TypeTag = TypeTag::new("misc::raw_data");
    const TITLE: &'static str = "Raw Data";

    fn construct(base: AssetBase) -> Self {
        Self {
            data: base.property("data", Vec::new()),
            base,
        }
    }
}
