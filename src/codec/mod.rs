//! Categorical codecs: id/name mappings backed by code tables.

pub mod codec;
pub mod person;
pub mod registry;
pub mod source;
pub mod specification;

pub use self::codec::{Codec, CodecDirection, LookupTable, MappingFn, ValueMapping};
pub use self::person::{MultiplePartyAbbrevsHook, PersonCodecs};
pub use self::registry::{
    CodeTable, Codecs, DecodeOptions, LoadState, OnLoadHook, PropertyValue, PropertyValues,
};
pub use self::source::{CodecSource, CsvDirectoryReader, JsonDocumentReader, TableReader};
pub use self::specification::{CodeTableSpec, CodecSpec, CodecSpecification, PropertySpec};
