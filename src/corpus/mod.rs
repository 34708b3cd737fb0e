//! External corpus engine boundary.

pub mod attribs;
pub mod engine;

pub use self::attribs::{CorpusAttribs, StructuralAttribute};
pub use self::engine::{ConcordanceRequest, CorpusEngine, EngineFactory};
