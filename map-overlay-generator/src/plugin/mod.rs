//! Plugin record format: identifiers, byte-level parsing and the layered record store.

#[cfg(any(test, feature = "fixtures"))]
pub mod builder;
pub mod form_id;
pub mod reader;
pub mod record;
pub mod store;

pub use form_id::{FileIndex, MasterTable, RawFormId, RecordIdentifier};
pub use record::{FourCc, RecordHeader, RecordView, SubField, SubFields};
pub use store::{DataFile, PluginHeader, PluginSource, RecordEntry, RecordStore, RecordVisitor};
