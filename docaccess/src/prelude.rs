//! Convenient re-exports of commonly used types from docaccess.
//!
//! ```ignore
//! use docaccess::prelude::*;
//! ```

pub use docaccess_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    collection::Collection,
    datamap,
    error::{AccessError, AccessResult},
    object_id::{bare_object_id, parse_object_id},
    query::{Namespace, Sort, SortDirection},
    store::DocumentStore,
    value::{DataMap, DataMapExt, Value},
};
