//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the record engine.
//! CONTEXT: Re-exports the record model and the row store for use by the
//! aggregation, report and server crates.

pub mod error;
pub mod record;
pub mod store;
pub mod value;

// Re-export commonly used types at the crate root
pub use error::StoreError;
pub use record::Record;
pub use store::{discover_headers, JsonFileRowStore, MemoryRowStore, RowId, RowStore, StoredRow};
pub use value::{format_number, FieldValue};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_builds_records() {
        let record: Record = [
            ("region", FieldValue::text("North")),
            ("sales", FieldValue::Number(100.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(record.get("sales"), Some(&FieldValue::Number(100.0)));
    }

    #[test]
    fn it_stores_behind_the_trait() {
        let mut store: Box<dyn RowStore> = Box::new(MemoryRowStore::new());
        let record: Record = [("k", FieldValue::Null)].into_iter().collect();
        store.replace_all(vec![record.clone(), record]).unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(discover_headers(store.as_ref()).unwrap(), vec!["k"]);
    }
}
