//! Object key conventions.
//!
//! Pure string functions with no storage dependency. These define the
//! canonical layout of objects in the Pantry bucket.

pub fn record(collection: &str, id: u64) -> String {
    format!("{collection}/{id}.json")
}

pub fn collection_prefix(collection: &str) -> String {
    format!("{collection}/")
}

/// Counter document holding the last id handed out for a collection.
pub fn sequence(collection: &str) -> String {
    format!("{SEQUENCES_PREFIX}{collection}.json")
}

pub const SEQUENCES_PREFIX: &str = "_sequences/";

/// Recover the record id from a key produced by [`record`].
pub fn parse_record_id(collection: &str, key: &str) -> Option<u64> {
    key.strip_prefix(collection)?
        .strip_prefix('/')?
        .strip_suffix(".json")?
        .parse()
        .ok()
}
