pub mod cache_entry;
pub mod cached_bulk;
