//! Trial datasets on disk.

pub mod jsonl;

pub use jsonl::{export_jsonl, import_jsonl, load_jsonl, save_jsonl, ExportStats, ImportStats};
