//! Storage is organized around a single durable slot.
//! The basic idea is:
//!  - [slot::SlotStorage] holds one blob, the JSON array of every saved [entities::Record].
//!  - [record_store::RecordStore] keeps the sequence in memory and rewrites the blob whole on
//!    every added record.

pub mod entities;
pub mod record_store;
pub mod slot;
