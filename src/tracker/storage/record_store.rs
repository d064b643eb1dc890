use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::utils::clock::Clock;

use super::{
    entities::{NewRecord, Record},
    slot::SlotStorage,
};

/// Holds every completed session in insertion order and keeps the durable slot in sync with it.
///
/// The store is created once at startup and handed by reference to whatever needs it (the timer
/// session, the dashboard). There is no update or delete, records only ever get appended.
pub struct RecordStore<S> {
    slot: S,
    records: Vec<Record>,
    /// Highest numeric id seen so far, either loaded or issued.
    last_issued_id: u64,
    clock: Box<dyn Clock>,
}

impl<S: SlotStorage> RecordStore<S> {
    /// Loads the persisted sequence. An absent slot means an empty store. A slot that can't be
    /// parsed is moved aside and the store starts empty, a broken file never stops the tracker.
    #[instrument(skip_all)]
    pub async fn load(slot: S, clock: Box<dyn Clock>) -> Result<Self> {
        let records = match slot.load().await? {
            None => {
                debug!("No records were saved yet");
                vec![]
            }
            Some(contents) if contents.iter().all(u8::is_ascii_whitespace) => {
                debug!("Record slot is empty");
                vec![]
            }
            Some(contents) => match serde_json::from_slice::<Vec<Record>>(&contents) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Saved records are corrupted, starting with an empty list: {e}");
                    if let Err(e) = slot.discard_corrupt().await {
                        error!("Couldn't set corrupted records aside {e:?}");
                    }
                    vec![]
                }
            },
        };

        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                warn!("Loaded records contain a duplicate id {}", record.id);
            }
        }

        let last_issued_id = records
            .iter()
            .filter_map(|v| v.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        info!("Loaded {} records", records.len());

        Ok(Self {
            slot,
            records,
            last_issued_id,
            clock,
        })
    }

    /// Gives `entry` a fresh id, appends it and rewrites the slot. No validation happens here,
    /// empty activities and negative durations are stored as given.
    ///
    /// If the slot can't be written the record is dropped from memory again and the error is
    /// returned, so [RecordStore::list] never shows something that isn't persisted.
    #[instrument(skip(self))]
    pub async fn add(&mut self, entry: NewRecord) -> Result<Record> {
        let record = entry.with_id(self.next_id());
        self.records.push(record.clone());

        if let Err(e) = self.persist().await {
            self.records.pop();
            error!("Failed to persist record {}: {e:?}", record.id);
            return Err(e);
        }

        info!("Saved record {record:?}");
        Ok(record)
    }

    /// Every record in the order it was added.
    pub fn list(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Millisecond timestamp ids. Two records saved within the same millisecond, or a clock that
    /// went backwards, fall back to the previous id + 1.
    fn next_id(&mut self) -> String {
        let now = u64::try_from(self.clock.time().timestamp_millis()).unwrap_or(0);
        let id = if now > self.last_issued_id {
            Some(now)
        } else {
            self.last_issued_id.checked_add(1)
        };

        match id {
            Some(id) => {
                self.last_issued_id = id;
                id.to_string()
            }
            None => {
                warn!("Numeric record ids are exhausted, using a suffixed id");
                self.suffixed_id(now)
            }
        }
    }

    /// First `<millis>-<n>` that no loaded or issued record uses yet.
    fn suffixed_id(&self, now: u64) -> String {
        let taken = self.records.iter().map(|v| v.id.as_str()).collect::<HashSet<_>>();
        (0..=self.records.len())
            .map(|n| format!("{now}-{n}"))
            .find(|id| !taken.contains(id.as_str()))
            .unwrap_or_else(|| format!("{now}-{}", self.records.len() + 1))
    }

    async fn persist(&self) -> Result<()> {
        let contents =
            serde_json::to_vec(&self.records).context("Couldn't serialize records")?;
        self.slot.save(contents).await
    }
}
