//! Event pick list.

use std::collections::HashSet;

use jme_core::{Error, EventId, Result};

/// `(run, event)` pairs selected for processing; empty picks every event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickList {
    events: HashSet<(u64, u64)>,
}

impl PickList {
    pub fn from_pairs(pairs: &[[u64; 2]]) -> Self {
        Self { events: pairs.iter().map(|[run, event]| (*run, *event)).collect() }
    }

    /// Parse one entry per line as `run:event` or `run:lumi:event`.
    ///
    /// Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut events = HashSet::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(':').map(str::trim).collect();
            let (run, event) = match fields.as_slice() {
                [run, event] | [run, _, event] => (*run, *event),
                _ => {
                    return Err(Error::Validation(format!(
                        "pick list line {}: expected run:event or run:lumi:event, got '{line}'",
                        lineno + 1
                    )));
                }
            };
            let parse = |s: &str| {
                s.parse::<u64>().map_err(|e| {
                    Error::Validation(format!("pick list line {}: '{s}': {e}", lineno + 1))
                })
            };
            events.insert((parse(run)?, parse(event)?));
        }
        Ok(Self { events })
    }

    /// Union of both lists.
    pub fn extend(&mut self, other: PickList) {
        self.events.extend(other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn contains(&self, run: u64, event: u64) -> bool {
        self.events.contains(&(run, event))
    }

    /// Whether `id` should be processed.
    pub fn picks(&self, id: &EventId) -> bool {
        self.is_empty() || self.contains(id.run, id.event)
    }
}
