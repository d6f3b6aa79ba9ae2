//! Deduplication and ordering of extracted trips.

use crate::listing::models::{Trip, TripKey};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::trace;

/// Collects trips unique by `(expedition, departs, returns)`.
///
/// On a key collision the incoming trip replaces the kept one only when it is
/// strictly richer (see [`Trip::richness`]); the slot keeps its first position.
#[derive(Debug, Default)]
pub struct TripCatalog {
    trips: Vec<Trip>,
    index: HashMap<TripKey, usize>,
}

impl TripCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a trip. Returns false if its key was already present.
    pub fn insert(&mut self, trip: Trip) -> bool {
        let key = trip.key();

        match self.index.get(&key) {
            Some(&slot) => {
                if trip.richness() > self.trips[slot].richness() {
                    trace!("Replacing duplicate trip with richer record: {:?}", key);
                    self.trips[slot] = trip;
                } else {
                    trace!("Dropping duplicate trip: {:?}", key);
                }
                false
            }
            None => {
                self.index.insert(key, self.trips.len());
                self.trips.push(trip);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// Consumes the catalog, returning trips ordered by departure date.
    /// Trips without a departure date go last; ties keep insertion order.
    pub fn into_sorted(self) -> Vec<Trip> {
        let mut trips = self.trips;
        trips.sort_by_key(|t| t.departs.unwrap_or(NaiveDate::MAX));
        trips
    }
}

impl Extend<Trip> for TripCatalog {
    fn extend<I: IntoIterator<Item = Trip>>(&mut self, iter: I) {
        for trip in iter {
            self.insert(trip);
        }
    }
}

impl FromIterator<Trip> for TripCatalog {
    fn from_iter<I: IntoIterator<Item = Trip>>(iter: I) -> Self {
        let mut catalog = Self::new();
        catalog.extend(iter);
        catalog
    }
}

/// Deduplicates and sorts trips in one step.
pub fn dedup_and_sort(trips: impl IntoIterator<Item = Trip>) -> Vec<Trip> {
    trips.into_iter().collect::<TripCatalog>().into_sorted()
}
