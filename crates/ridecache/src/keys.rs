// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Logical cache keys for carpool data.
//!
//! These are the keys *within* a category; the category's policy adds its prefix.
//! For example, ride `42` lives under `rides:` + [`ride("42")`](ride), i.e. `rides:ride:42`.

use serde::{Deserialize, Serialize};

/// Search filters for ride listings.
///
/// Unset fields are left out of the cache key, and set fields appear in declaration
/// order, so equal filters always map to the same key and different filters never
/// share one.
///
/// ```
/// use ridecache::keys::{self, RideFilters};
///
/// let filters = RideFilters::new().from("North Campus").min_seats(2);
/// assert_eq!(keys::ride_listings(&filters), r#"list:{"from":"North Campus","min_seats":2}"#);
/// assert_eq!(keys::ride_listings(&RideFilters::new()), "list:{}");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RideFilters {
    /// Pickup location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Drop-off location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Departure date as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Minimum free seats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_seats: Option<u8>,
    /// Maximum price per seat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price_cents: Option<u32>,
}

impl RideFilters {
    /// Creates filters that match every ride.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to rides leaving from `origin`.
    #[must_use]
    pub fn from(mut self, origin: impl Into<String>) -> Self {
        self.from = Some(origin.into());
        self
    }

    /// Restricts to rides heading to `destination`.
    #[must_use]
    pub fn to(mut self, destination: impl Into<String>) -> Self {
        self.to = Some(destination.into());
        self
    }

    /// Restricts to rides departing on `date`.
    #[must_use]
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Restricts to rides with at least `seats` free seats.
    #[must_use]
    pub fn min_seats(mut self, seats: u8) -> Self {
        self.min_seats = Some(seats);
        self
    }

    /// Restricts to rides costing at most `cents`.
    #[must_use]
    pub fn max_price_cents(mut self, cents: u32) -> Self {
        self.max_price_cents = Some(cents);
        self
    }

    /// Returns true if no filter is set.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }
}

/// Key of a ride search result.
#[must_use]
pub fn ride_listings(filters: &RideFilters) -> String {
    // Strings and integers always encode; the fallback is unreachable in practice.
    let encoded = serde_json::to_string(filters).unwrap_or_else(|_| String::from("{}"));
    format!("list:{encoded}")
}

/// Key of the unfiltered ride listing.
#[must_use]
pub fn all_ride_listings() -> String {
    ride_listings(&RideFilters::default())
}

/// Key of a single ride.
#[must_use]
pub fn ride(ride_id: &str) -> String {
    format!("ride:{ride_id}")
}

/// Key of a user's profile.
#[must_use]
pub fn user_profile(user_id: &str) -> String {
    format!("profile:{user_id}")
}

/// Key of a user's ride history.
#[must_use]
pub fn user_rides(user_id: &str) -> String {
    format!("rides:{user_id}")
}

/// Key of a user's wallet transactions.
#[must_use]
pub fn user_transactions(user_id: &str) -> String {
    format!("transactions:{user_id}")
}
