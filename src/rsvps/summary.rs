use serde::Serialize;

use super::Rsvp;

/// Totals shown on the dashboard tiles. Recomputed on every render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_rsvps: usize,
    pub total_adults: u64,
    pub total_kids: u64,
    pub total_guests: u64,
}

impl Summary {
    pub fn from_rsvps(rsvps: &[Rsvp]) -> Self {
        let total_adults = rsvps.iter().map(|r| u64::from(r.count_adults)).sum();
        let total_kids = rsvps.iter().map(|r| u64::from(r.count_kids)).sum();

        Summary {
            total_rsvps: rsvps.len(),
            total_adults,
            total_kids,
            total_guests: total_adults + total_kids,
        }
    }
}
