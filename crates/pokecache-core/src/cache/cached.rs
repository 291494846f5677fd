use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored value together with the time it was written.
///
/// `cached_at` is `None` for rows written before the store tracked write times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Some(Utc::now()),
        }
    }

    pub fn into_inner(self) -> T {
        self.data
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.cached_at.map(|at| (Utc::now() - at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let Some(minutes) = self.age_minutes() else {
            return "unknown".to_string();
        };
        if minutes < 1 {
            // Covers clock skew as well
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}
