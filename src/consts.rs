/// Standard date format used throughout the codebase: "2025-01-15"
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Number of days populated by `initialize` / `reset_week`
pub const WEEK_LEN: usize = 7;

/// Version written into the tracker file envelope
pub const FORMAT_VERSION: u32 = 1;

/// Canonical tracker file name inside the data directory
pub const TRACKER_FILE: &str = "tracker.json";

/// Suffix appended to the canonical path for the rolling backup
pub const BACKUP_SUFFIX: &str = "bak";

/// Suffix appended to a file that failed to parse
pub const CORRUPT_SUFFIX: &str = "corrupt";

/// Suffix appended to a file that exists but could not be read
pub const UNREADABLE_SUFFIX: &str = "unreadable";

/// Activity log file name inside the data directory
pub const ACTIVITY_LOG_FILE: &str = "squats_log.txt";

/// Default daily schedule: every 45 minutes from 8:00 AM to 5:00 PM
pub const DEFAULT_SLOT_LABELS: [&str; 13] = [
    "8:00 AM", "8:45 AM", "9:30 AM", "10:15 AM", "11:00 AM", "11:45 AM", "12:30 PM", "1:15 PM",
    "2:00 PM", "2:45 PM", "3:30 PM", "4:15 PM", "5:00 PM",
];
