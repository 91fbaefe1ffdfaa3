//! Container settings.
//!
//! Deserializable from any serde format; every field has a default, so
//! a partial document is valid.
//!
//! ```
//! use rabita_container::settings::ContainerSettings;
//!
//! let settings = ContainerSettings::default();
//! assert_eq!(settings.fast_lookup_groups, 4);
//! assert_eq!(settings.max_alias_depth, 10);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::fast_lookup::{DEFAULT_GROUPS, MAX_GROUPS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// 16-slot groups in the singleton hot cache, clamped to `1..=16`.
    pub fast_lookup_groups: usize,

    /// Alias hops followed before giving up and using the requested name.
    pub max_alias_depth: usize,

    /// Load the singleton snapshot once before the first resolution.
    pub auto_load_snapshot: bool,

    /// Directory for [`FileSnapshotStore`](crate::snapshot::FileSnapshotStore);
    /// the system temp dir when unset.
    pub snapshot_dir: Option<PathBuf>,
}

impl ContainerSettings {
    pub fn fast_lookup_groups(&self) -> usize {
        self.fast_lookup_groups.clamp(1, MAX_GROUPS)
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            fast_lookup_groups: DEFAULT_GROUPS,
            max_alias_depth: 10,
            auto_load_snapshot: true,
            snapshot_dir: None,
        }
    }
}
