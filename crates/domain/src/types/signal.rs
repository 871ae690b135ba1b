//! Platform environment signals

use serde::{Deserialize, Serialize};

use crate::impl_domain_label_conversions;

/// Connectivity and visibility events reported by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentSignal {
    /// Network connectivity restored
    Online,
    /// Network connectivity lost
    Offline,
    /// The application became visible to the user
    Visible,
    /// The application was hidden or backgrounded
    Hidden,
}

impl_domain_label_conversions!(EnvironmentSignal {
    Online => "online",
    Offline => "offline",
    Visible => "visible",
    Hidden => "hidden",
});
