//! Restriction kinds and their platform capability mapping.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One named category of limitation.
///
/// Each kind maps to exactly one platform capability, resolved by the
/// capability adapter from [`RestrictionKind::capability_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RestrictionKind {
    /// Cannot speak anywhere.
    Mute,
    /// Cannot speak in meta channels.
    MetaMute,
    /// Cannot speak in assistance channels.
    HelpMute,
    /// Cannot access assistance channels.
    NoHelp,
    /// Cannot access the tech channel.
    NoTech,
    /// Cannot access art channels.
    NoArt,
    /// Cannot access elsewhere channels.
    NoElsewhere,
    /// Cannot embed links or attach files.
    NoEmbed,
    /// On probation.
    Probation,
}

/// Error returned when parsing an unknown kind key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown restriction kind: {0}")]
pub struct UnknownKind(pub String);

impl RestrictionKind {
    /// Every kind, in storage-key order.
    pub const ALL: [RestrictionKind; 9] = [
        RestrictionKind::Mute,
        RestrictionKind::MetaMute,
        RestrictionKind::HelpMute,
        RestrictionKind::NoHelp,
        RestrictionKind::NoTech,
        RestrictionKind::NoArt,
        RestrictionKind::NoElsewhere,
        RestrictionKind::NoEmbed,
        RestrictionKind::Probation,
    ];

    /// Stable key used in storage rows and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mute => "mute",
            Self::MetaMute => "meta-mute",
            Self::HelpMute => "help-mute",
            Self::NoHelp => "no-help",
            Self::NoTech => "no-tech",
            Self::NoArt => "no-art",
            Self::NoElsewhere => "no-elsewhere",
            Self::NoEmbed => "no-embed",
            Self::Probation => "probation",
        }
    }

    /// Platform capability granted while the restriction is active.
    pub fn capability_name(&self) -> &'static str {
        match self {
            Self::Mute => "Muted",
            Self::MetaMute => "meta-mute",
            Self::HelpMute => "help-mute",
            Self::NoHelp => "No-Help",
            Self::NoTech => "No-Tech",
            Self::NoArt => "No-art",
            Self::NoElsewhere => "No-elsewhere",
            Self::NoEmbed => "No-Embed",
            Self::Probation => "Probation",
        }
    }
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestrictionKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
