//! Enum types for the beads system.
//!
//! Each enum has:
//! - Custom Serialize (as snake_case string)
//! - Custom Deserialize (known variants + catch-all Custom/Other(String))
//! - `as_str()`, `is_default()`, `Display` impl
//!
//! Status, dependency kind, orphan-handling mode, backend kind, and event
//! kind are closed tagged enumerations; each keeps a `Custom`/`Other`
//! escape hatch so a workspace can record a domain-specific tag without
//! the core rejecting it outright, while validation at the boundary keeps
//! internal operations working with well-formed values.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: defines an enum with known string variants + a Custom(String) fallback.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, custom_variant = $custom_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            $custom_variant(String),
        }

        impl $name {
            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::$custom_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }

            /// Returns `true` if this is a built-in (non-custom) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }

            /// Returns `true` if this is a known valid variant or any non-empty custom string.
            pub fn is_valid(&self) -> bool {
                match self {
                    Self::$custom_variant(s) => !s.is_empty(),
                    _ => true,
                }
            }

            /// Returns `true` if this is valid, also accepting the given custom values.
            pub fn is_valid_with_custom(&self, custom_values: &[&str]) -> bool {
                if self.is_builtin() {
                    return true;
                }
                if let Self::$custom_variant(s) = self {
                    return custom_values.contains(&s.as_str());
                }
                false
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::$custom_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                // Check known variants first to avoid allocation in common case.
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::$custom_variant(s),
                }
            }
        }
    };
}

// ===========================================================================
// Status
// ===========================================================================

define_enum! {
    /// Current state of an issue.
    Status, default = Open, custom_variant = Custom,
    variants: [
        (Open, "open"),
        (InProgress, "in_progress"),
        (Blocked, "blocked"),
        (Closed, "closed"),
        (Tombstone, "tombstone"),
    ]
}

impl Status {
    /// An issue in either of these terminal states is never ready.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Tombstone)
    }
}

// ===========================================================================
// IssueType
// ===========================================================================

define_enum! {
    /// Categorises the kind of work.
    IssueType, default = Task, custom_variant = Custom,
    variants: [
        (Task, "task"),
        (Bug, "bug"),
        (Feature, "feature"),
        (Epic, "epic"),
        (Chore, "chore"),
        (Discovered, "discovered"),
    ]
}

impl IssueType {
    /// Normalises common aliases to their canonical form.
    pub fn normalize(&self) -> Self {
        match self.as_str() {
            "enhancement" | "feat" => Self::Feature,
            "found" | "discovered-from" => Self::Discovered,
            _ => self.clone(),
        }
    }
}

// ===========================================================================
// DependencyType
// ===========================================================================

define_enum! {
    /// Relationship type between issues.
    DependencyType, default = Blocks, custom_variant = Custom,
    variants: [
        (Blocks, "blocks"),
        (ParentChild, "parent-child"),
        (ConditionalBlocks, "conditional-blocks"),
        (WaitsFor, "waits-for"),
        (Related, "related"),
        (DiscoveredFrom, "discovered-from"),
        (RepliesTo, "replies-to"),
        (Duplicates, "duplicates"),
        (Supersedes, "supersedes"),
    ]
}

impl DependencyType {
    /// The ready-blocking edge kinds: the subset of dependency kinds that
    /// can hold an issue out of the ready set.
    pub const READY_BLOCKING: [DependencyType; 4] = [
        DependencyType::Blocks,
        DependencyType::ParentChild,
        DependencyType::ConditionalBlocks,
        DependencyType::WaitsFor,
    ];

    /// Returns `true` if this dependency kind affects readiness.
    pub fn affects_ready_work(&self) -> bool {
        matches!(
            self,
            Self::Blocks | Self::ParentChild | Self::ConditionalBlocks | Self::WaitsFor
        )
    }
}

// ===========================================================================
// OrphanMode
// ===========================================================================

define_enum! {
    /// Policy for dependency edges whose target is missing on import.
    OrphanMode, default = Allow, custom_variant = Custom,
    variants: [
        (Allow, "allow"),
        (Skip, "skip"),
        (Strict, "strict"),
        (Resurrect, "resurrect"),
    ]
}

// ===========================================================================
// BackendKind
// ===========================================================================

define_enum! {
    /// Storage backend selection. Only `Embedded` ships in this core.
    BackendKind, default = Embedded, custom_variant = Custom,
    variants: [
        (Embedded, "embedded"),
        (Versioned, "versioned"),
    ]
}

// ===========================================================================
// EventType
// ===========================================================================

/// Categorises audit trail events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Created,
    Updated,
    StatusChanged,
    Commented,
    Closed,
    Reopened,
    DependencyAdded,
    DependencyRemoved,
    LabelAdded,
    LabelRemoved,
    Tombstoned,
    Merged,
    /// Catch-all for unknown / future event types.
    Other(String),
}

impl EventType {
    /// Returns the string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::StatusChanged => "status_changed",
            Self::Commented => "commented",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::DependencyAdded => "dependency_added",
            Self::DependencyRemoved => "dependency_removed",
            Self::LabelAdded => "label_added",
            Self::LabelRemoved => "label_removed",
            Self::Tombstoned => "tombstoned",
            Self::Merged => "merged",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Returns `true` if this is the default variant.
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Created)
    }
}

impl Default for EventType {
    fn default() -> Self {
        Self::Created
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "created" => Self::Created,
            "updated" => Self::Updated,
            "status_changed" => Self::StatusChanged,
            "commented" => Self::Commented,
            "closed" => Self::Closed,
            "reopened" => Self::Reopened,
            "dependency_added" => Self::DependencyAdded,
            "dependency_removed" => Self::DependencyRemoved,
            "label_added" => Self::LabelAdded,
            "label_removed" => Self::LabelRemoved,
            "tombstoned" => Self::Tombstoned,
            "merged" => Self::Merged,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_default_is_open() {
        assert_eq!(Status::default(), Status::Open);
        assert!(Status::Open.is_default());
        assert!(!Status::Closed.is_default());
    }

    #[test]
    fn status_terminal_states() {
        assert!(Status::Closed.is_terminal());
        assert!(Status::Tombstone.is_terminal());
        assert!(!Status::Open.is_terminal());
        assert!(!Status::Blocked.is_terminal());
    }

    #[test]
    fn status_roundtrip_serde() {
        let s = Status::InProgress;
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#""in_progress""#);
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn status_custom_roundtrip() {
        let json = r#""my_custom_status""#;
        let s: Status = serde_json::from_str(json).unwrap();
        assert_eq!(s, Status::Custom("my_custom_status".into()));
        assert_eq!(serde_json::to_string(&s).unwrap(), json);
    }

    #[test]
    fn dependency_type_as_str() {
        assert_eq!(DependencyType::ParentChild.as_str(), "parent-child");
        assert_eq!(
            DependencyType::ConditionalBlocks.as_str(),
            "conditional-blocks"
        );
    }

    #[test]
    fn dependency_type_affects_ready_work() {
        assert!(DependencyType::Blocks.affects_ready_work());
        assert!(DependencyType::ParentChild.affects_ready_work());
        assert!(!DependencyType::Related.affects_ready_work());
        assert!(!DependencyType::RepliesTo.affects_ready_work());
    }

    #[test]
    fn orphan_mode_roundtrip() {
        assert_eq!(OrphanMode::default(), OrphanMode::Allow);
        assert_eq!(OrphanMode::from("resurrect"), OrphanMode::Resurrect);
    }

    #[test]
    fn backend_kind_default_embedded() {
        assert_eq!(BackendKind::default(), BackendKind::Embedded);
    }

    #[test]
    fn event_type_other_variant() {
        let json = r#""custom_event""#;
        let e: EventType = serde_json::from_str(json).unwrap();
        assert_eq!(e, EventType::Other("custom_event".into()));
    }

    #[test]
    fn issue_type_normalize() {
        assert_eq!(
            IssueType::Custom("enhancement".into()).normalize(),
            IssueType::Feature
        );
        assert_eq!(IssueType::Bug.normalize(), IssueType::Bug);
    }
}
