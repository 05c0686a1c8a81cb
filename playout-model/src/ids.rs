use uuid::Uuid;

/// Declares a catalog-assigned numeric identifier. Catalog ids are stable
/// integers so that persisted anchors and tests stay readable.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(value: u64) -> Self {
                $name(value)
            }

            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }
    };
}

numeric_id!(
    /// Identity of a playable media item in the external catalog.
    MediaItemId
);
numeric_id!(
    /// Identity of a collection, multi-collection or smart collection.
    CollectionId
);
numeric_id!(
    /// Identity of a playlist.
    PlaylistId
);
numeric_id!(
    /// Identity of the show an episode belongs to.
    ShowId
);
numeric_id!(
    /// Identity of a single rule inside a program schedule.
    ScheduleItemId
);

/// Strongly typed id for a playout (one channel timeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PlayoutId(pub Uuid);

impl Default for PlayoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayoutId {
    pub fn new() -> Self {
        PlayoutId(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for PlayoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed id for a program schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ScheduleId(pub Uuid);

impl Default for ScheduleId {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleId {
    pub fn new() -> Self {
        ScheduleId(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
