use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use bson::{Document, doc};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_STATUS: &str = "offline";
pub const DEFAULT_HEALTH: &str = "Unknown";
pub const DEFAULT_WATER: &str = "Not watered yet";
pub const DEFAULT_IMAGE: &str =
    "https://images.unsplash.com/photo-1466781783364-36c955e42a7f?w=400&h=400&fit=crop";
pub const DEFAULT_AGE_MONTHS: i64 = 0;

/// Current time at the precision the store keeps (milliseconds).
///
/// Values handed back to callers must compare equal to what a later read
/// returns, so every timestamp written goes through here.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

// ---------------------------------------------------------------------------
// PlantId
// ---------------------------------------------------------------------------

/// Identifier of a stored plant.
///
/// Wraps the store-native `ObjectId`; at every boundary it is a 24-digit
/// hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlantId(ObjectId);

impl PlantId {
    /// Generate a fresh identifier, the same way the driver does on insert.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for PlantId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl FromStr for PlantId {
    type Err = PlantIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|_| PlantIdParseError(s.to_owned()))
    }
}

impl Serialize for PlantId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for PlantId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error returned when parsing an invalid [`PlantId`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid plant id: {0:?}")]
pub struct PlantIdParseError(pub String);

// ---------------------------------------------------------------------------
// Stored document
// ---------------------------------------------------------------------------

/// A plant as it is stored in the `plants` collection.
///
/// `id` is `None` only before insertion; every document read back from a
/// store carries its `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub species: String,
    pub status: String,
    pub health: String,
    pub water: String,
    pub image: String,
    pub age_months: i64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// API shapes
// ---------------------------------------------------------------------------

/// A plant as returned to API clients: the store id is exposed as a plain
/// string under `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: PlantId,
    pub name: String,
    pub species: String,
    pub status: String,
    pub health: String,
    pub water: String,
    pub image: String,
    pub age_months: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Error returned when a stored document has no `_id`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("stored plant document {name:?} has no _id")]
pub struct MissingIdError {
    pub name: String,
}

impl TryFrom<PlantDocument> for Plant {
    type Error = MissingIdError;

    fn try_from(doc: PlantDocument) -> Result<Self, Self::Error> {
        let Some(oid) = doc.id else {
            return Err(MissingIdError { name: doc.name });
        };
        Ok(Self {
            id: PlantId(oid),
            name: doc.name,
            species: doc.species,
            status: doc.status,
            health: doc.health,
            water: doc.water,
            image: doc.image,
            age_months: doc.age_months,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

/// Input for creating a plant. Only `name` and `species` are required;
/// omitted or `null` fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPlant {
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub water: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub age_months: Option<i64>,
}

impl NewPlant {
    pub fn new(name: impl Into<String>, species: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            species: species.into(),
            ..Self::default()
        }
    }

    /// Build the document to insert, filling defaults. Both timestamps are
    /// set to `now`.
    pub fn into_document(self, now: DateTime<Utc>) -> PlantDocument {
        PlantDocument {
            id: None,
            name: self.name,
            species: self.species,
            status: self.status.unwrap_or_else(|| DEFAULT_STATUS.to_owned()),
            health: self.health.unwrap_or_else(|| DEFAULT_HEALTH.to_owned()),
            water: self.water.unwrap_or_else(|| DEFAULT_WATER.to_owned()),
            image: self.image.unwrap_or_else(|| DEFAULT_IMAGE.to_owned()),
            age_months: self.age_months.unwrap_or(DEFAULT_AGE_MONTHS),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sparse update input: only fields that are present (and not `null`) are
/// applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub water: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub age_months: Option<i64>,
}

impl PlantUpdate {
    /// True when no field is set. `updated_at` is still refreshed for an
    /// empty update.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.species.is_none()
            && self.status.is_none()
            && self.health.is_none()
            && self.water.is_none()
            && self.image.is_none()
            && self.age_months.is_none()
    }

    /// Merge the present fields into `doc` and set `updated_at`.
    pub fn apply(&self, doc: &mut PlantDocument, now: DateTime<Utc>) {
        if let Some(ref name) = self.name {
            doc.name = name.clone();
        }
        if let Some(ref species) = self.species {
            doc.species = species.clone();
        }
        if let Some(ref status) = self.status {
            doc.status = status.clone();
        }
        if let Some(ref health) = self.health {
            doc.health = health.clone();
        }
        if let Some(ref water) = self.water {
            doc.water = water.clone();
        }
        if let Some(ref image) = self.image {
            doc.image = image.clone();
        }
        if let Some(age_months) = self.age_months {
            doc.age_months = age_months;
        }
        doc.updated_at = now;
    }

    /// Render the same merge as the body of a `$set` operator.
    pub fn to_set_document(&self, now: DateTime<Utc>) -> Document {
        let mut set_ops = doc! {};
        if let Some(ref name) = self.name {
            set_ops.insert("name", name);
        }
        if let Some(ref species) = self.species {
            set_ops.insert("species", species);
        }
        if let Some(ref status) = self.status {
            set_ops.insert("status", status);
        }
        if let Some(ref health) = self.health {
            set_ops.insert("health", health);
        }
        if let Some(ref water) = self.water {
            set_ops.insert("water", water);
        }
        if let Some(ref image) = self.image {
            set_ops.insert("image", image);
        }
        if let Some(age_months) = self.age_months {
            set_ops.insert("age_months", age_months);
        }
        set_ops.insert("updated_at", bson::DateTime::from_chrono(now));
        set_ops
    }
}

/// Confirmation returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
    pub id: String,
}

impl DeleteConfirmation {
    pub const MESSAGE: &str = "Plant deleted successfully";

    /// `id` is echoed exactly as the caller supplied it.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            message: Self::MESSAGE.to_owned(),
            id: id.into(),
        }
    }
}
