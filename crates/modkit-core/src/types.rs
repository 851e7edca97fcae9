//! Record types decoded from service responses.
//!
//! Records are borrowed views: string fields point into the parsed
//! response document and every record carries a [`Doc`] for late-bound
//! field access. The document lives exactly as long as the continuation
//! that receives it, so none of these types are `'static`.
//!
//! Decoding is tolerant by design. Fields the service omits decode to
//! their zero values, matching the accessor defaults in [`crate::doc`].

use crate::doc::Doc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decode a record view from one object node of a response document.
pub trait FromDoc<'doc>: Sized {
    /// Build the view. Missing fields decode to defaults, never panic.
    fn from_doc(node: &'doc Value) -> Self;
}

// ============================================================================
// Scalar helpers
// ============================================================================

fn field_u64(node: &Value, key: &str) -> u64 {
    node.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn field_i64(node: &Value, key: &str) -> i64 {
    node.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn field_str<'doc>(node: &'doc Value, key: &str) -> &'doc str {
    node.get(key).and_then(Value::as_str).unwrap_or("")
}

// Stand-in node for absent sub-objects; every accessor on it defaults.
static EMPTY_NODE: Value = Value::Null;

// ============================================================================
// Games
// ============================================================================

/// A game registered on the service.
#[derive(Clone, Copy, Debug)]
pub struct Game<'doc> {
    /// Game id; always > 0 in service responses.
    pub id: u64,
    /// Display name.
    pub name: &'doc str,
    /// Raw document access for fields not modeled here.
    pub more: Doc<'doc>,
}

impl<'doc> FromDoc<'doc> for Game<'doc> {
    fn from_doc(node: &'doc Value) -> Self {
        Self {
            id: field_u64(node, "id"),
            name: field_str(node, "name"),
            more: Doc::new(node),
        }
    }
}

// ============================================================================
// Mods
// ============================================================================

/// Moderation status of a mod.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModStatus {
    /// Submitted but not yet accepted.
    #[default]
    NotAccepted,
    /// Publicly listed.
    Accepted,
    /// Archived by its team.
    Archived,
    /// Deleted.
    Deleted,
}

impl ModStatus {
    /// Map the wire integer onto a status. Unknown values decode as
    /// [`ModStatus::NotAccepted`].
    #[must_use]
    pub const fn from_wire(value: i64) -> Self {
        match value {
            1 => Self::Accepted,
            2 => Self::Archived,
            3 => Self::Deleted,
            _ => Self::NotAccepted,
        }
    }
}

/// Aggregate counters attached to a mod.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Total downloads.
    pub downloads: u64,
    /// Current subscriber count.
    pub subscribers: u64,
    /// Positive ratings.
    pub ratings_positive: u64,
    /// Negative ratings.
    pub ratings_negative: u64,
}

impl Stats {
    fn from_node(node: &Value) -> Self {
        Self {
            downloads: field_u64(node, "downloads_total"),
            subscribers: field_u64(node, "subscribers_total"),
            ratings_positive: field_u64(node, "ratings_positive"),
            ratings_negative: field_u64(node, "ratings_negative"),
        }
    }
}

/// A mod belonging to a game.
#[derive(Clone, Copy, Debug)]
pub struct Mod<'doc> {
    /// Mod id; always > 0 in service responses.
    pub id: u64,
    /// Owning game id; always > 0 in service responses.
    pub game_id: u64,
    /// Id of the currently published modfile, or 0 when the mod has no
    /// published file.
    pub modfile_id: u64,
    /// Unix timestamp of the last update.
    pub date_updated: u64,
    /// Display name.
    pub name: &'doc str,
    /// One-paragraph summary.
    pub summary: &'doc str,
    /// Moderation status.
    pub status: ModStatus,
    /// The submitting user.
    pub submitted_by: User<'doc>,
    /// Aggregate counters.
    pub stats: Stats,
    /// Raw document access for fields not modeled here.
    pub more: Doc<'doc>,
}

impl<'doc> FromDoc<'doc> for Mod<'doc> {
    fn from_doc(node: &'doc Value) -> Self {
        let modfile_id = node
            .get("modfile")
            .map_or(0, |modfile| field_u64(modfile, "id"));
        let submitted_by = User::from_doc(node.get("submitted_by").unwrap_or(&EMPTY_NODE));
        let stats = node.get("stats").map_or_else(Stats::default, Stats::from_node);

        Self {
            id: field_u64(node, "id"),
            game_id: field_u64(node, "game_id"),
            modfile_id,
            date_updated: field_u64(node, "date_updated"),
            name: field_str(node, "name"),
            summary: field_str(node, "summary"),
            status: ModStatus::from_wire(field_i64(node, "status")),
            submitted_by,
            stats,
            more: Doc::new(node),
        }
    }
}

// ============================================================================
// Modfiles
// ============================================================================

/// A downloadable artifact attached to a mod.
///
/// `url` is non-empty whenever `filesize > 0`; the service never
/// publishes a sized file without a download location.
#[derive(Clone, Copy, Debug)]
pub struct Modfile<'doc> {
    /// Modfile id.
    pub id: u64,
    /// Owning mod id.
    pub mod_id: u64,
    /// Unix timestamp of upload.
    pub date_added: u64,
    /// MD5 digest of the archive, hex-encoded.
    pub md5: &'doc str,
    /// Download URL for the archive.
    pub url: &'doc str,
    /// Archive size in bytes.
    pub filesize: u64,
    /// Raw document access for fields not modeled here.
    pub more: Doc<'doc>,
}

impl<'doc> FromDoc<'doc> for Modfile<'doc> {
    fn from_doc(node: &'doc Value) -> Self {
        let md5 = node
            .get("filehash")
            .map_or("", |hash| field_str(hash, "md5"));
        let url = node
            .get("download")
            .map_or("", |download| field_str(download, "binary_url"));

        Self {
            id: field_u64(node, "id"),
            mod_id: field_u64(node, "mod_id"),
            date_added: field_u64(node, "date_added"),
            md5,
            url,
            filesize: field_u64(node, "filesize"),
            more: Doc::new(node),
        }
    }
}

// ============================================================================
// Users, ratings, dependencies
// ============================================================================

/// A user account on the service.
#[derive(Clone, Copy, Debug)]
pub struct User<'doc> {
    /// User id.
    pub id: u64,
    /// Login name.
    pub username: &'doc str,
    /// Raw document access for fields not modeled here.
    pub more: Doc<'doc>,
}

impl<'doc> FromDoc<'doc> for User<'doc> {
    fn from_doc(node: &'doc Value) -> Self {
        Self {
            id: field_u64(node, "id"),
            username: field_str(node, "username"),
            more: Doc::new(node),
        }
    }
}

/// One rating submitted by the authenticated user.
#[derive(Clone, Copy, Debug)]
pub struct Rating<'doc> {
    /// Game the rated mod belongs to.
    pub game_id: u64,
    /// The rated mod.
    pub mod_id: u64,
    /// Unix timestamp of the rating.
    pub date_added: u64,
    /// `1` for positive, `-1` for negative.
    pub rating: i64,
    /// Raw document access for fields not modeled here.
    pub more: Doc<'doc>,
}

impl<'doc> FromDoc<'doc> for Rating<'doc> {
    fn from_doc(node: &'doc Value) -> Self {
        Self {
            game_id: field_u64(node, "game_id"),
            mod_id: field_u64(node, "mod_id"),
            date_added: field_u64(node, "date_added"),
            rating: field_i64(node, "rating"),
            more: Doc::new(node),
        }
    }
}

/// A dependency edge between mods.
#[derive(Clone, Copy, Debug)]
pub struct Dependency<'doc> {
    /// The mod the queried mod depends on.
    pub mod_id: u64,
    /// Raw document access for fields not modeled here.
    pub more: Doc<'doc>,
}

impl<'doc> FromDoc<'doc> for Dependency<'doc> {
    fn from_doc(node: &'doc Value) -> Self {
        Self {
            mod_id: field_u64(node, "mod_id"),
            more: Doc::new(node),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Kind of a server-side event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Event string not recognized by this client.
    #[default]
    Unknown,
    /// The user subscribed to a mod.
    Subscribe,
    /// The user unsubscribed from a mod.
    Unsubscribe,
    /// The user joined a mod team.
    TeamJoin,
    /// The user left a mod team.
    TeamLeave,
    /// A mod became available.
    ModAvailable,
    /// A mod became unavailable.
    ModUnavailable,
    /// A mod was edited.
    ModEdited,
    /// A mod was deleted.
    ModDeleted,
    /// A mod's primary file changed.
    ModfileChanged,
}

impl EventType {
    /// Map the wire string onto an event kind.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "USER_SUBSCRIBE" => Self::Subscribe,
            "USER_UNSUBSCRIBE" => Self::Unsubscribe,
            "USER_TEAM_JOIN" => Self::TeamJoin,
            "USER_TEAM_LEAVE" => Self::TeamLeave,
            "MOD_AVAILABLE" => Self::ModAvailable,
            "MOD_UNAVAILABLE" => Self::ModUnavailable,
            "MOD_EDITED" => Self::ModEdited,
            "MOD_DELETED" => Self::ModDeleted,
            "MODFILE_CHANGED" => Self::ModfileChanged,
            _ => Self::Unknown,
        }
    }
}

/// A server-side event, from the per-game or per-user event streams.
#[derive(Clone, Copy, Debug)]
pub struct Event<'doc> {
    /// Event id.
    pub id: u64,
    /// Game the event belongs to.
    pub game_id: u64,
    /// Mod the event refers to.
    pub mod_id: u64,
    /// Acting user.
    pub user_id: u64,
    /// Unix timestamp of the event.
    pub date_added: u64,
    /// Kind of event.
    pub event_type: EventType,
    /// Raw document access for fields not modeled here.
    pub more: Doc<'doc>,
}

impl<'doc> FromDoc<'doc> for Event<'doc> {
    fn from_doc(node: &'doc Value) -> Self {
        Self {
            id: field_u64(node, "id"),
            game_id: field_u64(node, "game_id"),
            mod_id: field_u64(node, "mod_id"),
            user_id: field_u64(node, "user_id"),
            date_added: field_u64(node, "date_added"),
            event_type: EventType::from_wire(field_str(node, "event_type")),
            more: Doc::new(node),
        }
    }
}

// ============================================================================
// Pagination and page decoding
// ============================================================================

/// Offset pagination attached to list responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Offset of the first returned record.
    pub offset: u64,
    /// Requested page size.
    pub limit: u64,
    /// Total matching records on the server.
    pub total: u64,
}

impl Pagination {
    /// Read pagination from the top level of a response document.
    /// Absent fields decode to 0, which is also the singleton default.
    #[must_use]
    pub fn from_document(document: &Value) -> Self {
        Self {
            offset: field_u64(document, "result_offset"),
            limit: field_u64(document, "result_limit"),
            total: field_u64(document, "result_total"),
        }
    }
}

/// Decode a response document into records plus pagination.
///
/// A document with a top-level `data` array is a list response; anything
/// else is a singleton and becomes a one-element list. Both shapes
/// normalize to the same output, so callers never branch on endpoint
/// shape.
#[must_use]
pub fn decode_page<'doc, T: FromDoc<'doc>>(document: &'doc Value) -> (Vec<T>, Pagination) {
    let pagination = Pagination::from_document(document);
    match document.get("data").and_then(Value::as_array) {
        Some(items) => (items.iter().map(T::from_doc).collect(), pagination),
        None => (vec![T::from_doc(document)], pagination),
    }
}
