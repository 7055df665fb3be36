use serde::{Deserialize, Serialize};

use crate::domain::Person;

/// The filterable/sortable fields both services agree on, including nested
/// paths. UI layers enumerate these; the query layer itself passes field
/// names through verbatim and leaves validation to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonField {
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "creationDate")]
    CreationDate,
    #[serde(rename = "coordinates.x")]
    CoordinatesX,
    #[serde(rename = "coordinates.y")]
    CoordinatesY,
    #[serde(rename = "height")]
    Height,
    #[serde(rename = "eyeColor")]
    EyeColor,
    #[serde(rename = "hairColor")]
    HairColor,
    #[serde(rename = "nationality")]
    Nationality,
    #[serde(rename = "location.x")]
    LocationX,
    #[serde(rename = "location.y")]
    LocationY,
    #[serde(rename = "location.z")]
    LocationZ,
    #[serde(rename = "location.name")]
    LocationName,
}

impl PersonField {
    pub const ALL: &'static [PersonField] = &[
        PersonField::Id,
        PersonField::Name,
        PersonField::CreationDate,
        PersonField::CoordinatesX,
        PersonField::CoordinatesY,
        PersonField::Height,
        PersonField::EyeColor,
        PersonField::HairColor,
        PersonField::Nationality,
        PersonField::LocationX,
        PersonField::LocationY,
        PersonField::LocationZ,
        PersonField::LocationName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonField::Id => "id",
            PersonField::Name => "name",
            PersonField::CreationDate => "creationDate",
            PersonField::CoordinatesX => "coordinates.x",
            PersonField::CoordinatesY => "coordinates.y",
            PersonField::Height => "height",
            PersonField::EyeColor => "eyeColor",
            PersonField::HairColor => "hairColor",
            PersonField::Nationality => "nationality",
            PersonField::LocationX => "location.x",
            PersonField::LocationY => "location.y",
            PersonField::LocationZ => "location.z",
            PersonField::LocationName => "location.name",
        }
    }
}

impl std::fmt::Display for PersonField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Ne => "ne",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lte => "lte",
        }
    }
}

/// One filter condition. Field and value stay free-form strings: a clause
/// with either one empty is "not yet specified" and is dropped before
/// dispatch rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterClause {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.field.is_empty() && !self.value.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub index: u32,
    pub size: u32,
}

impl Default for PageState {
    fn default() -> Self {
        Self { index: 0, size: 10 }
    }
}

/// Immutable snapshot of one advanced-search dispatch. Assembled fresh per
/// request and never mutated afterward; a non-empty callback URL is the sole
/// signal that the search runs asynchronously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub filters: Vec<FilterClause>,
    pub sort: Option<SortSpec>,
    pub page: PageState,
    pub callback_url: Option<String>,
}

/// Page of people as returned by the listing and sync-search endpoints.
/// Absent fields decode to an empty page rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeoplePage {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: i64,
}

/// 202 acknowledgment for an asynchronous search. How the callback URL
/// eventually receives results is the backend's contract, not ours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAccepted {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<String>,
}

/// Uniform result of one search dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Sync(PeoplePage),
    Accepted(SearchAccepted),
}

/// Complete x/y/z triple for the delete-by-location and geometric
/// comparison endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSelector {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl LocationSelector {
    /// Assembles a selector from form-level optional inputs. All three
    /// coordinates are required; incomplete input is reported before any
    /// network call happens.
    pub fn from_parts(
        x: Option<i64>,
        y: Option<i64>,
        z: Option<i64>,
    ) -> Result<Self, IncompleteLocation> {
        match (x, y, z) {
            (Some(x), Some(y), Some(z)) => Ok(Self { x, y, z }),
            _ => Err(IncompleteLocation),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("all location coordinates (x, y, z) are required")]
pub struct IncompleteLocation;
