use crate::EntityType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Release state of a movie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieStatus {
    /// Currently screening.
    #[default]
    NowShowing,
    /// Announced, not yet screening.
    ComingSoon,
    /// No longer screening.
    Ended,
}

/// A film in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// Primary key.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Title in the original language, if different.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Synopsis.
    #[serde(default)]
    pub description: Option<String>,
    /// Genre names.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Director name.
    #[serde(default)]
    pub director: Option<String>,
    /// Leading cast members.
    #[serde(default)]
    pub cast: Vec<String>,
    /// Running time.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Premiere date.
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    /// Spoken language.
    #[serde(default)]
    pub language: Option<String>,
    /// Age classification, e.g. `T13`.
    #[serde(default)]
    pub age_rating: Option<String>,
    /// Release state.
    #[serde(default)]
    pub status: MovieStatus,
}

/// A scheduled screening of a movie in a cinema room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Showtime {
    /// Primary key.
    pub id: u64,
    /// Screened movie.
    pub movie_id: u64,
    /// Denormalized movie title.
    pub movie_title: String,
    /// Hosting cinema.
    pub cinema_id: u64,
    /// Denormalized cinema name.
    pub cinema_name: String,
    /// Screening room.
    #[serde(default)]
    pub room: Option<String>,
    /// Start of the screening.
    pub start_time: DateTime<Utc>,
    /// End of the screening.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Projection format, e.g. `2D`, `IMAX`.
    #[serde(default)]
    pub format: Option<String>,
    /// Base ticket price.
    #[serde(default)]
    pub base_price: Option<f64>,
    /// Whether tickets can be sold.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A discount campaign redeemable with a code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    /// Primary key.
    pub id: u64,
    /// Redemption code.
    pub code: String,
    /// Campaign title.
    pub title: String,
    /// Terms and description.
    #[serde(default)]
    pub description: Option<String>,
    /// Percentage discount.
    #[serde(default)]
    pub discount_percent: Option<f64>,
    /// Fixed-amount discount.
    #[serde(default)]
    pub discount_amount: Option<f64>,
    /// Minimum order value to qualify.
    #[serde(default)]
    pub min_order_value: Option<f64>,
    /// First valid day.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Last valid instant.
    pub end_date: DateTime<Utc>,
    /// Whether the campaign is switched on.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A cinema site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cinema {
    /// Primary key.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Number of screening rooms.
    #[serde(default)]
    pub room_count: Option<u32>,
    /// Whether the site is open.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// A relational record of any indexed type.
///
/// This is also the payload stored with every vector point: it serializes
/// as a JSON object tagged by `"type"`, so search hits deserialize back into
/// a concrete shape that callers can match on exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityRecord {
    /// A movie row.
    Movie(Movie),
    /// A showtime row.
    Showtime(Showtime),
    /// A promotion row.
    Promotion(Promotion),
    /// A cinema row.
    Cinema(Cinema),
}

impl EntityRecord {
    /// Primary key of the underlying row.
    pub fn id(&self) -> u64 {
        match self {
            EntityRecord::Movie(m) => m.id,
            EntityRecord::Showtime(s) => s.id,
            EntityRecord::Promotion(p) => p.id,
            EntityRecord::Cinema(c) => c.id,
        }
    }

    /// The entity type (and therefore collection) of this record.
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityRecord::Movie(_) => EntityType::Movies,
            EntityRecord::Showtime(_) => EntityType::Showtimes,
            EntityRecord::Promotion(_) => EntityType::Promotions,
            EntityRecord::Cinema(_) => EntityType::Cinemas,
        }
    }

    /// Human-readable identifying label.
    pub fn title(&self) -> String {
        match self {
            EntityRecord::Movie(m) => m.title.clone(),
            EntityRecord::Showtime(s) => {
                format!("{} @ {}", s.movie_title, s.cinema_name)
            }
            EntityRecord::Promotion(p) => p.title.clone(),
            EntityRecord::Cinema(c) => c.name.clone(),
        }
    }

    /// Identifying names a query may match exactly: title, alternate title,
    /// promotion code, cinema name.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            EntityRecord::Movie(m) => {
                let mut labels = vec![m.title.as_str()];
                if let Some(original) = m.original_title.as_deref() {
                    labels.push(original);
                }
                labels
            }
            EntityRecord::Showtime(s) => vec![s.movie_title.as_str(), s.cinema_name.as_str()],
            EntityRecord::Promotion(p) => vec![p.title.as_str(), p.code.as_str()],
            EntityRecord::Cinema(c) => vec![c.name.as_str()],
        }
    }

    /// Text columns searched by keyword lookups (name, title, description, code).
    pub fn keyword_fields(&self) -> Vec<&str> {
        let mut fields = self.labels();
        match self {
            EntityRecord::Movie(m) => {
                fields.extend(m.description.as_deref());
                fields.extend(m.director.as_deref());
            }
            EntityRecord::Showtime(s) => {
                fields.extend(s.room.as_deref());
            }
            EntityRecord::Promotion(p) => {
                fields.extend(p.description.as_deref());
            }
            EntityRecord::Cinema(c) => {
                fields.extend(c.address.as_deref());
                fields.extend(c.city.as_deref());
                fields.extend(c.description.as_deref());
            }
        }
        fields
    }
}

/// Qualifying filters a repository applies when counting or fetching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordFilter {
    /// Every row.
    All,
    /// Rows that are switched on (movies: not ended).
    Active,
    /// Active rows whose validity has not ended at the given instant.
    NotExpired(DateTime<Utc>),
    /// Active rows starting within `[from, to]`.
    Upcoming {
        /// Window start.
        from: DateTime<Utc>,
        /// Window end.
        to: DateTime<Utc>,
    },
}

impl RecordFilter {
    /// Whether `record` passes this filter.
    ///
    /// Time-based filters only constrain the types that carry the relevant
    /// timestamp; other types fall back to [`RecordFilter::Active`].
    pub fn matches(&self, record: &EntityRecord) -> bool {
        let active = match record {
            EntityRecord::Movie(m) => m.status != MovieStatus::Ended,
            EntityRecord::Showtime(s) => s.is_active,
            EntityRecord::Promotion(p) => p.is_active,
            EntityRecord::Cinema(c) => c.is_active,
        };

        match (self, record) {
            (RecordFilter::All, _) => true,
            (RecordFilter::NotExpired(now), EntityRecord::Promotion(p)) => {
                active && p.end_date >= *now
            }
            (RecordFilter::Upcoming { from, to }, EntityRecord::Showtime(s)) => {
                active && s.start_time >= *from && s.start_time <= *to
            }
            _ => active,
        }
    }
}
