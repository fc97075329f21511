use crate::CinedexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The indexed entity types. Each one owns exactly one vector collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Films in the catalogue.
    Movies,
    /// Scheduled screenings.
    Showtimes,
    /// Discount codes and campaigns.
    Promotions,
    /// Cinema sites.
    Cinemas,
}

impl EntityType {
    /// Every entity type, in indexing order.
    pub const ALL: [EntityType; 4] = [
        EntityType::Movies,
        EntityType::Showtimes,
        EntityType::Promotions,
        EntityType::Cinemas,
    ];

    /// The order in which rendered context blocks list their sections.
    pub const CONTEXT_ORDER: [EntityType; 4] = [
        EntityType::Cinemas,
        EntityType::Movies,
        EntityType::Showtimes,
        EntityType::Promotions,
    ];

    /// Name of the vector collection mirroring this type.
    pub fn collection_name(self) -> &'static str {
        match self {
            EntityType::Movies => "movies",
            EntityType::Showtimes => "showtimes",
            EntityType::Promotions => "promotions",
            EntityType::Cinemas => "cinemas",
        }
    }

    /// Upper-case heading used in rendered context.
    pub fn heading(self) -> &'static str {
        match self {
            EntityType::Movies => "MOVIES",
            EntityType::Showtimes => "SHOWTIMES",
            EntityType::Promotions => "PROMOTIONS",
            EntityType::Cinemas => "CINEMAS",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

impl FromStr for EntityType {
    type Err = CinedexError;

    /// Accepts the collection name or its singular form, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movies" | "movie" => Ok(EntityType::Movies),
            "showtimes" | "showtime" => Ok(EntityType::Showtimes),
            "promotions" | "promotion" => Ok(EntityType::Promotions),
            "cinemas" | "cinema" => Ok(EntityType::Cinemas),
            other => Err(CinedexError::Config(format!("Unknown entity type '{other}'"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plural_and_singular() {
        assert_eq!("movies".parse::<EntityType>().unwrap(), EntityType::Movies);
        assert_eq!("Showtime".parse::<EntityType>().unwrap(), EntityType::Showtimes);
        assert_eq!(" cinemas ".parse::<EntityType>().unwrap(), EntityType::Cinemas);
        assert!("bookings".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_collection_names_are_distinct() {
        let mut names: Vec<&str> = EntityType::ALL.iter().map(|t| t.collection_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_context_order() {
        assert_eq!(EntityType::CONTEXT_ORDER[0], EntityType::Cinemas);
        assert_eq!(EntityType::CONTEXT_ORDER[3], EntityType::Promotions);
    }

    #[test]
    fn test_serde_uses_collection_name() {
        let json = serde_json::to_string(&EntityType::Promotions).unwrap();
        assert_eq!(json, "\"promotions\"");
    }
}
