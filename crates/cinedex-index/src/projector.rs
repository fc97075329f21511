use chrono::{DateTime, Utc};
use cinedex_core::{Cinema, CinedexError, CinedexResult, EntityRecord, Movie, Promotion, Showtime};
use std::fmt::Display;

/// Renders a record into the text that gets embedded.
///
/// Every searchable field gets its own `Label: value` line, absent optional
/// fields render as an empty value, and the identifying name is repeated so
/// exact-name queries land close to the record in vector space.
pub fn project(record: &EntityRecord) -> CinedexResult<String> {
    match record {
        EntityRecord::Movie(m) => project_movie(m),
        EntityRecord::Showtime(s) => project_showtime(s),
        EntityRecord::Promotion(p) => project_promotion(p),
        EntityRecord::Cinema(c) => project_cinema(c),
    }
}

fn required<'a>(kind: &str, id: u64, field: &str, value: &'a str) -> CinedexResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CinedexError::Projection(format!(
            "{kind} {id} has an empty `{field}`"
        )));
    }
    Ok(value)
}

fn opt<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn time(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

fn lines(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(label, value)| format!("{label}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn project_movie(m: &Movie) -> CinedexResult<String> {
    let title = required("Movie", m.id, "title", &m.title)?;
    let original = opt(&m.original_title);
    Ok(lines(&[
        ("Movie", title.to_string()),
        ("Title", title.to_string()),
        ("Original title", original.clone()),
        ("Also known as", format!("{title} {original}").trim().to_string()),
        ("Genres", m.genres.join(", ")),
        ("Director", opt(&m.director)),
        ("Cast", m.cast.join(", ")),
        ("Description", opt(&m.description)),
        ("Duration minutes", opt(&m.duration_minutes)),
        ("Release date", opt(&m.release_date)),
        ("Language", opt(&m.language)),
        ("Age rating", opt(&m.age_rating)),
        ("Status", format!("{:?}", m.status)),
    ]))
}

fn project_showtime(s: &Showtime) -> CinedexResult<String> {
    let movie = required("Showtime", s.id, "movie_title", &s.movie_title)?;
    let cinema = required("Showtime", s.id, "cinema_name", &s.cinema_name)?;
    Ok(lines(&[
        ("Showtime", format!("{movie} at {cinema}")),
        ("Movie", movie.to_string()),
        ("Movie title", movie.to_string()),
        ("Cinema", cinema.to_string()),
        ("Room", opt(&s.room)),
        ("Start time", time(&s.start_time)),
        ("End time", s.end_time.as_ref().map(time).unwrap_or_default()),
        ("Format", opt(&s.format)),
        ("Price", opt(&s.base_price)),
    ]))
}

fn project_promotion(p: &Promotion) -> CinedexResult<String> {
    let code = required("Promotion", p.id, "code", &p.code)?;
    let title = required("Promotion", p.id, "title", &p.title)?;
    Ok(lines(&[
        ("Promotion", title.to_string()),
        ("Title", title.to_string()),
        ("Code", code.to_string()),
        ("Promo code", code.to_string()),
        ("Description", opt(&p.description)),
        ("Discount percent", opt(&p.discount_percent)),
        ("Discount amount", opt(&p.discount_amount)),
        ("Minimum order", opt(&p.min_order_value)),
        ("Valid from", p.start_date.as_ref().map(time).unwrap_or_default()),
        ("Valid until", time(&p.end_date)),
    ]))
}

fn project_cinema(c: &Cinema) -> CinedexResult<String> {
    let name = required("Cinema", c.id, "name", &c.name)?;
    Ok(lines(&[
        ("Cinema", name.to_string()),
        ("Name", name.to_string()),
        ("Cinema name", name.to_string()),
        ("Address", opt(&c.address)),
        ("City", opt(&c.city)),
        ("Phone", opt(&c.phone)),
        ("Description", opt(&c.description)),
        ("Rooms", opt(&c.room_count)),
    ]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use cinedex_core::MovieStatus;

    fn movie(title: &str, original: Option<&str>) -> EntityRecord {
        EntityRecord::Movie(Movie {
            id: 5,
            title: title.into(),
            original_title: original.map(Into::into),
            description: None,
            genres: vec!["Action".into(), "Drama".into()],
            director: Some("Victor Vũ".into()),
            cast: vec![],
            duration_minutes: Some(118),
            release_date: None,
            language: None,
            age_rating: None,
            status: MovieStatus::NowShowing,
        })
    }

    #[test]
    fn test_title_repeated_and_alternate_included() {
        let text = project(&movie("Hành Động Việt", Some("Viet Action"))).unwrap();
        assert!(text.matches("Hành Động Việt").count() >= 2);
        assert!(text.matches("Hành Động Việt").count() <= 3);
        assert!(text.contains("Original title: Viet Action"));
        assert!(text.contains("Genres: Action, Drama"));
        assert!(text.contains("Director: Victor Vũ"));
    }

    #[test]
    fn test_absent_fields_keep_their_line() {
        let with = project(&movie("Mai", Some("Mai"))).unwrap();
        let without = project(&movie("Mai", None)).unwrap();
        assert_eq!(with.lines().count(), without.lines().count());
        assert!(without.contains("Description: \n"));
        assert!(without.contains("Original title: \n"));
    }

    #[test]
    fn test_empty_title_fails_fast() {
        let err = project(&movie("   ", None)).unwrap_err();
        assert!(matches!(err, CinedexError::Projection(_)));
    }

    #[test]
    fn test_cinema_projection_is_deterministic() {
        let cinema = EntityRecord::Cinema(Cinema {
            id: 1,
            name: "CGV Vincom".into(),
            address: Some("72 Lê Thánh Tôn".into()),
            city: Some("Hồ Chí Minh".into()),
            phone: None,
            description: None,
            room_count: Some(8),
            is_active: true,
        });
        let a = project(&cinema).unwrap();
        let b = project(&cinema).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.matches("CGV Vincom").count(), 3);
        assert!(a.contains("Rooms: 8"));
    }
}
