use cinedex_core::{EntityRecord, EntityType};

/// Renders ranked records into a plain-text context block.
///
/// Sections follow [`EntityType::CONTEXT_ORDER`]; within a section records
/// keep their rank order. Each record is one line of `field: value` pairs,
/// skipping empty values. No records renders as an empty string.
pub fn render_context<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a EntityRecord>,
{
    let records: Vec<&EntityRecord> = records.into_iter().collect();
    let mut sections = Vec::new();

    for entity in EntityType::CONTEXT_ORDER {
        let items: Vec<String> = records
            .iter()
            .filter(|r| r.entity_type() == entity)
            .map(|r| format!("- {}", render_item(r)))
            .collect();
        if items.is_empty() {
            continue;
        }
        sections.push(format!("{}:\n{}", entity.heading(), items.join("\n")));
    }

    sections.join("\n\n")
}

fn render_item(record: &EntityRecord) -> String {
    let pairs: Vec<(&str, String)> = match record {
        EntityRecord::Cinema(c) => vec![
            ("name", c.name.clone()),
            ("city", c.city.clone().unwrap_or_default()),
            ("address", c.address.clone().unwrap_or_default()),
            ("phone", c.phone.clone().unwrap_or_default()),
            ("rooms", c.room_count.map(|n| n.to_string()).unwrap_or_default()),
        ],
        EntityRecord::Movie(m) => vec![
            ("title", m.title.clone()),
            ("original_title", m.original_title.clone().unwrap_or_default()),
            ("genres", m.genres.join(", ")),
            ("director", m.director.clone().unwrap_or_default()),
            (
                "duration",
                m.duration_minutes.map(|d| format!("{d} min")).unwrap_or_default(),
            ),
            ("age_rating", m.age_rating.clone().unwrap_or_default()),
            ("description", m.description.clone().unwrap_or_default()),
        ],
        EntityRecord::Showtime(s) => vec![
            ("movie", s.movie_title.clone()),
            ("cinema", s.cinema_name.clone()),
            ("room", s.room.clone().unwrap_or_default()),
            ("start", s.start_time.format("%Y-%m-%d %H:%M").to_string()),
            ("format", s.format.clone().unwrap_or_default()),
            ("price", s.base_price.map(|p| p.to_string()).unwrap_or_default()),
        ],
        EntityRecord::Promotion(p) => vec![
            ("title", p.title.clone()),
            ("code", p.code.clone()),
            (
                "discount",
                match (p.discount_percent, p.discount_amount) {
                    (Some(pct), _) => format!("{pct}%"),
                    (None, Some(amount)) => amount.to_string(),
                    (None, None) => String::new(),
                },
            ),
            ("valid_until", p.end_date.format("%Y-%m-%d").to_string()),
            ("description", p.description.clone().unwrap_or_default()),
        ],
    };

    pairs
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(field, value)| format!("{field}: {value}"))
        .collect::<Vec<_>>()
        .join(" | ")
}
