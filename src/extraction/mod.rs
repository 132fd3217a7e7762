use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::trace;

use crate::models::ListingRecord;

// =============================================================================
// Feature patterns (English wording and the portal's French wording)
// =============================================================================

static RE_FLOOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:floor|[ée]tage)\s+(\d+)").unwrap());
static RE_ELEVATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)elevator|ascenseur").unwrap());
static RE_WITHOUT_ELEVATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)without\s+elevator|sans\s+ascenseur").unwrap());
static RE_CONCIERGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)concierge\s+included|gardien\s+inclus").unwrap());
static RE_BEDROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+(?:bedrooms?|chambres?)").unwrap());
static RE_HOT_WATER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)hot\s+water|eau\s+chaude").unwrap());
static RE_HOT_WATER_EXCLUDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)hot\s+water\s+not\s+included|eau\s+chaude\s+non\s+comprise?").unwrap()
});
static RE_COLD_WATER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)cold\s+water|eau\s+froide").unwrap());
static RE_COLD_WATER_EXCLUDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)cold\s+water\s+not\s+included|eau\s+froide\s+non\s+comprise?").unwrap()
});
static RE_HEATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)heating|chauffage").unwrap());
static RE_HEATING_EXCLUDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)heating.*not\s+included|chauffage.*non\s+compris").unwrap()
});
static RE_NEW_BUILDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:new|neuf|r[ée]cent)").unwrap());

/// One row of the rule table: the first feature matching `pattern` is removed
/// from the record and handed to `derive`.
struct ExtractionRule {
    name: &'static str,
    pattern: &'static LazyLock<Regex>,
    derive: fn(&mut ListingRecord, &str, &Captures),
}

// Order matters: a string consumed by an earlier rule is never seen by a later one.
static RULES: &[ExtractionRule] = &[
    ExtractionRule {
        name: "floor",
        pattern: &RE_FLOOR,
        derive: |record, _, caps| {
            if let Some(floor) = first_number(caps) {
                record.floor = floor;
            }
        },
    },
    ExtractionRule {
        name: "elevator",
        pattern: &RE_ELEVATOR,
        derive: |record, text, _| {
            record.has_elevator = Some(!RE_WITHOUT_ELEVATOR.is_match(text));
        },
    },
    ExtractionRule {
        name: "concierge",
        pattern: &RE_CONCIERGE,
        derive: |record, _, _| record.concierge_included = true,
    },
    ExtractionRule {
        name: "bedrooms",
        pattern: &RE_BEDROOMS,
        derive: |record, _, caps| {
            if let Some(count) = first_number(caps) {
                record.bedroom_count = count;
            }
        },
    },
    ExtractionRule {
        name: "hot_water",
        pattern: &RE_HOT_WATER,
        derive: |record, text, _| {
            record.hot_water_included = !RE_HOT_WATER_EXCLUDED.is_match(text);
        },
    },
    ExtractionRule {
        name: "cold_water",
        pattern: &RE_COLD_WATER,
        derive: |record, text, _| {
            record.cold_water_included = !RE_COLD_WATER_EXCLUDED.is_match(text);
        },
    },
    ExtractionRule {
        name: "heating",
        pattern: &RE_HEATING,
        derive: |record, text, _| {
            record.heating_included = !RE_HEATING_EXCLUDED.is_match(text);
        },
    },
    ExtractionRule {
        name: "new_building",
        pattern: &RE_NEW_BUILDING,
        derive: |record, _, _| record.is_new_building = true,
    },
];

fn first_number<T: std::str::FromStr>(caps: &Captures) -> Option<T> {
    caps.get(1).and_then(|m| m.as_str().parse().ok())
}

/// Remove and return the first feature matching `pattern`.
///
/// Removal goes by position so that duplicate strings elsewhere in the list
/// are left alone.
fn take_first_match(features: &mut Vec<String>, pattern: &Regex) -> Option<String> {
    let index = features.iter().position(|feature| pattern.is_match(feature))?;
    Some(features.remove(index))
}

/// Turns the free-text feature list of a listing into structured fields
pub struct ListingFeatureExtractor;

impl ListingFeatureExtractor {
    /// Run every rule once, in table order, against the record's current features.
    ///
    /// Only the first matching string per rule is consumed; further matches stay
    /// in `features` as unrecognized leftovers.
    ///
    /// Re-running is a no-op only when no rule matched more than one string: a
    /// leftover second match (e.g. `"floor 5"` after `"floor 2"`) is consumed by
    /// the next run and overwrites the field.
    pub fn apply(record: &mut ListingRecord) {
        for rule in RULES {
            let Some(feature) = take_first_match(&mut record.features, rule.pattern) else {
                continue;
            };

            if let Some(caps) = rule.pattern.captures(&feature) {
                (rule.derive)(record, &feature, &caps);
            }
            trace!(rule = rule.name, feature = %feature, "Consumed listing feature");
        }
    }
}
