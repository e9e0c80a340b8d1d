//! Built-in place dataset with fuzzy matching.

use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};

struct BuiltinPlace {
    names: &'static [&'static str], // canonical + aliases
    lat: f64,
    lon: f64,
    region: &'static str,
}

const BUILTIN_PLACES: &[BuiltinPlace] = &[
    BuiltinPlace {
        names: &["harare cbd", "harare", "harare city centre"],
        lat: -17.8292, lon: 31.0522, region: "Harare",
    },
    BuiltinPlace {
        names: &["avondale"],
        lat: -17.8000, lon: 31.0386, region: "Harare",
    },
    BuiltinPlace {
        names: &["borrowdale"],
        lat: -17.7590, lon: 31.0920, region: "Harare",
    },
    BuiltinPlace {
        names: &["belgravia"],
        lat: -17.8130, lon: 31.0440, region: "Harare",
    },
    BuiltinPlace {
        names: &["mbare"],
        lat: -17.8560, lon: 31.0390, region: "Harare",
    },
    BuiltinPlace {
        names: &["highlands"],
        lat: -17.8010, lon: 31.0880, region: "Harare",
    },
    BuiltinPlace {
        names: &["mount pleasant", "mt pleasant"],
        lat: -17.7720, lon: 31.0470, region: "Harare",
    },
    BuiltinPlace {
        names: &["eastlea"],
        lat: -17.8250, lon: 31.0720, region: "Harare",
    },
    BuiltinPlace {
        names: &["epworth"],
        lat: -17.8900, lon: 31.1475, region: "Harare",
    },
    BuiltinPlace {
        names: &["chitungwiza", "chitown"],
        lat: -18.0127, lon: 31.0756, region: "Harare",
    },
    BuiltinPlace {
        names: &["bulawayo", "byo"],
        lat: -20.1500, lon: 28.5833, region: "Bulawayo",
    },
    BuiltinPlace {
        names: &["gweru"],
        lat: -19.4500, lon: 29.8167, region: "Midlands",
    },
    BuiltinPlace {
        names: &["mutare"],
        lat: -18.9707, lon: 32.6709, region: "Manicaland",
    },
];

/// A named place with coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub region: String,
    /// Extra names matched exactly (after normalisation).
    #[serde(default)]
    pub aliases: Vec<String>,
    pub coordinate: Coordinate,
}

impl Place {
    fn names(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(normalize(&self.name)).chain(self.aliases.iter().map(|a| normalize(a)))
    }
}

fn builtin_to_place(p: &BuiltinPlace) -> Place {
    Place {
        name: p.names[0].to_string(),
        region: p.region.to_string(),
        aliases: p.names[1..].iter().map(|s| s.to_string()).collect(),
        coordinate: Coordinate::new_unchecked(p.lat, p.lon),
    }
}

/// The full built-in list (for `errand places` and `/api/places`).
pub fn builtin_places() -> Vec<Place> {
    BUILTIN_PLACES.iter().map(builtin_to_place).collect()
}

/// Lowercase, drop punctuation, collapse whitespace.
pub fn normalize(q: &str) -> String {
    q.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Levenshtein distance.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// How closely a query matched a place. Ordered best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// The whole query is a name or alias.
    Exact,
    /// A name appears as whole words inside the query.
    Word,
    /// Within edit distance 2.
    Fuzzy,
}

/// Match one query against `places`: exact name/alias first, then the
/// longest name contained as whole words, then edit distance ≤ 2 for
/// queries of four or more characters.
pub fn lookup<'a>(places: &'a [Place], query: &str) -> Option<&'a Place> {
    lookup_ranked(places, query).map(|(p, _)| p)
}

/// [`lookup`] plus the kind of match that produced the hit.
pub fn lookup_ranked<'a>(places: &'a [Place], query: &str) -> Option<(&'a Place, MatchKind)> {
    let q = normalize(query);
    if q.is_empty() {
        return None;
    }

    if let Some(p) = places.iter().find(|p| p.names().any(|n| n == q)) {
        return Some((p, MatchKind::Exact));
    }

    // "mount pleasant harare" is Mount Pleasant, not Harare.
    let padded_q = format!(" {} ", q);
    let contained = places
        .iter()
        .filter_map(|p| {
            p.names()
                .filter(|n| padded_q.contains(&format!(" {} ", n)))
                .map(|n| n.len())
                .max()
                .map(|len| (p, len))
        })
        .min_by_key(|(_, len)| std::cmp::Reverse(*len));
    if let Some((p, _)) = contained {
        return Some((p, MatchKind::Word));
    }

    if q.chars().count() < 4 {
        return None;
    }
    places
        .iter()
        .filter_map(|p| {
            p.names()
                .map(|n| edit_distance(&q, &n))
                .min()
                .filter(|d| *d <= 2)
                .map(|d| (p, d))
        })
        .min_by_key(|(_, d)| *d)
        .map(|(p, _)| (p, MatchKind::Fuzzy))
}
