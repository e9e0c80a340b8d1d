//! Address → coordinate resolution.
//!
//! Flow: raw `lat,lon` → every comma-separated component against the
//! gazetteer, best match kind wins, ties go to the earlier (more specific)
//! component → unresolved. A street named after a place ("Harare Drive,
//! Mbare") only matches as words, so the exact locality after it wins.

use super::gazetteer::{self, MatchKind, Place};
use crate::geo::{Coordinate, GeoError};
use serde::Serialize;
use std::fmt;

/// How an input was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaceSource {
    Coordinates,
    Custom,
    BuiltIn,
}

impl fmt::Display for PlaceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinates => write!(f, "Coordinates"),
            Self::Custom => write!(f, "Custom"),
            Self::BuiltIn => write!(f, "Built-in"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPlace {
    pub query: String,
    pub name: String,
    pub coordinate: Coordinate,
    pub source: PlaceSource,
}

/// Resolves pickup/dropoff inputs. Custom places shadow built-in ones.
pub struct PlaceResolver {
    custom: Vec<Place>,
    builtin: Vec<Place>,
}

impl Default for PlaceResolver {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PlaceResolver {
    pub fn new(custom: Vec<Place>) -> Self {
        Self { custom, builtin: gazetteer::builtin_places() }
    }

    /// Every known place, custom first.
    pub fn places(&self) -> impl Iterator<Item = &Place> {
        self.custom.iter().chain(self.builtin.iter())
    }

    /// `Ok(None)` when nothing matched; `Err` only for a `lat,lon` pair that
    /// parses but is out of range.
    pub fn resolve(&self, input: &str) -> Result<Option<ResolvedPlace>, GeoError> {
        let input = input.trim();
        match input.parse::<Coordinate>() {
            Ok(coordinate) => {
                return Ok(Some(ResolvedPlace {
                    query: input.to_string(),
                    name: coordinate.to_string(),
                    coordinate,
                    source: PlaceSource::Coordinates,
                }))
            }
            Err(e @ GeoError::OutOfRange { .. }) => return Err(e),
            Err(GeoError::Unparsable(_)) => {}
        }

        let best = input
            .split(',')
            .map(str::trim)
            .enumerate()
            .filter_map(|(i, part)| self.lookup(part).map(|(hit, kind)| (kind, i, hit)))
            .min_by_key(|(kind, i, _)| (*kind, *i));

        if let Some((kind, _, hit)) = best {
            tracing::debug!(query = input, matched = %hit.name, source = %hit.source, ?kind, "place resolved");
            return Ok(Some(ResolvedPlace { query: input.to_string(), ..hit }));
        }

        tracing::debug!(query = input, "place not resolved");
        Ok(None)
    }

    /// Custom places shadow built-in ones unless the built-in match is better.
    fn lookup(&self, part: &str) -> Option<(ResolvedPlace, MatchKind)> {
        let custom = gazetteer::lookup_ranked(&self.custom, part).map(|(p, k)| (p, k, PlaceSource::Custom));
        let builtin = gazetteer::lookup_ranked(&self.builtin, part).map(|(p, k)| (p, k, PlaceSource::BuiltIn));
        let (place, kind, source) = match (custom, builtin) {
            (Some(c), Some(b)) if b.1 < c.1 => b,
            (Some(c), _) => c,
            (None, b) => b?,
        };
        Some((
            ResolvedPlace {
                query: part.to_string(),
                name: place.name.clone(),
                coordinate: place.coordinate,
                source,
            },
            kind,
        ))
    }

    /// Resolve both ends of a route; `None` unless both have coordinates.
    pub fn resolve_route(
        &self,
        pickup: &str,
        dropoff: &str,
    ) -> Result<Option<(ResolvedPlace, ResolvedPlace)>, GeoError> {
        let from = self.resolve(pickup)?;
        let to = self.resolve(dropoff)?;
        Ok(from.zip(to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_coordinates() {
        let r = PlaceResolver::default();
        let p = r.resolve(" -17.8216,31.0492 ").unwrap().unwrap();
        assert_eq!(p.source, PlaceSource::Coordinates);
        assert_eq!(p.coordinate, Coordinate::new_unchecked(-17.8216, 31.0492));
    }

    #[test]
    fn test_out_of_range_coordinates_error() {
        let r = PlaceResolver::default();
        assert!(matches!(r.resolve("-97.0,31.0"), Err(GeoError::OutOfRange { .. })));
    }

    #[test]
    fn test_street_address_by_locality() {
        let r = PlaceResolver::default();
        let p = r.resolve("123 Main St, Harare").unwrap().unwrap();
        assert_eq!(p.name, "harare cbd");
        assert_eq!(p.query, "123 Main St, Harare");
        assert_eq!(p.source, PlaceSource::BuiltIn);
    }

    #[test]
    fn test_suburb_beats_city() {
        let r = PlaceResolver::default();
        let p = r.resolve("12 Hindhead Ave, Borrowdale, Harare").unwrap().unwrap();
        assert_eq!(p.name, "borrowdale");
    }

    #[test]
    fn test_street_named_after_place() {
        let r = PlaceResolver::default();
        assert_eq!(r.resolve("Harare Drive, Mbare").unwrap().unwrap().name, "mbare");
        assert_eq!(r.resolve("Mutare Road, Chitungwiza").unwrap().unwrap().name, "chitungwiza");
        assert_eq!(r.resolve("Avondale, Harare").unwrap().unwrap().name, "avondale");
    }

    #[test]
    fn test_unknown_address() {
        let r = PlaceResolver::default();
        assert!(r.resolve("Somewhere unknown").unwrap().is_none());
        let route = r.resolve_route("Harare", "Nowhere Lane").unwrap();
        assert!(route.is_none());
    }

    #[test]
    fn test_custom_place_shadows_builtin() {
        let custom = Place {
            name: "Harare".into(),
            region: "Test".into(),
            aliases: vec!["office".into()],
            coordinate: Coordinate::new_unchecked(-17.0, 31.0),
        };
        let r = PlaceResolver::new(vec![custom]);
        let p = r.resolve("harare").unwrap().unwrap();
        assert_eq!(p.source, PlaceSource::Custom);
        assert_eq!(p.coordinate.latitude, -17.0);
        assert_eq!(r.resolve("Office").unwrap().unwrap().name, "Harare");
        assert!(r.places().count() > 1);
    }

    #[test]
    fn test_route_both_ends() {
        let r = PlaceResolver::default();
        let (a, b) = r.resolve_route("Avondale", "Mbare").unwrap().unwrap();
        assert_eq!(a.name, "avondale");
        assert_eq!(b.name, "mbare");
    }
}
