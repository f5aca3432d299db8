use std::collections::{HashMap, HashSet};

use regex::Regex;

/// The seven representative stations, one per state/territory, used by
/// the map/point predictor and the display-label mapping.
pub const STATE_STATIONS: [(&str, &str, &str); 7] = [
    ("TAS", "91375", "Brumbys Creek"),
    ("NT", "14015", "Darwin Airport"),
    ("QLD", "41560", "Goondiwindi"),
    ("NSW", "53115", "Moree Aero"),
    ("SA", "23373", "Nuriootpa PIRSA"),
    ("WA", "9225", "Perth Metro"),
    ("VIC", "82039", "Rutherglen Research"),
];

/// Human-friendly state labels the front-end selects by.
pub const STATE_DISPLAY_NAMES: [&str; 7] = [
    "Tasmania (TAS)",
    "Northern Territory (NT)",
    "Queensland (QLD)",
    "New South Wales (NSW)",
    "South Australia (SA)",
    "Western Australia (WA)",
    "Victoria (VIC)",
];

fn display_keyword(display: &str) -> Option<&'static str> {
    let abbr = display.rsplit('(').next()?.trim_end_matches(')');
    STATE_STATIONS
        .iter()
        .find(|(state, _, _)| *state == abbr)
        .map(|(_, _, keyword)| *keyword)
}

pub fn station_id_for_state(state: &str) -> Option<&'static str> {
    STATE_STATIONS
        .iter()
        .find(|(abbr, _, _)| *abbr == state)
        .map(|(_, id, _)| *id)
}

pub fn state_abbreviations() -> Vec<&'static str> {
    STATE_STATIONS.iter().map(|(abbr, _, _)| *abbr).collect()
}

/// Resolves user-facing display labels to the exact historical
/// `station_name` strings present in the temperature dataset.
///
/// Resolution order: exact historical name, then state display label via
/// keyword containment, then token-Jaccard fuzzy matching over
/// canonicalized names. Resolution never fails; the best-scoring
/// historical name wins.
#[derive(Debug, Clone)]
pub struct StationResolver {
    historical_names: Vec<String>,
    historical_tokens: Vec<(String, Vec<String>)>,
    station_to_display: HashMap<String, String>,
    display_to_stations: HashMap<String, Vec<String>>,
    year_re: Regex,
    word_clean_re: Regex,
    trailing_state_re: Regex,
}

impl StationResolver {
    pub fn new(historical_names: Vec<String>) -> Self {
        let year_re = Regex::new(r"\b20\d{2}\b").expect("year regex");
        let word_clean_re = Regex::new(r"[^\w\s]").expect("word clean regex");
        let trailing_state_re = Regex::new(r"\s(\([A-Za-z]{2,3}\))$").expect("state tag regex");

        // Defensively hide accidental forecast-year strings.
        let historical_names: Vec<String> = historical_names
            .into_iter()
            .filter(|name| !name.contains("2025"))
            .collect();

        let historical_tokens = historical_names
            .iter()
            .map(|name| (name.clone(), tokens(name, &year_re, &word_clean_re)))
            .collect();

        let mut station_to_display = HashMap::new();
        let mut display_to_stations: HashMap<String, Vec<String>> = HashMap::new();
        for display in STATE_DISPLAY_NAMES {
            let Some(keyword) = display_keyword(display) else {
                continue;
            };
            let keyword_lower = keyword.to_lowercase();
            for name in &historical_names {
                if name.to_lowercase().contains(&keyword_lower) {
                    station_to_display.insert(name.clone(), display.to_string());
                    display_to_stations
                        .entry(display.to_string())
                        .or_default()
                        .push(name.clone());
                }
            }
        }

        Self {
            historical_names,
            historical_tokens,
            station_to_display,
            display_to_stations,
            year_re,
            word_clean_re,
            trailing_state_re,
        }
    }

    pub fn historical_names(&self) -> &[String] {
        &self.historical_names
    }

    /// Historical station names behind a display label.
    pub fn stations_for_display(&self, display: &str) -> &[String] {
        self.display_to_stations
            .get(display)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Display label for a historical station name, when one exists.
    pub fn display_for_station(&self, station_name: &str) -> Option<&str> {
        self.station_to_display.get(station_name).map(String::as_str)
    }

    /// Map any label to the most likely historical station name.
    pub fn resolve(&self, display_or_name: &str) -> Option<&str> {
        if let Some(name) = self
            .historical_names
            .iter()
            .find(|name| name.as_str() == display_or_name)
        {
            return Some(name);
        }

        if let Some(stations) = self.display_to_stations.get(display_or_name) {
            if let Some(first) = stations.first() {
                return Some(first);
            }
        }

        // Fuzzy fallback for labels like "Perth Metro 2025 (WA)".
        let target = tokens(display_or_name, &self.year_re, &self.word_clean_re);
        let mut best: Option<(&str, f64)> = None;
        for (name, name_tokens) in &self.historical_tokens {
            let score = jaccard(&target, name_tokens);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((name, score));
            }
        }
        best.map(|(name, _)| name)
            .or_else(|| self.historical_names.first().map(String::as_str))
    }

    /// Display labels for the forecast year, derived from the historical
    /// names: an embedded year is replaced, a trailing "(XX)" tag has the
    /// year inserted before it, anything else gets the year appended.
    pub fn forecast_labels(&self, forecast_year: i32) -> Vec<String> {
        let year = forecast_year.to_string();
        let mut labels: Vec<String> = self
            .historical_names
            .iter()
            .map(|name| {
                if self.year_re.is_match(name) {
                    self.year_re.replace_all(name, year.as_str()).into_owned()
                } else if let Some(m) = self.trailing_state_re.captures(name) {
                    let tag = m.get(1).map(|g| g.as_str()).unwrap_or("");
                    let head = &name[..m.get(0).map(|g| g.start()).unwrap_or(name.len())];
                    format!("{head} {year} {tag}")
                } else {
                    format!("{name} {year}")
                }
            })
            .collect();
        labels.sort();
        labels
    }
}

/// Light canonicalization for consistent tokenization: lowercase, the
/// `creesy`/`cressy` variant fix, years and the word "Average" removed,
/// punctuation stripped, whitespace collapsed.
fn canon(s: &str, year_re: &Regex, word_clean_re: &Regex) -> String {
    let mut out = s.to_lowercase().trim().to_string();
    out = out.replace("creesy", "cressy");
    out = year_re.replace_all(&out, " ").into_owned();
    out = out.replace("average", " ");
    out = word_clean_re.replace_all(&out, " ").into_owned();
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Informative tokens only; state abbreviations are redundant.
fn tokens(s: &str, year_re: &Regex, word_clean_re: &Regex) -> Vec<String> {
    const STOP: [&str; 7] = ["nsw", "vic", "sa", "wa", "nt", "tas", "qld"];
    canon(s, year_re, word_clean_re)
        .split(' ')
        .filter(|t| !t.is_empty() && !STOP.contains(t))
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> StationResolver {
        StationResolver::new(vec![
            "Goondiwindi Airport Average 2023 (QLD)".to_string(),
            "Perth Metro Average 2023 (WA)".to_string(),
            "Darwin Airport Average 2023 (NT)".to_string(),
        ])
    }

    #[test]
    fn exact_historical_names_pass_through() {
        let r = resolver();
        assert_eq!(
            r.resolve("Perth Metro Average 2023 (WA)"),
            Some("Perth Metro Average 2023 (WA)")
        );
    }

    #[test]
    fn display_labels_resolve_via_keyword_mapping() {
        let r = resolver();
        assert_eq!(
            r.resolve("Queensland (QLD)"),
            Some("Goondiwindi Airport Average 2023 (QLD)")
        );
        assert_eq!(
            r.display_for_station("Perth Metro Average 2023 (WA)"),
            Some("Western Australia (WA)")
        );
    }

    #[test]
    fn forecast_year_labels_fuzzy_match_back() {
        let r = resolver();
        assert_eq!(
            r.resolve("Perth Metro 2025 (WA)"),
            Some("Perth Metro Average 2023 (WA)")
        );
    }

    #[test]
    fn forecast_labels_substitute_the_year() {
        let r = resolver();
        let labels = r.forecast_labels(2025);
        assert!(labels.contains(&"Perth Metro Average 2025 (WA)".to_string()));
        assert_eq!(labels.len(), 3);
    }

    #[test]
    fn tokenization_drops_years_and_state_tags() {
        let year_re = Regex::new(r"\b20\d{2}\b").unwrap();
        let word_clean_re = Regex::new(r"[^\w\s]").unwrap();
        assert_eq!(
            tokens("Perth Metro Average 2023 (WA)", &year_re, &word_clean_re),
            vec!["perth", "metro"]
        );
    }
}
