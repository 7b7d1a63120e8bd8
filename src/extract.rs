use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, info};

use crate::models::{Listing, Price, ResultsSummary};

/// Localized heading token meaning "no results".
const NO_RESULTS_TOKEN: &str = "Aucun";

const RESULTS_HEADING_SELECTOR: &str = "h2.SearchResults-desktop";
const PRICE_BADGE_SELECTOR: &str = "p.fr-badge";
const CARD_SELECTOR: &str = "div.fr-card";
const CARD_TITLE_SELECTOR: &str = "h3.fr-card__title";
const CARD_LINK_SELECTOR: &str = "a";
const CARD_IMAGE_SELECTOR: &str = "img.fr-responsive-img";
const CARD_DESC_SELECTOR: &str = "p.fr-card__desc";
const CARD_DETAIL_SELECTOR: &str = "p.fr-card__detail";

/// What the results heading reported. Only the localized "none" token means
/// the page is empty; a missing or unparsable heading says nothing about the
/// cards below it.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ResultsHeading {
    /// Heading absent, or its leading token is not a number.
    Unreadable,
    /// Leading token is the localized "none" token.
    NoResults,
    /// Parsed total, with the headline price when one was found.
    Reported(u32, Option<f64>),
}

/// Turns rendered search-page markup into a [`ResultsSummary`]. Never fails:
/// unparsable sub-structures degrade to absent fields or skipped cards.
pub struct Extractor {
    /// Substring marking a card as colocative, matched case-insensitively
    /// against the overview text. The site's current vocabulary uses
    /// "colocation" in the detail lines.
    colocation_marker: String,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::with_marker("colocation")
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            colocation_marker: marker.into().to_lowercase(),
        }
    }

    pub fn extract(&self, search_url: &str, markup: &str) -> ResultsSummary {
        let document = Html::parse_document(markup);

        let heading = self.results_count(&document);

        // The localized "none" token short-circuits: no point enumerating
        // cards. A heading that parses to the integer 0 does not; counts and
        // cards are extracted independently and may disagree.
        if let ResultsHeading::NoResults = heading {
            info!("Found 0 accommodations");
            return ResultsSummary {
                search_url: search_url.to_string(),
                count: Some(0),
                headline_price: None,
                listings: Vec::new(),
                extracted_at: Utc::now(),
            };
        }

        let listings = self.parse_cards(&document);

        let (count, headline_price) = match heading {
            ResultsHeading::Reported(n, price) => {
                info!("Found {} accommodations", n);
                (Some(n), price)
            }
            ResultsHeading::Unreadable => (None, None),
            ResultsHeading::NoResults => unreachable!(),
        };

        ResultsSummary {
            search_url: search_url.to_string(),
            count,
            headline_price,
            listings,
            extracted_at: Utc::now(),
        }
    }

    /// Reported total from the results heading, with the headline price badge
    /// when the count parsed.
    fn results_count(&self, document: &Html) -> ResultsHeading {
        let selector = Selector::parse(RESULTS_HEADING_SELECTOR).unwrap();
        let heading = match document.select(&selector).next() {
            Some(h) => h,
            None => {
                error!("Could not find results heading to parse number of accommodations");
                return ResultsHeading::Unreadable;
            }
        };

        let raw_text = element_text(heading);
        let first_token = raw_text.split_whitespace().next().unwrap_or_default();
        debug!(
            "Results heading raw text: {:?}, first token: {:?}",
            raw_text, first_token
        );

        if first_token == NO_RESULTS_TOKEN {
            return ResultsHeading::NoResults;
        }

        match first_token.parse::<u32>() {
            Ok(number) => ResultsHeading::Reported(number, self.headline_price(document)),
            Err(_) => {
                error!("Could not parse number of accommodations: {:?}", first_token);
                ResultsHeading::Unreadable
            }
        }
    }

    fn headline_price(&self, document: &Html) -> Option<f64> {
        let selector = Selector::parse(PRICE_BADGE_SELECTOR).unwrap();
        let badge = match document.select(&selector).next() {
            Some(b) => b,
            None => {
                info!("No price badge found on results page");
                return None;
            }
        };

        let text = element_text(badge);
        match parse_price_value(&text) {
            Some(price) => {
                info!("Parsed accommodation price: {}", price);
                Some(price)
            }
            None => {
                error!("Could not parse accommodation price: {:?}", text);
                None
            }
        }
    }

    fn parse_cards(&self, document: &Html) -> Vec<Listing> {
        let selector = Selector::parse(CARD_SELECTOR).unwrap();
        document
            .select(&selector)
            .filter_map(|card| self.parse_card(card))
            .collect()
    }

    /// One result card. Returns `None` only when the title heading is absent;
    /// every other field degrades to an absent or raw value.
    fn parse_card(&self, card: ElementRef<'_>) -> Option<Listing> {
        let title_selector = Selector::parse(CARD_TITLE_SELECTOR).unwrap();
        let title_card = card.select(&title_selector).next()?;
        let title = element_text(title_card);

        let link_selector = Selector::parse(CARD_LINK_SELECTOR).unwrap();
        let detail_url = title_card
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"));
        let id = detail_url.and_then(parse_listing_id);

        let image_selector = Selector::parse(CARD_IMAGE_SELECTOR).unwrap();
        let image_url = card
            .select(&image_selector)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string);

        let mut overview = Vec::new();
        let desc_selector = Selector::parse(CARD_DESC_SELECTOR).unwrap();
        if let Some(address) = card.select(&desc_selector).next() {
            overview.push(element_text(address));
        }
        let detail_selector = Selector::parse(CARD_DETAIL_SELECTOR).unwrap();
        for detail in card.select(&detail_selector) {
            overview.push(element_text(detail));
        }
        let overview_details = overview.join("\n");

        let badge_selector = Selector::parse(PRICE_BADGE_SELECTOR).unwrap();
        let price = card.select(&badge_selector).next().map(|badge| {
            let text = element_text(badge);
            match parse_price_value(&text) {
                Some(value) => Price::Eur(value),
                None => Price::Text(text),
            }
        });

        let is_colocative = overview_details
            .to_lowercase()
            .contains(&self.colocation_marker);

        Some(Listing {
            id,
            title,
            image_url,
            price,
            overview_details,
            is_colocative,
        })
    }
}

/// Trailing path segment of a detail-page link, e.g.
/// `/tools/42/accommodations/2755` -> 2755.
fn parse_listing_id(url: &str) -> Option<u64> {
    url.rsplit('/').next()?.parse().ok()
}

/// Badge text like `"650,50 €"` -> 650.5. The currency symbol is stripped from
/// either end and the decimal comma normalized.
fn parse_price_value(text: &str) -> Option<f64> {
    text.trim()
        .trim_matches('€')
        .trim()
        .replace(',', ".")
        .parse()
        .ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_URL: &str =
        "https://trouverunlogement.lescrous.fr/tools/42/search?bounds=1_2_3_4";

    fn card(id: &str, title: &str, price: &str, details: &[&str]) -> String {
        let detail_paragraphs: String = details
            .iter()
            .map(|d| format!(r#"<p class="fr-card__detail">{d}</p>"#))
            .collect();
        format!(
            r#"<div class="fr-card">
                 <div class="fr-card__header">
                   <img class="fr-responsive-img" src="https://img.example.org/{id}.jpg" alt="">
                 </div>
                 <div class="fr-card__body">
                   <h3 class="fr-card__title">
                     <a href="/tools/42/accommodations/{id}">{title}</a>
                   </h3>
                   <p class="fr-card__desc">12 rue de la République, 69002 Lyon</p>
                   {detail_paragraphs}
                   <p class="fr-badge">{price}</p>
                 </div>
               </div>"#
        )
    }

    fn page(heading: &str, cards: &[String]) -> String {
        format!(
            r#"<html><body>
                 <h2 class="SearchResults-desktop fr-h4 svelte-11sc5my">{heading}</h2>
                 {}
               </body></html>"#,
            cards.concat()
        )
    }

    #[test]
    fn well_formed_cards_all_yield_listings_with_titles() {
        let html = page(
            "3 logements trouvés",
            &[
                card("101", "Studio A", "350,00 €", &["Studio de 18m²"]),
                card("102", "Studio B", "410,00 €", &["Studio de 21m²"]),
                card("103", "T2 C", "520,00 €", &["T2 de 35m²"]),
            ],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(summary.count, Some(3));
        assert_eq!(summary.listings.len(), 3);
        for listing in &summary.listings {
            assert!(!listing.title.is_empty());
        }
        assert_eq!(summary.listings[0].id, Some(101));
        assert_eq!(
            summary.listings[0].image_url.as_deref(),
            Some("https://img.example.org/101.jpg")
        );
    }

    #[test]
    fn price_with_decimal_comma_parses_to_numeric_value() {
        let html = page(
            "1 logement trouvé",
            &[card("7", "Studio", "650,50 €", &[])],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(summary.listings[0].price, Some(Price::Eur(650.5)));
    }

    #[test]
    fn non_numeric_price_is_kept_as_raw_text() {
        let html = page(
            "1 logement trouvé",
            &[card("7", "Studio", "Sur demande", &[])],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(
            summary.listings[0].price,
            Some(Price::Text("Sur demande".to_string()))
        );
    }

    #[test]
    fn card_without_title_is_skipped_but_neighbors_survive() {
        let broken = r#"<div class="fr-card">
                          <p class="fr-card__desc">No title here</p>
                          <p class="fr-badge">300,00 €</p>
                        </div>"#
            .to_string();
        let html = page(
            "3 logements trouvés",
            &[
                card("1", "Before", "250,00 €", &[]),
                broken,
                card("2", "After", "260,00 €", &[]),
            ],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(summary.listings.len(), 2);
        assert_eq!(summary.listings[0].title, "Before");
        assert_eq!(summary.listings[1].title, "After");
    }

    #[test]
    fn aucun_heading_short_circuits_to_empty_summary() {
        let html = page(
            "Aucun logement trouvé",
            &[card("9", "Ghost", "100,00 €", &[])],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(summary.count, Some(0));
        assert_eq!(summary.headline_price, None);
        assert!(summary.listings.is_empty());
    }

    #[test]
    fn zero_count_heading_still_enumerates_cards() {
        let html = page(
            "0 logements trouvés",
            &[card("11", "Straggler", "450,00 €", &[])],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(summary.count, Some(0));
        assert_eq!(summary.headline_price, Some(450.0));
        assert_eq!(summary.listings.len(), 1);
        assert_eq!(summary.listings[0].title, "Straggler");
    }

    #[test]
    fn missing_heading_leaves_count_absent_but_cards_still_parse() {
        let html = format!(
            "<html><body>{}</body></html>",
            card("5", "Orphan", "200,00 €", &[])
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(summary.count, None);
        assert_eq!(summary.listings.len(), 1);
    }

    #[test]
    fn unparsable_heading_token_leaves_count_absent_but_cards_still_parse() {
        let html = page("Beaucoup de logements", &[card("5", "Studio", "200,00 €", &[])]);

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(summary.count, None);
        assert_eq!(summary.listings.len(), 1);
    }

    #[test]
    fn headline_price_comes_from_first_badge() {
        let html = page(
            "1 logement trouvé",
            &[card("7", "Studio", "650,50 €", &[])],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(summary.headline_price, Some(650.5));
    }

    #[test]
    fn overview_joins_address_and_detail_lines() {
        let html = page(
            "1 logement trouvé",
            &[card("7", "Studio", "650,50 €", &["Studio de 18m²", "Individuel"])],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(
            summary.listings[0].overview_details,
            "12 rue de la République, 69002 Lyon\nStudio de 18m²\nIndividuel"
        );
    }

    #[test]
    fn colocation_marker_in_details_classifies_card() {
        let html = page(
            "2 logements trouvés",
            &[
                card("1", "T4 partagé", "300,00 €", &["T4 en Colocation"]),
                card("2", "Studio", "300,00 €", &["Individuel"]),
            ],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert!(summary.listings[0].is_colocative);
        assert!(!summary.listings[1].is_colocative);
    }

    #[test]
    fn unparsable_detail_link_leaves_id_absent() {
        let html = page(
            "1 logement trouvé",
            &[card("not-a-number", "Studio", "200,00 €", &[])],
        );

        let summary = Extractor::new().extract(SEARCH_URL, &html);

        assert_eq!(summary.listings[0].id, None);
    }
}
