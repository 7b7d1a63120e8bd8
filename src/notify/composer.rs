use tracing::debug;

use crate::models::{Listing, Notification, Price, ResultsSummary, SearchTarget};

const ACCOMMODATION_BASE_URL: &str =
    "https://trouverunlogement.lescrous.fr/tools/42/accommodations";

const NO_RESULTS_MESSAGE: &str = "Aucun logement trouvé. Voici une liste des ponts de France où \
     vous pourriez dormir : https://fr.wikipedia.org/wiki/Liste_de_ponts_de_France";

/// Reduces a results summary to an optional rendered message. Pure: no I/O,
/// no hidden state, identical inputs give identical output.
pub struct NotificationComposer {
    /// Send a heartbeat message even when nothing matched.
    notify_when_no_results: bool,
}

impl NotificationComposer {
    pub fn new(notify_when_no_results: bool) -> Self {
        Self {
            notify_when_no_results,
        }
    }

    pub fn compose(&self, target: &SearchTarget, summary: &ResultsSummary) -> Option<Notification> {
        let mut listings: Vec<&Listing> = summary.listings.iter().collect();

        // Permanently ignored listings never reach a notification.
        if !target.ignored_ids.is_empty() {
            listings.retain(|l| l.id.map_or(true, |id| !target.ignored_ids.contains(&id)));
        }

        if let Some(max_price) = target.max_price {
            let before = listings.len();
            listings.retain(|l| matches!(l.price, Some(Price::Eur(p)) if p < max_price));
            debug!(
                "Price filter: kept {}/{} accommodations with price < {:.2}",
                listings.len(),
                before,
                max_price
            );
        }

        if target.colocative_only {
            let before = listings.len();
            listings.retain(|l| l.is_colocative);
            debug!(
                "Colocative filter: kept {}/{} colocative accommodations",
                listings.len(),
                before
            );
        }

        if listings.is_empty() && !self.notify_when_no_results {
            return None;
        }

        let mut message = if listings.is_empty() {
            NO_RESULTS_MESSAGE.to_string()
        } else {
            let s = if listings.len() > 1 { "s" } else { "" };
            let verb = if listings.len() > 1 { "sont" } else { "est" };
            let max_price = match target.max_price {
                Some(p) => format!("{p}€"),
                None => "aucun".to_string(),
            };
            format!(
                "Bonne nouvelle ! {n} logement{s} {verb} disponible{s} :\n\
                 Filtre appliqué : prix max = {max_price}, colocation = {coloc}\n\n",
                n = listings.len(),
                coloc = target.colocative_only,
            )
        };

        message.push_str(
            &listings
                .iter()
                .map(|l| format_listing(l))
                .collect::<Vec<_>>()
                .join("\n\n"),
        );

        message.push_str(&format!(
            "\n\n<a href=\"{url}\">{url_text}</a>",
            url = summary.search_url,
            url_text = escape_html(&summary.search_url),
        ));

        Some(Notification { message })
    }
}

fn format_listing(listing: &Listing) -> String {
    let title = if listing.title.is_empty() {
        "Sans titre"
    } else {
        &listing.title
    };
    let price_text = match &listing.price {
        Some(Price::Eur(value)) => format!("{value}€"),
        Some(Price::Text(raw)) => raw.clone(),
        None => String::new(),
    };

    // Title and price come from a third-party page and must be escaped.
    let title_html = escape_html(title);
    let price_html = escape_html(&price_text);

    match listing.id {
        Some(id) => format!(
            "<a href=\"{ACCOMMODATION_BASE_URL}/{id}\"><b>{title_html}</b></a> ({price_html})"
        ),
        None => format!("<b>{title_html}</b> ({price_html})"),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
