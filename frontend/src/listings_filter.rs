//! Listings filter form → full-page navigation to `/listings?<query>`.

use shared::{FilterQuery, ListingsSection};
use web_sys::Document;

use crate::dom;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
    City,
    MinPrice,
    MaxPrice,
    ListingType,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::City,
        FilterField::MinPrice,
        FilterField::MaxPrice,
        FilterField::ListingType,
    ];

    pub fn element_id(self, config: &ListingsSection) -> &str {
        match self {
            FilterField::City => &config.city_input_id,
            FilterField::MinPrice => &config.min_price_id,
            FilterField::MaxPrice => &config.max_price_id,
            FilterField::ListingType => &config.type_select_id,
        }
    }

    pub fn value(self, query: &FilterQuery) -> Option<&str> {
        match self {
            FilterField::City => query.city.as_deref(),
            FilterField::MinPrice => query.min_price.as_deref(),
            FilterField::MaxPrice => query.max_price.as_deref(),
            FilterField::ListingType => query.listing_type.as_deref(),
        }
    }
}

/// Values from the URL for fields the form left empty. Filled-in fields are never overwritten.
pub fn prefill_values(from_url: &FilterQuery, in_form: &FilterQuery) -> Vec<(FilterField, String)> {
    FilterField::ALL
        .into_iter()
        .filter(|field| field.value(in_form).is_none())
        .filter_map(|field| field.value(from_url).map(|value| (field, value.to_string())))
        .collect()
}

pub struct ListingsFilter {
    config: ListingsSection,
}

impl ListingsFilter {
    pub fn new(config: ListingsSection) -> Self {
        Self { config }
    }

    /// Current form state. Missing elements count as empty fields.
    pub fn read_form(&self, document: &Document) -> FilterQuery {
        let read = |field: FilterField| dom::field_value(document, field.element_id(&self.config));
        FilterQuery::from_fields(
            read(FilterField::City),
            read(FilterField::MinPrice),
            read(FilterField::MaxPrice),
            read(FilterField::ListingType),
        )
    }

    pub fn target_href(&self, document: &Document) -> String {
        self.read_form(document).href(&self.config.path)
    }

    /// Navigate the whole page to the filtered listings.
    pub fn apply(&self) -> Result<(), String> {
        let href = self.target_href(&dom::document()?);
        zoon::println!("[Listings] Navigating to {href}");
        dom::window()?
            .location()
            .set_href(&href)
            .map_err(dom::js_error)
    }

    /// Copy filters from `location.search` into empty form fields on the listings page.
    pub fn prefill_from_location(&self, document: &Document) -> Result<(), String> {
        let location = dom::window()?.location();
        if location.pathname().map_err(dom::js_error)? != self.config.path {
            return Ok(());
        }
        let from_url = FilterQuery::parse(&location.search().map_err(dom::js_error)?);
        for (field, value) in prefill_values(&from_url, &self.read_form(document)) {
            dom::set_field_value(document, field.element_id(&self.config), &value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(city: &str, min: &str, max: &str, listing_type: &str) -> FilterQuery {
        FilterQuery::from_fields(
            Some(city.to_string()),
            Some(min.to_string()),
            Some(max.to_string()),
            Some(listing_type.to_string()),
        )
    }

    #[test]
    fn prefill_only_touches_empty_fields() {
        let from_url = query("Paris", "100", "500000", "flat");
        let in_form = query("Lyon", "", "", "");

        assert_eq!(
            prefill_values(&from_url, &in_form),
            vec![
                (FilterField::MinPrice, "100".to_string()),
                (FilterField::MaxPrice, "500000".to_string()),
                (FilterField::ListingType, "flat".to_string()),
            ]
        );
    }

    #[test]
    fn nothing_to_prefill_from_bare_url() {
        let in_form = query("", "", "", "");
        assert!(prefill_values(&FilterQuery::parse("?"), &in_form).is_empty());
    }

    #[test]
    fn field_ids_follow_config() {
        let config = ListingsSection::default();
        let ids: Vec<_> = FilterField::ALL
            .into_iter()
            .map(|field| field.element_id(&config).to_string())
            .collect();
        assert_eq!(ids, vec!["city-input", "min-price", "max-price", "type-select"]);
    }
}
