use serde::{Deserialize, Serialize};

// ===== FILTER QUERY =====

/// Query parameter names understood by the `/listings` route.
pub const CITY_PARAM: &str = "city";
pub const MIN_PRICE_PARAM: &str = "min_price";
pub const MAX_PRICE_PARAM: &str = "max_price";
pub const TYPE_PARAM: &str = "type";

/// Listing filters as carried in the `/listings` query string.
///
/// Every field is optional. Empty values never make it into the struct,
/// so an encoded query only ever contains parameters the user actually filled in.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub city: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub listing_type: Option<String>,
}

impl FilterQuery {
    /// Build a query from raw form values. `None` and `""` are both treated as absent.
    pub fn from_fields(
        city: Option<String>,
        min_price: Option<String>,
        max_price: Option<String>,
        listing_type: Option<String>,
    ) -> Self {
        Self {
            city: non_empty(city),
            min_price: non_empty(min_price),
            max_price: non_empty(max_price),
            listing_type: non_empty(listing_type),
        }
    }

    /// Decode a `/listings` query string (with or without the leading `?`).
    /// Unknown parameters are ignored, the first occurrence of a known one wins.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut filters = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                CITY_PARAM => &mut filters.city,
                MIN_PRICE_PARAM => &mut filters.min_price,
                MAX_PRICE_PARAM => &mut filters.max_price,
                TYPE_PARAM => &mut filters.listing_type,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        filters
    }

    pub fn is_empty(&self) -> bool {
        self.params().next().is_none()
    }

    /// Present parameters in route order: city, min_price, max_price, type.
    pub fn params(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (CITY_PARAM, &self.city),
            (MIN_PRICE_PARAM, &self.min_price),
            (MAX_PRICE_PARAM, &self.max_price),
            (TYPE_PARAM, &self.listing_type),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
    }

    /// `application/x-www-form-urlencoded` serialization, same rules as `URLSearchParams`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in self.params() {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }

    /// Navigation target, e.g. `/listings?city=Paris`. The `?` is kept even for an empty query.
    pub fn href(&self, listings_path: &str) -> String {
        format!("{listings_path}?{}", self.to_query_string())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

// ===== CONFIG TYPES =====

/// Page wiring: element ids, marker classes and limits used by the frontend controllers.
///
/// Every section falls back to its default, so a page only needs to override what differs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    pub app: AppSection,
    pub uploader: UploaderSection,
    pub popups: PopupSection,
    pub listings: ListingsSection,
    pub chat: ChatSection,
    pub search: SearchSection,
}

impl PageConfig {
    pub fn from_toml(source: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(source).map_err(|error| error.to_string())?;
        if !config.app.is_supported_version() {
            return Err(format!(
                "Unsupported page config version '{}', expected '{}'",
                config.app.version,
                AppSection::CURRENT_VERSION
            ));
        }
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|error| error.to_string())
    }
}

// AppSection versions the config format so stale inline configs are rejected instead of misread
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSection {
    pub version: String,
}

impl AppSection {
    pub const CURRENT_VERSION: &'static str = "1.0.0";

    pub fn is_supported_version(&self) -> bool {
        self.version == Self::CURRENT_VERSION
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UploaderSection {
    pub drop_zone_id: String,
    pub file_input_id: String,
    pub preview_grid_id: String,
    /// Class toggled on the drop zone while something is dragged over it.
    pub active_class: String,
    pub preview_item_class: String,
    pub max_photos: usize,
    /// Notice shown when too many files are chosen; `{max}` is replaced with `max_photos`.
    pub rejection_message: String,
}

impl UploaderSection {
    pub fn rejection_notice(&self) -> String {
        self.rejection_message.replace("{max}", &self.max_photos.to_string())
    }
}

impl Default for UploaderSection {
    fn default() -> Self {
        Self {
            drop_zone_id: "drop-zone".to_string(),
            file_input_id: "file-input".to_string(),
            preview_grid_id: "preview-grid".to_string(),
            active_class: "dragover".to_string(),
            preview_item_class: "preview-item".to_string(),
            max_photos: 10,
            rejection_message: "Можно загрузить максимум {max} фото".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PopupSection {
    pub popup_class: String,
    pub popup_id_prefix: String,
    pub trigger_class: String,
    /// Vertical distance in pixels between the trigger button and its popup.
    pub gap: f64,
}

impl PopupSection {
    pub fn popup_element_id(&self, id: &str) -> String {
        format!("{}{id}", self.popup_id_prefix)
    }
}

impl Default for PopupSection {
    fn default() -> Self {
        Self {
            popup_class: "filter-popup".to_string(),
            popup_id_prefix: "filter-".to_string(),
            trigger_class: "fbtn".to_string(),
            gap: 10.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ListingsSection {
    pub path: String,
    pub city_input_id: String,
    pub min_price_id: String,
    pub max_price_id: String,
    pub type_select_id: String,
}

impl Default for ListingsSection {
    fn default() -> Self {
        Self {
            path: "/listings".to_string(),
            city_input_id: "city-input".to_string(),
            min_price_id: "min-price".to_string(),
            max_price_id: "max-price".to_string(),
            type_select_id: "type-select".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatSection {
    pub textarea_id: String,
    pub form_id: String,
    pub messages_id: String,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            textarea_id: "chat-text".to_string(),
            form_id: "chat-form".to_string(),
            messages_id: "chat-messages".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchSection {
    pub input_id: String,
    /// Name of the page-global function invoked on Enter.
    pub function_name: String,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            input_id: "ai-search-input".to_string(),
            function_name: "aiSearch".to_string(),
        }
    }
}
