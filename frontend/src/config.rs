//! Page configuration: optional inline TOML overriding the default element wiring.
//!
//! ```html
//! <script type="application/toml" id="marketplace-ui-config">
//! [uploader]
//! max_photos = 5
//! </script>
//! ```

use shared::PageConfig;
use web_sys::Document;

pub const CONFIG_ELEMENT_ID: &str = "marketplace-ui-config";

pub fn load_page_config(document: &Document) -> PageConfig {
    let Some(source) = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content())
    else {
        return PageConfig::default();
    };

    match PageConfig::from_toml(&source) {
        Ok(config) => {
            zoon::println!("⚙️ CONFIG: Loaded inline page config");
            config
        }
        Err(error) => {
            zoon::eprintln!("⚙️ CONFIG: Invalid inline page config, using defaults: {error}");
            PageConfig::default()
        }
    }
}
