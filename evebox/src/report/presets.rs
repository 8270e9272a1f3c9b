//! Named, pre-configured aggregations.

use crate::report::types::SortOrder;
use serde::{Deserialize, Serialize};

/// Fields offered as quick picks next to the free-text field input.
pub const SUGGESTED_FIELDS: &[&str] = &["tls.sni", "tls.subject"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub field: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl Preset {
    fn builtin(name: &str, field: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field: field.to_string(),
            description: description.to_string(),
            size: None,
            order: None,
        }
    }
}

pub fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::builtin("tls-sni", "tls.sni", "TLS server names"),
        Preset::builtin("tls-subject", "tls.subject", "TLS certificate subjects"),
        Preset::builtin("alert-signature", "alert.signature", "Alert signatures"),
        Preset::builtin("source-ip", "src_ip", "Source addresses"),
        Preset::builtin("destination-ip", "dest_ip", "Destination addresses"),
        Preset::builtin("dns-rrname", "dns.rrname", "DNS query names"),
        Preset::builtin("http-hostname", "http.hostname", "HTTP host names"),
    ]
}

/// Built-in presets plus any configured ones. Configured presets replace
/// built-ins of the same name.
#[derive(Debug, Clone)]
pub struct PresetCatalog {
    presets: Vec<Preset>,
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self {
            presets: builtin_presets(),
        }
    }
}

impl PresetCatalog {
    pub fn with_extra(extra: &[Preset]) -> Self {
        let mut catalog = Self::default();
        for preset in extra {
            match catalog
                .presets
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(&preset.name))
            {
                Some(existing) => *existing = preset.clone(),
                None => catalog.presets.push(preset.clone()),
            }
        }
        catalog
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&Preset> {
        let name = name.trim();
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
