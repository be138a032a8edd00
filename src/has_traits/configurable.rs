//! Applying a config tree to an instance.

use crate::config::{Config, ConfigItem};
use crate::eventful::Eventful;
use crate::trait_types::TraitError;
use crate::value::Value;

use super::HasTraits;

impl HasTraits {
    /// Sets configurable traits from the sections of `config` named after
    /// this object's class and its bases.
    ///
    /// Sections are applied from the root base to the class itself, so a
    /// derived section overrides its base's. Lazy values are resolved
    /// against the trait's current value. Keys that are not configurable
    /// traits are logged and skipped; nested sections are ignored.
    ///
    /// Everything is assigned in one hold region: observers see one change
    /// per trait, and a rejected value leaves every trait as it was.
    ///
    /// # Errors
    ///
    /// Returns the first validation, read-only or observer error.
    pub fn apply_config(&self, config: &Config) -> Result<(), TraitError> {
        let class = self.class();
        let chain: Vec<_> = class.mro().into_iter().rev().collect();
        self.hold_trait_notifications(|| {
            for section_class in &chain {
                let Some(section) = config.section(section_class.name()) else {
                    continue;
                };
                for (key, item) in section.iter() {
                    if matches!(item, ConfigItem::Section(_)) {
                        continue;
                    }
                    let Some(t) = class.trait_named(key).filter(|t| t.is_configurable()) else {
                        tracing::warn!(
                            "Config option `{key}` not recognized by `{}`.",
                            section_class.name()
                        );
                        continue;
                    };
                    let value = match item {
                        ConfigItem::Value(value) => value.deep_copy(),
                        ConfigItem::Lazy(lazy) if lazy.is_empty() => continue,
                        ConfigItem::Lazy(lazy) => lazy.resolve(&self.get(key)?),
                        ConfigItem::Section(_) => continue,
                    };
                    let value = if t.is_eventful() {
                        Eventful::wrap(&value).map_or(value, Value::Eventful)
                    } else {
                        value
                    };
                    tracing::debug!(class = section_class.name(), trait_name = key, "Applying config value");
                    self.set(key, value)?;
                }
            }
            Ok(())
        })
    }
}
