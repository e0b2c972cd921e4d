//! Display alias overlay for decoded brief strings.
//!
//! Pure presentation: mapping a brief to an alias never touches the
//! record's decoded strings. An empty table is represented as absent to
//! keep persistence simple.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AliasTable {
    aliases: Option<HashMap<String, String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self { aliases: None }
    }

    /// Map `brief` to `alias`; an empty alias removes the mapping. The
    /// table drops back to absent when its last entry is removed.
    pub fn set_alias(&mut self, brief: &str, alias: &str) {
        if alias.is_empty() {
            if let Some(map) = &mut self.aliases {
                map.remove(brief);
                if map.is_empty() {
                    self.aliases = None;
                }
            }
            return;
        }
        self.aliases
            .get_or_insert_with(HashMap::new)
            .insert(brief.to_string(), alias.to_string());
    }

    /// The display string for `brief`: its alias if one exists, else the
    /// brief unchanged.
    pub fn resolve<'a>(&'a self, brief: &'a str) -> &'a str {
        match &self.aliases {
            Some(map) => map.get(brief).map(String::as_str).unwrap_or(brief),
            None => brief,
        }
    }

    pub fn is_absent(&self) -> bool {
        self.aliases.is_none()
    }

    /// All mappings in deterministic (sorted) order, for persistence.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .aliases
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }
}
