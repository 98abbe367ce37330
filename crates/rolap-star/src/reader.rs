use crate::warning::{warn, Warning, WarningKind};
use rolap_model::{CatalogConfig, MemberReaderKind};
use std::collections::HashMap;

/// Named member reader strategies a hierarchy can ask for.
#[derive(Clone, Debug)]
pub struct MemberReaderRegistry {
    readers: HashMap<String, MemberReaderKind>,
}

impl Default for MemberReaderRegistry {
    fn default() -> Self {
        let mut registry = Self {
            readers: HashMap::new(),
        };
        registry.register("sql", MemberReaderKind::Sql);
        registry.register("cached", MemberReaderKind::Cached);
        registry.register("no-cache", MemberReaderKind::NoCache);
        registry.register("noCache", MemberReaderKind::NoCache);
        registry
    }
}

impl MemberReaderRegistry {
    /// The built-in readers plus those named in `config`.
    pub fn from_config(config: &CatalogConfig) -> Self {
        let mut registry = Self::default();
        for (name, kind) in &config.member_readers {
            registry.register(name, *kind);
        }
        registry
    }

    pub fn register(&mut self, name: &str, kind: MemberReaderKind) {
        self.readers.insert(name.to_ascii_lowercase(), kind);
    }

    pub fn get(&self, name: &str) -> Option<MemberReaderKind> {
        self.readers.get(&name.to_ascii_lowercase()).copied()
    }

    /// The reader for `hierarchy`. Unknown names fall back to [`MemberReaderKind::Sql`].
    pub fn resolve(
        &self,
        requested: Option<&str>,
        hierarchy: &str,
        warnings: &mut Vec<Warning>,
    ) -> MemberReaderKind {
        let Some(name) = requested else {
            return MemberReaderKind::default();
        };
        match self.get(name) {
            Some(kind) => kind,
            None => {
                warn(
                    warnings,
                    WarningKind::UnknownMemberReader,
                    format!(
                        "hierarchy {hierarchy} asks for unknown member reader {name}; reading members with SQL"
                    ),
                );
                MemberReaderKind::Sql
            }
        }
    }
}
