use crate::error::{CatalogError, StarError};
use crate::reader::MemberReaderRegistry;
use crate::register::register_usage;
use crate::registry::{lock_star, SharedStar, StarRegistry};
use crate::star::{ColumnId, StarKey};
use crate::usage::{resolve_usages, HierarchyUsage};
use crate::warning::{warn, Warning, WarningKind};
use rolap_model::{
    CatalogConfig, Cube, CubeDimension, MemberReaderKind, ModelError, Schema,
};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct UsageId(usize);

#[derive(Debug)]
struct CubeEntry {
    name: String,
    star: SharedStar,
    usages: Vec<UsageId>,
    measures: HashMap<String, ColumnId>,
    readers: HashMap<String, MemberReaderKind>,
}

/// The stars and hierarchy usages of a loaded schema.
#[derive(Debug)]
pub struct Catalog {
    schema_name: String,
    registry: StarRegistry,
    cubes: Vec<CubeEntry>,
    usages: Vec<HierarchyUsage>,
    level_columns: HashMap<(UsageId, String), ColumnId>,
    warnings: Vec<Warning>,
}

impl Catalog {
    /// Build a star for every distinct fact table of `schema` and attach every
    /// cube's dimensions and measures to it.
    ///
    /// Problems with a fallback are recorded in [`Catalog::warnings`]; anything
    /// else aborts the load.
    pub fn load(schema: &Schema, config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut catalog = Self {
            schema_name: schema.name.clone(),
            registry: StarRegistry::new(),
            cubes: Vec::with_capacity(schema.cubes.len()),
            usages: Vec::new(),
            level_columns: HashMap::new(),
            warnings: Vec::new(),
        };
        let readers = MemberReaderRegistry::from_config(config);
        for cube in &schema.cubes {
            catalog.load_cube(schema, cube, config, &readers)?;
        }
        log::debug!(
            "loaded schema {}: {} cubes over {} stars, {} warnings",
            schema.name,
            catalog.cubes.len(),
            catalog.registry.len(),
            catalog.warnings.len()
        );
        Ok(catalog)
    }

    fn load_cube(
        &mut self,
        schema: &Schema,
        cube: &Cube,
        config: &CatalogConfig,
        readers: &MemberReaderRegistry,
    ) -> Result<(), CatalogError> {
        let model_error = |source: ModelError| CatalogError::Model {
            schema: schema.name.clone(),
            source,
        };
        let star_error = |source: StarError| CatalogError::Star {
            schema: schema.name.clone(),
            cube: cube.name.clone(),
            source,
        };

        let fact = cube.fact_table().map_err(model_error)?;
        let fact_key = StarKey::for_fact(fact);
        let shared = self.registry.get_or_create(fact, config);
        let mut entry = CubeEntry {
            name: cube.name.clone(),
            star: SharedStar::clone(&shared),
            usages: Vec::new(),
            measures: HashMap::new(),
            readers: HashMap::new(),
        };

        let mut star = lock_star(&shared);
        for attachment in &cube.dimensions {
            let dimension = cube
                .resolve_dimension(schema, attachment)
                .map_err(model_error)?;
            let same_source_uses = match attachment {
                CubeDimension::Usage(usage) => cube
                    .dimensions
                    .iter()
                    .filter(|d| matches!(d, CubeDimension::Usage(u) if u.source == usage.source))
                    .count(),
                CubeDimension::Private(_) => 1,
            };
            let usages = resolve_usages(
                cube,
                &fact_key,
                attachment,
                dimension,
                same_source_uses,
                &mut self.warnings,
            )
            .map_err(star_error)?;

            for usage in usages {
                if entry.usages.iter().any(|id| self.usages[id.0] == usage) {
                    warn(
                        &mut self.warnings,
                        WarningKind::DuplicateUsage,
                        format!(
                            "cube {} declares hierarchy {} of {} twice; keeping the first",
                            cube.name, usage.hierarchy_name, usage.name
                        ),
                    );
                    continue;
                }

                let hierarchy = &dimension.hierarchies[usage.hierarchy_index];
                let columns =
                    register_usage(&mut star, hierarchy, &usage, config, &mut self.warnings)
                        .map_err(star_error)?;
                let id = UsageId(self.usages.len());
                for (level, column) in columns {
                    self.level_columns.insert((id, level), column);
                }
                let reader = readers.resolve(
                    hierarchy.member_reader.as_deref(),
                    &usage.hierarchy_name,
                    &mut self.warnings,
                );
                entry
                    .readers
                    .entry(usage.hierarchy_name.clone())
                    .or_insert(reader);
                entry.usages.push(id);
                self.usages.push(usage);
            }
        }

        for measure in &cube.measures {
            let column = star.register_measure(measure);
            entry.measures.insert(measure.name.clone(), column);
        }
        drop(star);

        self.cubes.push(entry);
        Ok(())
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn registry(&self) -> &StarRegistry {
        &self.registry
    }

    fn cube(&self, name: &str) -> Option<&CubeEntry> {
        self.cubes.iter().find(|c| c.name == name)
    }

    pub fn cube_names(&self) -> impl Iterator<Item = &str> {
        self.cubes.iter().map(|c| c.name.as_str())
    }

    /// The star the cube's fact table maps to. Cubes over the same fact table
    /// share it.
    pub fn star_for_cube(&self, cube: &str) -> Option<SharedStar> {
        self.cube(cube).map(|c| SharedStar::clone(&c.star))
    }

    /// The cube's hierarchy usages in declaration order, duplicates dropped.
    pub fn usages(&self, cube: &str) -> Vec<&HierarchyUsage> {
        self.cube(cube)
            .map(|c| c.usages.iter().map(|id| &self.usages[id.0]).collect())
            .unwrap_or_default()
    }

    /// Key column of `level` as registered for the cube dimension named
    /// `usage` (e.g. `Ship Date`).
    pub fn level_column(&self, cube: &str, usage: &str, level: &str) -> Option<ColumnId> {
        let cube = self.cube(cube)?;
        cube.usages
            .iter()
            .filter(|id| self.usages[id.0].name == usage)
            .find_map(|id| self.level_columns.get(&(*id, level.to_string())).copied())
    }

    pub fn measure_column(&self, cube: &str, measure: &str) -> Option<ColumnId> {
        self.cube(cube)?.measures.get(measure).copied()
    }

    pub fn member_reader(&self, cube: &str, hierarchy: &str) -> Option<MemberReaderKind> {
        self.cube(cube)?.readers.get(hierarchy).copied()
    }

    /// Every degraded-but-continued problem met while loading.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Drop every star and usage. The catalog is empty afterwards.
    pub fn flush(&mut self) {
        log::debug!("flushing catalog {}", self.schema_name);
        self.registry.clear();
        self.cubes.clear();
        self.usages.clear();
        self.level_columns.clear();
        self.warnings.clear();
    }
}
