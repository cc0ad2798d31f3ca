//! YAML Catalog Schema Provider
//!
//! Reads record types, their fields, subgroups, per-field rules and seed
//! records from a YAML catalog.
//!
//! ```yaml
//! record_types:
//!   - name: Sales Order
//!     fields:
//!       - { name: customer, type: reference, record_type: Customer, required: true }
//!       - { name: delivery_date, type: date, required: true, rules: [not_in_past] }
//!     subgroups:
//!       - { name: items, label: Items, row_type: Sales Order Item }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::domain::intake::{FieldRule, FieldRules};
use crate::domain::schema::{FieldDescriptor, FieldType, RecordType, SubgroupDescriptor};
use crate::ports::{SchemaError, SchemaProvider};

/// Errors raised while loading a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    record_types: Vec<RecordTypeEntry>,
}

#[derive(Debug, Deserialize)]
struct RecordTypeEntry {
    name: String,
    #[serde(default)]
    title_field: Option<String>,
    #[serde(default)]
    fields: Vec<FieldEntry>,
    #[serde(default)]
    subgroups: Vec<SubgroupEntry>,
    #[serde(default)]
    records: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(flatten)]
    field_type: FieldType,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    rules: Vec<FieldRule>,
}

#[derive(Debug, Deserialize)]
struct SubgroupEntry {
    name: String,
    #[serde(default)]
    label: Option<String>,
    row_type: String,
    #[serde(default = "default_required")]
    required: bool,
}

fn default_required() -> bool {
    true
}

/// "delivery_date" -> "Delivery Date"
fn label_from_name(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
struct RecordSchema {
    record_type: RecordType,
    title_field: Option<String>,
    required: Vec<FieldDescriptor>,
    optional: Vec<FieldDescriptor>,
    subgroups: Vec<(SubgroupDescriptor, bool)>,
    records: Vec<Map<String, Value>>,
}

/// Schema provider backed by a YAML catalog.
#[derive(Debug, Clone)]
pub struct CatalogSchemaProvider {
    order: Vec<RecordType>,
    schemas: HashMap<RecordType, RecordSchema>,
    rules: FieldRules,
}

impl CatalogSchemaProvider {
    /// Load a catalog from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Parse and validate a catalog from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::Parse(e.to_string()))?;

        let mut order = Vec::new();
        let mut schemas = HashMap::new();
        let mut rules = FieldRules::new();

        for entry in file.record_types {
            let record_type =
                RecordType::new(entry.name).map_err(|e| CatalogError::Invalid(e.to_string()))?;
            if schemas.contains_key(&record_type) {
                return Err(CatalogError::Invalid(format!(
                    "record type '{}' is declared twice",
                    record_type
                )));
            }

            let mut required = Vec::new();
            let mut optional = Vec::new();
            let mut seen = HashSet::new();
            for field in entry.fields {
                if !seen.insert(field.name.clone()) {
                    return Err(CatalogError::Invalid(format!(
                        "{}: field '{}' is declared twice",
                        record_type, field.name
                    )));
                }
                if matches!(&field.field_type, FieldType::Select { options } if options.is_empty()) {
                    return Err(CatalogError::Invalid(format!(
                        "{}: select field '{}' has no options",
                        record_type, field.name
                    )));
                }
                for rule in &field.rules {
                    rules.add(record_type.clone(), field.name.clone(), *rule);
                }

                let label = field.label.unwrap_or_else(|| label_from_name(&field.name));
                let mut descriptor = FieldDescriptor::new(field.name, label, field.field_type);
                descriptor.default = field.default;
                if field.required {
                    required.push(descriptor);
                } else {
                    optional.push(descriptor);
                }
            }

            let mut subgroups = Vec::new();
            for group in entry.subgroups {
                let row_type = RecordType::new(group.row_type)
                    .map_err(|e| CatalogError::Invalid(e.to_string()))?;
                let label = group.label.unwrap_or_else(|| label_from_name(&group.name));
                subgroups.push((SubgroupDescriptor::new(group.name, label, row_type), group.required));
            }

            order.push(record_type.clone());
            schemas.insert(
                record_type.clone(),
                RecordSchema {
                    record_type,
                    title_field: entry.title_field,
                    required,
                    optional,
                    subgroups,
                    records: entry.records,
                },
            );
        }

        let provider = Self {
            order,
            schemas,
            rules,
        };
        provider.check_references()?;
        Ok(provider)
    }

    fn check_references(&self) -> Result<(), CatalogError> {
        for schema in self.schemas.values() {
            for (group, _) in &schema.subgroups {
                if !self.schemas.contains_key(&group.row_type) {
                    return Err(CatalogError::Invalid(format!(
                        "{}: subgroup '{}' uses unknown row type '{}'",
                        schema.record_type, group.name, group.row_type
                    )));
                }
            }
            for field in schema.required.iter().chain(&schema.optional) {
                if let Some(target) = field.field_type.referenced_type() {
                    if !self.schemas.contains_key(target) {
                        return Err(CatalogError::Invalid(format!(
                            "{}: field '{}' references unknown record type '{}'",
                            schema.record_type, field.name, target
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Rules declared in the catalog, keyed by (record type, field).
    pub fn field_rules(&self) -> FieldRules {
        self.rules.clone()
    }

    /// Title field per record type, for display names.
    pub fn title_fields(&self) -> HashMap<RecordType, String> {
        self.schemas
            .values()
            .filter_map(|s| s.title_field.clone().map(|f| (s.record_type.clone(), f)))
            .collect()
    }

    /// Seed records in catalog order.
    pub fn seed_records(&self) -> Vec<(RecordType, Map<String, Value>)> {
        self.order
            .iter()
            .filter_map(|rt| self.schemas.get(rt))
            .flat_map(|s| s.records.iter().map(|r| (s.record_type.clone(), r.clone())))
            .collect()
    }

    fn schema(&self, record_type: &RecordType) -> Result<&RecordSchema, SchemaError> {
        self.schemas
            .get(record_type)
            .ok_or_else(|| SchemaError::UnknownRecordType(record_type.to_string()))
    }
}

#[async_trait]
impl SchemaProvider for CatalogSchemaProvider {
    async fn record_types(&self) -> Result<Vec<RecordType>, SchemaError> {
        Ok(self.order.clone())
    }

    async fn required_fields(
        &self,
        record_type: &RecordType,
    ) -> Result<Vec<FieldDescriptor>, SchemaError> {
        Ok(self.schema(record_type)?.required.clone())
    }

    async fn optional_fields(
        &self,
        record_type: &RecordType,
    ) -> Result<Vec<FieldDescriptor>, SchemaError> {
        Ok(self.schema(record_type)?.optional.clone())
    }

    async fn required_subgroups(
        &self,
        record_type: &RecordType,
    ) -> Result<Vec<SubgroupDescriptor>, SchemaError> {
        Ok(self
            .schema(record_type)?
            .subgroups
            .iter()
            .filter(|(_, required)| *required)
            .map(|(group, _)| group.clone())
            .collect())
    }

    async fn subgroup_row_type(
        &self,
        record_type: &RecordType,
        subgroup: &str,
    ) -> Result<RecordType, SchemaError> {
        self.schema(record_type)?
            .subgroups
            .iter()
            .find(|(group, _)| group.name == subgroup)
            .map(|(group, _)| group.row_type.clone())
            .ok_or_else(|| SchemaError::UnknownSubgroup {
                record_type: record_type.clone(),
                subgroup: subgroup.to_string(),
            })
    }
}
