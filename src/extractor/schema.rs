//! The company feature schema
//!
//! Field order matters: it is the order of the prompt, and every explanation
//! field comes right before the decision it justifies.

use serde_json::{json, Map, Value};

/// Declared type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free-form string
    Text,
    /// List of strings
    List,
    /// One of a fixed set of strings
    Literal(&'static [&'static str]),
}

/// How a feature is compared against ground truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    LiteralBool,
    LiteralEnum,
    Text,
    List,
}

/// One field of the extraction schema
#[derive(Debug, Clone, Copy)]
pub struct SchemaField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

impl SchemaField {
    /// Metadata and explanation fields are never scored
    pub fn is_feature(&self) -> bool {
        self.name != "domain" && !self.name.ends_with("_explanation")
    }

    pub fn feature_type(&self) -> FeatureType {
        match self.kind {
            FieldKind::Text => FeatureType::Text,
            FieldKind::List => FeatureType::List,
            FieldKind::Literal(values) if is_bool_literal(values) => FeatureType::LiteralBool,
            FieldKind::Literal(_) => FeatureType::LiteralEnum,
        }
    }

    /// Type as shown in the prompt, e.g. `list[str]` or `one of ["true", "false"]`
    pub fn prompt_type(&self) -> String {
        match self.kind {
            FieldKind::Text => "str".to_string(),
            FieldKind::List => "list[str]".to_string(),
            FieldKind::Literal(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
                format!("one of [{}]", quoted.join(", "))
            }
        }
    }
}

fn is_bool_literal(values: &[&str]) -> bool {
    let mut sorted: Vec<&str> = values.to_vec();
    sorted.sort_unstable();
    sorted == ["false", "true"] || sorted == ["false", "true", "unknown"]
}

const TRUE_FALSE: &[&str] = &["true", "false"];
const TRUE_FALSE_UNKNOWN: &[&str] = &["true", "false", "unknown"];
const PRODUCT_CATEGORIES: &[&str] = &["non-profit", "B2B", "B2C", "SMB", "unknown"];

/// Every field the extractor is asked to fill, in prompt order
pub const SCHEMA: &[SchemaField] = &[
    SchemaField {
        name: "domain",
        kind: FieldKind::Text,
        description: "The company's domain name",
    },
    SchemaField {
        name: "under_maintenance_explanation",
        kind: FieldKind::List,
        description: "Provide multiple detailed reasons explaining why the website might be considered under \
            maintenance, unavailable, unresponsive, or unreachable",
    },
    SchemaField {
        name: "under_maintenance",
        kind: FieldKind::Literal(TRUE_FALSE),
        description: "Is the website currently under maintenance, unavailable, unresponsive or unreachable? \
            Return 'true' or 'false'",
    },
    SchemaField {
        name: "early_access_explanation",
        kind: FieldKind::List,
        description: "Provide multiple detailed reasons explaining why the website might be considered in early \
            access mode, such as showing a coming soon page or being in beta",
    },
    SchemaField {
        name: "early_access",
        kind: FieldKind::Literal(TRUE_FALSE_UNKNOWN),
        description: "Is the website in early access mode, for example it shows a coming soon page or a beta? \
            Return 'true', 'false', or 'unknown' if you cannot determine",
    },
    SchemaField {
        name: "language",
        kind: FieldKind::Text,
        description: "What is the primary language of the website? (e.g., 'en' for English)",
    },
    SchemaField {
        name: "capital_intensive_business_explanation",
        kind: FieldKind::List,
        description: "Provide multiple detailed reasons explaining whether the company operates in a \
            capital-intensive industry that requires significant investment in physical assets, R&D facilities, \
            or laboratory infrastructure. Consider industries like manufacturing, mining, infrastructure, \
            scientific breakthroughs, chemistry, pharmaceuticals, biotech, and drug development as capital intensive",
    },
    SchemaField {
        name: "capital_intensive_business",
        kind: FieldKind::Literal(TRUE_FALSE_UNKNOWN),
        description: "Does the company operate in a capital-intensive industry that requires significant investment \
            in physical assets, R&D facilities, or laboratory infrastructure? This includes manufacturing, mining, \
            infrastructure, scientific breakthroughs, chemistry, pharmaceuticals, biotech, and drug development. \
            Return 'true', 'false', or 'unknown' if you cannot determine",
    },
    SchemaField {
        name: "people_based_service_explanation",
        kind: FieldKind::List,
        description: "Provide multiple detailed reasons explaining whether the company's product is primarily based \
            on human skills, expertise, or personal services rather than manufactured goods or software",
    },
    SchemaField {
        name: "people_based_service",
        kind: FieldKind::Literal(TRUE_FALSE_UNKNOWN),
        description: "Identify companies where the product IS the people - businesses selling professional judgment, \
            skills, or personal service rather than manufactured goods or software. \
            Return 'true', 'false', or 'unknown' if you cannot determine",
    },
    SchemaField {
        name: "product_category_explanation",
        kind: FieldKind::List,
        description: "Provide multiple detailed reasons explaining the company's primary product category based on \
            their business model and target market",
    },
    SchemaField {
        name: "product_category",
        kind: FieldKind::Literal(PRODUCT_CATEGORIES),
        description: "What is the company's primary product category? Return 'non-profit' for non-profit \
            organizations, 'B2B' for business-to-business, 'B2C' for business-to-consumer, 'SMB' for small and \
            medium business focused, or 'unknown' if you cannot determine",
    },
    SchemaField {
        name: "operation_country",
        kind: FieldKind::List,
        description: "List the countries where the company operates. Return a list of country names in ISO code, \
            or ['unknown'] if you cannot determine",
    },
    SchemaField {
        name: "main_product_type_explanation",
        kind: FieldKind::List,
        description: "Provide multiple detailed reasons explaining what the main type of product or service offered \
            by the company is",
    },
    SchemaField {
        name: "main_product_type",
        kind: FieldKind::Text,
        description: "What is the main type of product or service offered by the company? Return a description such \
            as 'SaaS platform', 'mobile application', 'consulting services', 'hardware device', or 'unknown' if you \
            cannot determine",
    },
    SchemaField {
        name: "pricing_information",
        kind: FieldKind::Text,
        description: "How is the product priced, and what are the different pricing options available? Return a \
            detailed description of pricing tiers, models, or 'unknown' if pricing information is not available",
    },
    SchemaField {
        name: "industries",
        kind: FieldKind::List,
        description: "List the industries or product delivery methods the company operates, use NAICS codes (e.g., \
            platform, API, mobile app, web app, plugin, extension, etc.)",
    },
    SchemaField {
        name: "key_features",
        kind: FieldKind::List,
        description: "List the key features or functionalities of the product/service",
    },
    SchemaField {
        name: "used_by",
        kind: FieldKind::List,
        description: "List notable companies or clients using the product/service, if mentioned on the website. \
            Return empty list if not mentioned",
    },
    SchemaField {
        name: "number_of_employees",
        kind: FieldKind::Text,
        description: "How many people are listed as working at the company? Return a number, range like \
            '0-9','10-50','50-200', '200+', or 'unknown' if not mentioned",
    },
    SchemaField {
        name: "featured_in",
        kind: FieldKind::List,
        description: "List media outlets or publications where the company has been featured, usually found in \
            'As seen in' or 'Featured in' sections. Return empty list if not mentioned",
    },
    SchemaField {
        name: "press_releases",
        kind: FieldKind::List,
        description: "List any press releases produced by the company itself. Return empty list if not found",
    },
    SchemaField {
        name: "backing_funds",
        kind: FieldKind::List,
        description: "List venture capital firms, investors, or funds backing the company with money. Return empty \
            list if not mentioned",
    },
    SchemaField {
        name: "patents",
        kind: FieldKind::Text,
        description: "How many patents does the company hold, if mentioned on the website? Return a number or \
            'unknown'",
    },
    SchemaField {
        name: "customers_served",
        kind: FieldKind::Text,
        description: "How many units/customers has the company served, if mentioned? Return a description like \
            '10,000+ customers', '5M users', or 'unknown'",
    },
    SchemaField {
        name: "competitors",
        kind: FieldKind::List,
        description: "List competitors mentioned on the website. Return empty list if not mentioned",
    },
    SchemaField {
        name: "conferences",
        kind: FieldKind::List,
        description: "List past or future conference attendance or participation mentioned on the website. Include \
            conference names and dates if available. Return empty list if not mentioned",
    },
];

/// Legacy ground-truth column names and the feature each one feeds
pub const GT_FIELD_MAP: &[(&str, &str)] = &[
    ("is_working", "under_maintenance"),
    ("is_launched", "early_access"),
    ("is_capital_intensive", "capital_intensive_business"),
    ("is_people_based_service", "people_based_service"),
    ("language", "language"),
    ("operation_country", "operation_country"),
    ("main_product_type", "main_product_type"),
    ("pricing_information", "pricing_information"),
    ("industries", "industries"),
    ("key_features", "key_features"),
    ("product_category", "product_category"),
    ("used_by", "used_by"),
    ("number_of_employees", "number_of_employees"),
    ("Featured_in", "featured_in"),
    ("Press_releases", "press_releases"),
    ("backing_funds", "backing_funds"),
    ("Patents", "patents"),
    ("customers_served", "customers_served"),
    ("Competitors", "competitors"),
    ("conferences_attendance", "conferences"),
];

/// Features whose legacy ground-truth column means the opposite
///
/// `is_working = yes` means `under_maintenance = false`.
pub const GT_INVERTED_BOOLEANS: &[&str] = &["under_maintenance", "early_access"];

/// Scored features in schema order
pub fn features() -> impl Iterator<Item = &'static SchemaField> {
    SCHEMA.iter().filter(|field| field.is_feature())
}

/// Scored feature names in schema order
pub fn feature_names() -> Vec<&'static str> {
    features().map(|field| field.name).collect()
}

/// Looks up the comparison type of a scored feature
pub fn feature_type(name: &str) -> Option<FeatureType> {
    features()
        .find(|field| field.name == name)
        .map(SchemaField::feature_type)
}

/// JSON Schema of the whole extraction object, used as a tool input schema
pub fn json_schema() -> Value {
    let mut properties = Map::new();
    for field in SCHEMA {
        let property = match field.kind {
            FieldKind::Text => json!({ "type": "string", "description": field.description }),
            FieldKind::List => json!({
                "type": "array",
                "items": { "type": "string" },
                "description": field.description,
            }),
            FieldKind::Literal(values) => json!({
                "type": "string",
                "enum": values,
                "description": field.description,
            }),
        };
        properties.insert(field.name.to_string(), property);
    }

    let required: Vec<&str> = SCHEMA.iter().map(|field| field.name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
