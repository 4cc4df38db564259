use crate::errors::SyncError;
use crate::models::schema::{ColumnSchema, ColumnType};

/// One column row as the catalog reports it, before canonicalization.
#[derive(Debug, Clone)]
pub struct RawColumn {
    pub name: String,
    pub data_type: String,
    pub max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub ordinal: i32,
}

/// Maps native catalog metadata onto the canonical column model.
///
/// Unknown native types are not an error: they pass through as
/// [`ColumnType::Other`] with a warning, so a schema using an unmapped type
/// still round-trips. Only an empty native type is rejected.
#[derive(Debug, Clone)]
pub struct TypeMapper {
    numeric_precision: u32,
    numeric_scale: u32,
}

impl Default for TypeMapper {
    fn default() -> Self {
        TypeMapper::new(12, 2)
    }
}

impl TypeMapper {
    /// `precision` and `scale` fill in for NUMERIC columns the catalog
    /// reports without an explicit pair.
    pub fn new(precision: u32, scale: u32) -> Self {
        TypeMapper {
            numeric_precision: precision,
            numeric_scale: scale,
        }
    }

    pub fn map_column(&self, raw: &RawColumn) -> Result<ColumnSchema, SyncError> {
        let ordinal = u32::try_from(raw.ordinal).map_err(|_| {
            SyncError::Inconsistency(format!(
                "column {}: ordinal position {} is not positive",
                raw.name, raw.ordinal
            ))
        })?;

        // A sequence-fed default marks a serial column. The sequence owns the
        // value, so neither the default nor the nullability is recorded.
        if raw.default.as_deref().is_some_and(|d| d.contains("nextval")) {
            return Ok(ColumnSchema {
                name: raw.name.clone(),
                column_type: ColumnType::Serial,
                is_nullable: false,
                default: None,
                ordinal,
            });
        }

        Ok(ColumnSchema {
            name: raw.name.clone(),
            column_type: self.map_type(raw)?,
            is_nullable: raw.is_nullable,
            default: raw.default.as_deref().map(normalize_default),
            ordinal,
        })
    }

    fn map_type(&self, raw: &RawColumn) -> Result<ColumnType, SyncError> {
        let native = raw.data_type.trim().to_ascii_lowercase();
        let column_type = match native.as_str() {
            "" => {
                return Err(SyncError::Mapping(format!(
                    "column {} has an empty native type",
                    raw.name
                )))
            }
            "integer" | "int" | "int4" => ColumnType::Integer,
            "character varying" | "varchar" => {
                let len = raw.max_length.filter(|l| *l > 0).unwrap_or(255);
                ColumnType::Varchar(len as u32)
            }
            "text" => ColumnType::Text,
            "numeric" | "decimal" => match (raw.numeric_precision, raw.numeric_scale) {
                (Some(precision), Some(scale)) if precision > 0 && scale >= 0 => {
                    ColumnType::Numeric(precision as u32, scale as u32)
                }
                _ => ColumnType::Numeric(self.numeric_precision, self.numeric_scale),
            },
            "boolean" | "bool" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "time without time zone" | "time" => ColumnType::Time,
            "timestamp without time zone" | "timestamp" => ColumnType::Timestamp,
            "jsonb" => ColumnType::Jsonb,
            other => {
                log::warn!(
                    "column {}: native type {:?} has no canonical form, passing it through",
                    raw.name,
                    other
                );
                ColumnType::Other(raw.data_type.trim().to_ascii_uppercase())
            }
        };
        Ok(column_type)
    }
}

const KEYWORD_DEFAULTS: [&str; 7] = [
    "current_timestamp",
    "current_date",
    "current_time",
    "localtimestamp",
    "true",
    "false",
    "null",
];

/// Normalizes a raw catalog default so the snapshot carries valid SQL.
///
/// Keywords, function calls, parenthesized expressions and numbers stay
/// verbatim. Catalog casts like `'abc'::character varying` shed the cast and
/// keep the quoted literal. Anything left is treated as a bare string and
/// quoted, doubling embedded quotes.
pub fn normalize_default(raw: &str) -> String {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if KEYWORD_DEFAULTS.contains(&lowered.as_str()) || trimmed.ends_with("()") {
        return trimmed.to_string();
    }
    if trimmed.parse::<f64>().is_ok() {
        return trimmed.to_string();
    }

    let body = strip_cast(trimmed);
    if body.starts_with('(') && body.ends_with(')') {
        return body.to_string();
    }
    if body.len() >= 2 && body.starts_with('\'') && body.ends_with('\'') {
        return body.to_string();
    }
    if body.parse::<f64>().is_ok() {
        return body.to_string();
    }
    format!("'{}'", body.replace('\'', "''"))
}

fn strip_cast(s: &str) -> &str {
    match s.rfind("::") {
        Some(pos) => s[..pos].trim_end(),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, data_type: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            data_type: data_type.to_string(),
            max_length: None,
            numeric_precision: None,
            numeric_scale: None,
            is_nullable: true,
            default: None,
            ordinal: 1,
        }
    }

    #[test]
    fn varchar_uses_declared_length() {
        let mut column = raw("name", "character varying");
        column.max_length = Some(100);
        let mapped = TypeMapper::default().map_column(&column).unwrap();
        assert_eq!(mapped.column_type, ColumnType::Varchar(100));
    }

    #[test]
    fn varchar_without_length_falls_back_to_255() {
        let mapped = TypeMapper::default()
            .map_column(&raw("name", "character varying"))
            .unwrap();
        assert_eq!(mapped.column_type, ColumnType::Varchar(255));
    }

    #[test]
    fn numeric_keeps_declared_precision_and_scale() {
        let mut column = raw("qty", "numeric");
        column.numeric_precision = Some(10);
        column.numeric_scale = Some(2);
        let mapped = TypeMapper::default().map_column(&column).unwrap();
        assert_eq!(mapped.column_type, ColumnType::Numeric(10, 2));
    }

    #[test]
    fn numeric_scale_zero_is_kept() {
        let mut column = raw("count", "numeric");
        column.numeric_precision = Some(6);
        column.numeric_scale = Some(0);
        let mapped = TypeMapper::default().map_column(&column).unwrap();
        assert_eq!(mapped.column_type, ColumnType::Numeric(6, 0));
    }

    #[test]
    fn numeric_without_pair_falls_back() {
        let mapped = TypeMapper::default()
            .map_column(&raw("amount", "numeric"))
            .unwrap();
        assert_eq!(mapped.column_type, ColumnType::Numeric(12, 2));
    }

    #[test]
    fn sequence_default_becomes_serial() {
        let mut column = raw("id", "integer");
        column.default = Some("nextval('farmer_id_seq'::regclass)".to_string());
        column.is_nullable = true;
        let mapped = TypeMapper::default().map_column(&column).unwrap();
        assert_eq!(mapped.column_type, ColumnType::Serial);
        assert!(!mapped.is_nullable);
        assert_eq!(mapped.default, None);
    }

    #[test]
    fn unknown_type_passes_through() {
        let mapped = TypeMapper::default()
            .map_column(&raw("created_at", "timestamp with time zone"))
            .unwrap();
        assert_eq!(
            mapped.column_type,
            ColumnType::Other("TIMESTAMP WITH TIME ZONE".to_string())
        );
    }

    #[test]
    fn empty_type_is_rejected() {
        let err = TypeMapper::default()
            .map_column(&raw("ghost", "  "))
            .unwrap_err();
        assert!(matches!(err, SyncError::Mapping(_)));
    }

    #[test]
    fn non_positive_ordinal_is_inconsistent() {
        let mut column = raw("id", "integer");
        column.ordinal = -3;
        let err = TypeMapper::default().map_column(&column).unwrap_err();
        assert!(matches!(err, SyncError::Inconsistency(_)));
    }

    #[test]
    fn keyword_defaults_stay_verbatim() {
        assert_eq!(normalize_default("CURRENT_TIMESTAMP"), "CURRENT_TIMESTAMP");
        assert_eq!(normalize_default("true"), "true");
        assert_eq!(normalize_default("now()"), "now()");
    }

    #[test]
    fn numeric_defaults_stay_verbatim() {
        assert_eq!(normalize_default("0"), "0");
        assert_eq!(normalize_default("8.5"), "8.5");
    }

    #[test]
    fn quoted_default_sheds_catalog_cast() {
        assert_eq!(
            normalize_default("'Maharashtra'::character varying"),
            "'Maharashtra'"
        );
        assert_eq!(normalize_default("'0.00'::numeric"), "'0.00'");
        assert_eq!(normalize_default("0::numeric"), "0");
    }

    #[test]
    fn cast_inside_literal_is_preserved() {
        assert_eq!(normalize_default("'a::b'::text"), "'a::b'");
    }

    #[test]
    fn bare_string_is_quoted_and_escaped() {
        assert_eq!(normalize_default("Pending"), "'Pending'");
        assert_eq!(normalize_default("it's"), "'it''s'");
    }

    #[test]
    fn parenthesized_expression_stays_verbatim() {
        assert_eq!(
            normalize_default("('now'::text)::timestamp"),
            "('now'::text)"
        );
    }
}
