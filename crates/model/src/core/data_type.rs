use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashMap, fmt};

/// Semantic column type as reported by Postgres `format_type`.
///
/// Anything the replicator does not model explicitly is carried verbatim in
/// [`DataType::Custom`] and round-tripped through its text representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Boolean,
    Text,
    VarChar(Option<u32>),
    Char(Option<u32>),
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    Jsonb,
    Bytea,
    Custom(String),
}

lazy_static! {
    static ref POSTGRES_TYPE_MAP: HashMap<&'static str, DataType> = build_postgres_type_map();
}

impl DataType {
    pub fn from_postgres_type(type_name: &str) -> Self {
        let normalized = Self::normalize_type_name(type_name);

        if let Some(known) = POSTGRES_TYPE_MAP.get(normalized.as_str()) {
            return known.clone();
        }

        let (base, modifiers) = match Self::split_modifiers(&normalized) {
            Some(parts) => parts,
            None => return DataType::Custom(type_name.trim().to_string()),
        };

        match (base, modifiers.as_slice()) {
            ("character varying" | "varchar", [len]) => DataType::VarChar(Some(*len)),
            ("character" | "char" | "bpchar", [len]) => DataType::Char(Some(*len)),
            ("numeric" | "decimal", [precision]) => DataType::Numeric {
                precision: Some(*precision),
                scale: Some(0),
            },
            ("numeric" | "decimal", [precision, scale]) => DataType::Numeric {
                precision: Some(*precision),
                scale: Some(*scale),
            },
            _ => DataType::Custom(type_name.trim().to_string()),
        }
    }

    pub fn postgres_name(&self) -> Cow<'_, str> {
        match self {
            DataType::SmallInt => Cow::Borrowed("SMALLINT"),
            DataType::Integer => Cow::Borrowed("INTEGER"),
            DataType::BigInt => Cow::Borrowed("BIGINT"),
            DataType::Real => Cow::Borrowed("REAL"),
            DataType::Double => Cow::Borrowed("DOUBLE PRECISION"),
            DataType::Numeric {
                precision: Some(p),
                scale: Some(s),
            } => Cow::Owned(format!("NUMERIC({p},{s})")),
            DataType::Numeric {
                precision: Some(p),
                scale: None,
            } => Cow::Owned(format!("NUMERIC({p})")),
            DataType::Numeric { .. } => Cow::Borrowed("NUMERIC"),
            DataType::Boolean => Cow::Borrowed("BOOLEAN"),
            DataType::Text => Cow::Borrowed("TEXT"),
            DataType::VarChar(Some(len)) => Cow::Owned(format!("VARCHAR({len})")),
            DataType::VarChar(None) => Cow::Borrowed("VARCHAR"),
            DataType::Char(Some(len)) => Cow::Owned(format!("CHAR({len})")),
            DataType::Char(None) => Cow::Borrowed("CHAR"),
            DataType::Date => Cow::Borrowed("DATE"),
            DataType::Time => Cow::Borrowed("TIME"),
            DataType::Timestamp => Cow::Borrowed("TIMESTAMP"),
            DataType::TimestampTz => Cow::Borrowed("TIMESTAMPTZ"),
            DataType::Uuid => Cow::Borrowed("UUID"),
            DataType::Json => Cow::Borrowed("JSON"),
            DataType::Jsonb => Cow::Borrowed("JSONB"),
            DataType::Bytea => Cow::Borrowed("BYTEA"),
            DataType::Custom(name) => Cow::Borrowed(name),
        }
    }

    /// Types that travel as their canonical text form between source and destination.
    ///
    /// Custom types have no native client representation. Numerics are carried
    /// as text so that values beyond 28 significant digits, and `NaN`, are
    /// copied unchanged.
    pub fn is_text_encoded(&self) -> bool {
        matches!(self, DataType::Custom(_) | DataType::Numeric { .. })
    }

    /// Whether the type can back an identity column.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            DataType::SmallInt | DataType::Integer | DataType::BigInt
        )
    }

    fn normalize_type_name(type_name: &str) -> String {
        type_name.trim().to_lowercase()
    }

    fn split_modifiers(type_name: &str) -> Option<(&str, Vec<u32>)> {
        let open = type_name.find('(')?;
        let close = type_name.rfind(')')?;
        if close != type_name.len() - 1 || close < open {
            return None;
        }

        let base = type_name[..open].trim();
        let modifiers = type_name[open + 1..close]
            .split(',')
            .map(|m| m.trim().parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;

        Some((base, modifiers))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.postgres_name())
    }
}

fn build_postgres_type_map() -> HashMap<&'static str, DataType> {
    use DataType::*;

    let entries = [
        ("smallint", SmallInt),
        ("int2", SmallInt),
        ("integer", Integer),
        ("int", Integer),
        ("int4", Integer),
        ("bigint", BigInt),
        ("int8", BigInt),
        ("real", Real),
        ("float4", Real),
        ("double precision", Double),
        ("float8", Double),
        (
            "numeric",
            Numeric {
                precision: None,
                scale: None,
            },
        ),
        ("boolean", Boolean),
        ("bool", Boolean),
        ("text", Text),
        ("character varying", VarChar(None)),
        ("varchar", VarChar(None)),
        ("character", Char(Some(1))),
        ("bpchar", Char(None)),
        ("date", Date),
        ("time without time zone", Time),
        ("time", Time),
        ("timestamp without time zone", Timestamp),
        ("timestamp", Timestamp),
        ("timestamp with time zone", TimestampTz),
        ("timestamptz", TimestampTz),
        ("uuid", Uuid),
        ("json", Json),
        ("jsonb", Jsonb),
        ("bytea", Bytea),
    ];

    entries.into_iter().collect()
}
