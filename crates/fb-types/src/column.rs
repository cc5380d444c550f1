//! Column descriptors and vendor type mapping.

use std::fmt;

/// `SQL_VARYING`.
pub const SQL_VARYING: i16 = 448;
/// `SQL_TEXT`.
pub const SQL_TEXT: i16 = 452;
/// `SQL_DOUBLE`.
pub const SQL_DOUBLE: i16 = 480;
/// `SQL_FLOAT`.
pub const SQL_FLOAT: i16 = 482;
/// `SQL_LONG`.
pub const SQL_LONG: i16 = 496;
/// `SQL_SHORT`.
pub const SQL_SHORT: i16 = 500;
/// `SQL_TIMESTAMP`.
pub const SQL_TIMESTAMP: i16 = 510;
/// `SQL_BLOB`.
pub const SQL_BLOB: i16 = 520;
/// `SQL_TYPE_TIME`.
pub const SQL_TYPE_TIME: i16 = 560;
/// `SQL_TYPE_DATE`.
pub const SQL_TYPE_DATE: i16 = 570;
/// `SQL_INT64`.
pub const SQL_INT64: i16 = 580;
/// `SQL_BOOLEAN`.
pub const SQL_BOOLEAN: i16 = 32764;

/// Logical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColumnType {
    /// BOOLEAN.
    Boolean,
    /// BLOB of any subtype.
    Blob,
    /// DATE.
    Date,
    /// DOUBLE PRECISION.
    Double,
    /// FLOAT.
    Float,
    /// 64-bit integer.
    Int64,
    /// 32-bit integer.
    Integer,
    /// 16-bit integer.
    SmallInt,
    /// NUMERIC(p, s).
    Numeric,
    /// DECIMAL(p, s).
    Decimal,
    /// Fixed-length character data.
    Char,
    /// TIME.
    Time,
    /// TIMESTAMP.
    Timestamp,
    /// Variable-length character data.
    VarChar,
    /// Any type this client does not map.
    Unknown,
}

impl ColumnType {
    /// Map a vendor `sqltype`/`sqlsubtype` pair.
    ///
    /// The low bit of `sqltype` is the nullable flag and is ignored.
    /// Integer types with subtype 1 are NUMERIC, with subtype 2 DECIMAL.
    #[must_use]
    pub fn from_sql_type(sql_type: i16, sub_type: i16) -> Self {
        let scaled = |plain: Self| match sub_type {
            0 => plain,
            1 => Self::Numeric,
            2 => Self::Decimal,
            _ => Self::Unknown,
        };

        match sql_type & !1 {
            SQL_BOOLEAN => Self::Boolean,
            SQL_BLOB => Self::Blob,
            SQL_TYPE_DATE => Self::Date,
            SQL_DOUBLE => Self::Double,
            SQL_FLOAT => Self::Float,
            SQL_INT64 => scaled(Self::Int64),
            SQL_LONG => scaled(Self::Integer),
            SQL_SHORT => scaled(Self::SmallInt),
            SQL_TEXT => Self::Char,
            SQL_TYPE_TIME => Self::Time,
            SQL_TIMESTAMP => Self::Timestamp,
            SQL_VARYING => Self::VarChar,
            _ => Self::Unknown,
        }
    }

    /// Upper-case type name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Blob => "BLOB",
            Self::Date => "DATE",
            Self::Double => "DOUBLE",
            Self::Float => "FLOAT",
            Self::Int64 => "INT64",
            Self::Integer => "INTEGER",
            Self::SmallInt => "SMALLINT",
            Self::Numeric => "NUMERIC",
            Self::Decimal => "DECIMAL",
            Self::Char => "CHAR",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::VarChar => "VARCHAR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Description of one output column of a prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ColumnDesc {
    /// Column name in its relation.
    pub name: String,
    /// Alias given in the select list (equals the name when none was given).
    pub alias: String,
    /// Owning relation, empty for expressions.
    pub relation: String,
    /// Raw vendor `sqltype`.
    pub sql_type: i16,
    /// Raw vendor `sqlsubtype`.
    pub sub_type: i16,
    /// Scale for exact numerics.
    pub scale: i16,
    /// Length in bytes.
    pub length: i16,
}

impl ColumnDesc {
    /// Create a descriptor with name and alias set to `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: i16) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            relation: String::new(),
            sql_type,
            sub_type: 0,
            scale: 0,
            length: 0,
        }
    }

    /// Set the alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Set the relation.
    #[must_use]
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }

    /// Set subtype and scale.
    #[must_use]
    pub fn with_sub_type(mut self, sub_type: i16, scale: i16) -> Self {
        self.sub_type = sub_type;
        self.scale = scale;
        self
    }

    /// Set the length.
    #[must_use]
    pub fn with_length(mut self, length: i16) -> Self {
        self.length = length;
        self
    }

    /// Logical column type.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        ColumnType::from_sql_type(self.sql_type, self.sub_type)
    }

    /// Whether the column accepts NULL.
    #[must_use]
    pub fn nullable(&self) -> bool {
        self.sql_type & 1 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_types() {
        assert_eq!(ColumnType::from_sql_type(SQL_VARYING, 0), ColumnType::VarChar);
        assert_eq!(ColumnType::from_sql_type(SQL_TEXT + 1, 0), ColumnType::Char);
        assert_eq!(ColumnType::from_sql_type(SQL_BOOLEAN, 0), ColumnType::Boolean);
        assert_eq!(ColumnType::from_sql_type(SQL_BLOB, 1), ColumnType::Blob);
        assert_eq!(ColumnType::from_sql_type(SQL_TYPE_DATE, 0), ColumnType::Date);
        assert_eq!(ColumnType::from_sql_type(SQL_TIMESTAMP, 0), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_sql_type(12, 0), ColumnType::Unknown);
    }

    #[test]
    fn test_scaled_integer_types() {
        assert_eq!(ColumnType::from_sql_type(SQL_LONG, 0), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type(SQL_LONG, 1), ColumnType::Numeric);
        assert_eq!(ColumnType::from_sql_type(SQL_SHORT, 2), ColumnType::Decimal);
        assert_eq!(ColumnType::from_sql_type(SQL_INT64, 0), ColumnType::Int64);
        assert_eq!(ColumnType::from_sql_type(SQL_INT64, 7), ColumnType::Unknown);
    }

    #[test]
    fn test_descriptor() {
        let col = ColumnDesc::new("EMP_NO", SQL_SHORT + 1).with_alias("ID");
        assert_eq!(col.name, "EMP_NO");
        assert_eq!(col.alias, "ID");
        assert!(col.nullable());
        assert_eq!(col.column_type().to_string(), "SMALLINT");
    }
}
