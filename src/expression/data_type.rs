use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ExpressionError, ExpressionResult};

/// SQL types a resolved column can carry. Serialized by name; common
/// aliases such as `int` or `text` are accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Bigint,
    Double,
    Varchar,
    Boolean,
    Date,
    Timestamp,
    Varbinary,
}

impl FromStr for DataType {
    type Err = ExpressionError;

    fn from_str(s: &str) -> ExpressionResult<Self> {
        match s.to_uppercase().as_str() {
            "BIGINT" | "INT" | "INTEGER" => Ok(DataType::Bigint),
            "DOUBLE" | "FLOAT" | "REAL" => Ok(DataType::Double),
            "VARCHAR" | "TEXT" | "STRING" => Ok(DataType::Varchar),
            "BOOLEAN" | "BOOL" => Ok(DataType::Boolean),
            "DATE" => Ok(DataType::Date),
            "TIMESTAMP" => Ok(DataType::Timestamp),
            "VARBINARY" | "BLOB" => Ok(DataType::Varbinary),
            _ => Err(ExpressionError::UnknownType(s.to_string())),
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = ExpressionError;

    fn try_from(name: String) -> ExpressionResult<Self> {
        name.parse()
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bigint => "bigint",
            DataType::Double => "double",
            DataType::Varchar => "varchar",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
            DataType::Varbinary => "varbinary",
        };
        f.write_str(name)
    }
}
