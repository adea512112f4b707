//! Declarative entity descriptors
//!
//! An [`EntitySpec`] is everything the generic dispatcher needs to know
//! about a table: which parameters map to which columns, what each
//! operation requires, how rows are shaped on the way out, and the DDL and
//! seed rows used at startup.

use crate::dialect::Dialect;
use crate::params::ParamBag;
use crate::value::ValueKind;

/// A request parameter bound to a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Parameter name in the tool call
    pub param: &'static str,
    /// Column name in the table
    pub column: &'static str,
    pub kind: ValueKind,
    pub required: bool,
}

impl Field {
    pub const fn required(param: &'static str, column: &'static str, kind: ValueKind) -> Self {
        Self {
            param,
            column,
            kind,
            required: true,
        }
    }

    pub const fn optional(param: &'static str, column: &'static str, kind: ValueKind) -> Self {
        Self {
            param,
            column,
            kind,
            required: false,
        }
    }
}

/// One column of a fetched row, in projection order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputColumn {
    /// Key used in the row record
    pub name: &'static str,
    pub kind: ValueKind,
    /// Nullable text renders as "" instead of null
    pub nullable: bool,
}

impl OutputColumn {
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }
}

/// Static description of a CRUD-able table
pub struct EntitySpec {
    /// Singular name used in result messages, e.g. "Customer"
    pub label: &'static str,
    pub table: &'static str,
    /// Surrogate key; also the `read` ordering column
    pub key: Field,
    /// Parameter quoted in the `create` confirmation
    pub display: &'static str,
    /// `read` projection, in order
    pub columns: &'static [OutputColumn],
    /// Inserted by `create`; optional fields bind NULL when absent
    pub create: &'static [Field],
    /// The single column `update` changes
    pub update: Field,
    /// Alternate `delete` key, used only when the id is absent
    pub alternate_key: Option<Field>,
    /// Drop-and-create statements for the demonstration table
    pub ddl: fn(Dialect) -> &'static [&'static str],
    /// Rows inserted after the table is recreated
    pub seed: fn() -> Vec<ParamBag>,
}

impl EntitySpec {
    /// Names of the required `create` parameters, in declaration order
    pub fn required_create_params(&self) -> Vec<&'static str> {
        self.create
            .iter()
            .filter(|f| f.required)
            .map(|f| f.param)
            .collect()
    }
}

impl std::fmt::Debug for EntitySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySpec")
            .field("label", &self.label)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
