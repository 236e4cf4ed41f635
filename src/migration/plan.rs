//! `AlterationPlan` - what differs between two column definitions

use crate::schema::ColumnDefinition;

/// Normalized storage type: uppercase, single spaces, no space before `(` or after `,`
fn normalize_type(storage_type: &str) -> String {
    let collapsed = storage_type.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_uppercase().replace(" (", "(").replace(", ", ",")
}

/// Whether two definitions carry the same storage type, ignoring case and spacing
pub fn same_storage_type(old: &ColumnDefinition, new: &ColumnDefinition) -> bool {
    match (old.resolved_type(), new.resolved_type()) {
        (Some(a), Some(b)) => normalize_type(a) == normalize_type(b),
        (None, None) => true,
        _ => false,
    }
}

/// Independent structural differences between an old and a new column definition
///
/// An identity column and a plain column of the same storage type count as
/// a data type change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlterationPlan {
    pub data_type: bool,
    pub name: bool,
    pub nullable: bool,
    pub default: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub index: bool,
    pub check: bool,
    /// The type change can't be done in place; the column is rebuilt
    pub remake: bool,
    /// Foreign keys in other tables pointing at the column must be recreated
    pub rebuild_incoming_fks: bool,
}

impl AlterationPlan {
    pub fn diff(old: &ColumnDefinition, new: &ColumnDefinition) -> Self {
        let data_type = !same_storage_type(old, new) || old.auto_increment != new.auto_increment;
        let name = old.name != new.name;

        // Dropping the identity property of an integer column is legal in place
        let identity_to_integer = old.auto_increment && !new.auto_increment && new.is_integer();
        let remake = data_type
            && (old.is_large_text() || new.is_large_text() || (old.auto_increment && !identity_to_integer));

        Self {
            data_type,
            name,
            nullable: old.nullable != new.nullable,
            default: old.default != new.default,
            primary_key: old.primary_key != new.primary_key,
            unique: old.unique != new.unique,
            index: old.indexed != new.indexed,
            check: old.check != new.check,
            remake,
            rebuild_incoming_fks: old.primary_key && new.primary_key && (data_type || name),
        }
    }

    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}
