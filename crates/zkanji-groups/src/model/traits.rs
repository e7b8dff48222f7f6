//! Row flags and the notifications a group model sends its views.

use zkanji_core::Signal;

use super::index::ModelIndex;
use super::role::ItemRole;

/// What a view may do with a row.
///
/// Categories accept drops, groups never have children, and placeholder rows
/// can only be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemFlags {
    pub enabled: bool,
    pub selectable: bool,
    pub editable: bool,
    pub drag_enabled: bool,
    pub drop_enabled: bool,
    pub checkable: bool,
    /// The checkbox has a partial state.
    pub tristate: bool,
    pub never_has_children: bool,
}

macro_rules! flag_setters {
    ($($(#[$doc:meta])* $setter:ident => $field:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $setter(self, on: bool) -> Self {
                Self { $field: on, ..self }
            }
        )*
    };
}

impl ItemFlags {
    /// An enabled row that can be selected.
    pub fn new() -> Self {
        Self {
            enabled: true,
            selectable: true,
            ..Self::default()
        }
    }

    /// [`new`](Self::new), renamable in place.
    pub fn editable() -> Self {
        Self::new().with_editable(true)
    }

    flag_setters! {
        with_editable => editable;
        with_checkable => checkable;
        with_tristate => tristate;
        with_drag => drag_enabled;
        with_drop => drop_enabled;
        /// Marks a leaf row.
        with_never_has_children => never_has_children;
    }
}

/// `(parent, first row, last row)`, both rows inclusive.
pub type RowSpan = (ModelIndex, usize, usize);

/// `(source parent, first, last, destination parent, destination row)`.
///
/// The destination row counts rows before the moved block is taken out.
pub type RowMove = (ModelIndex, usize, usize, ModelIndex, usize);

/// `(first index, last index, roles)`. An empty role list means any role.
pub type DataSpan = (ModelIndex, ModelIndex, Vec<ItemRole>);

/// Notifications of a tree model.
///
/// Structural changes come in pairs: the `*_about_to_*` signal fires while
/// the old rows are still in place, the other one after the model changed.
#[derive(Default)]
pub struct ModelSignals {
    pub rows_about_to_be_inserted: Signal<RowSpan>,
    pub rows_inserted: Signal<RowSpan>,
    pub rows_about_to_be_removed: Signal<RowSpan>,
    pub rows_removed: Signal<RowSpan>,
    pub rows_about_to_be_moved: Signal<RowMove>,
    pub rows_moved: Signal<RowMove>,
    pub data_changed: Signal<DataSpan>,
    /// Rows are about to be rearranged in a way the row signals cannot
    /// describe, such as several separate blocks moving at once.
    pub layout_about_to_change: Signal<()>,
    pub layout_changed: Signal<()>,
    pub model_about_to_reset: Signal<()>,
    pub model_reset: Signal<()>,
}

impl ModelSignals {
    pub fn new() -> Self {
        Self::default()
    }

    fn bracket<A: Clone + 'static>(
        before: &Signal<A>,
        after: &Signal<A>,
        args: A,
        change: impl FnOnce(),
    ) {
        before.emit(args.clone());
        change();
        after.emit(args);
    }

    /// Announces rows `first..=last` under `parent` around `insert`.
    pub fn emit_rows_inserted<F: FnOnce()>(
        &self,
        parent: ModelIndex,
        first: usize,
        last: usize,
        insert: F,
    ) {
        Self::bracket(
            &self.rows_about_to_be_inserted,
            &self.rows_inserted,
            (parent, first, last),
            insert,
        );
    }

    /// Announces the removal of rows `first..=last` under `parent` around
    /// `remove`.
    pub fn emit_rows_removed<F: FnOnce()>(
        &self,
        parent: ModelIndex,
        first: usize,
        last: usize,
        remove: F,
    ) {
        Self::bracket(
            &self.rows_about_to_be_removed,
            &self.rows_removed,
            (parent, first, last),
            remove,
        );
    }

    /// Announces one contiguous block moving to `(dest, dest_row)`.
    pub fn emit_rows_moved<F: FnOnce()>(
        &self,
        (src, first, last): RowSpan,
        (dest, dest_row): (ModelIndex, usize),
        apply: F,
    ) {
        Self::bracket(
            &self.rows_about_to_be_moved,
            &self.rows_moved,
            (src, first, last, dest, dest_row),
            apply,
        );
    }

    pub fn emit_data_changed_single(&self, index: ModelIndex, roles: Vec<ItemRole>) {
        self.data_changed.emit((index.clone(), index, roles));
    }

    pub fn emit_layout_changed<F: FnOnce()>(&self, rearrange: F) {
        Self::bracket(&self.layout_about_to_change, &self.layout_changed, (), rearrange);
    }

    pub fn emit_reset<F: FnOnce()>(&self, reset: F) {
        Self::bracket(&self.model_about_to_reset, &self.model_reset, (), reset);
    }
}
