//! Requested-vs-session sensor projection.
//!
//! A session has a fixed column layout.  A caller may ask for a subset of
//! those columns by address; the answer always follows the session's column
//! order, never the request order.  Selection is a mask indexed by column
//! position, and rows are projected by their own position against that mask.
//!
//! ```text
//!   session columns   [ a ][ b ][ c ]
//!   request           { c, a }
//!   mask              [ 1 ][ 0 ][ 1 ]
//!   row               [ 1.0 ][ 2.0 ][ 3.0 ]  ──▶  [ 1.0 ][ 3.0 ]
//! ```

/// Column mask over a session's layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    mask: Vec<bool>,
}

impl ColumnSelection {
    /// Select every one of `width` columns.
    pub fn all(width: usize) -> Self {
        Self {
            mask: vec![true; width],
        }
    }

    /// Mark every session column whose address appears in `requested`.
    ///
    /// With no request, or a request that matches nothing, every column is
    /// selected.
    pub fn from_request<'a, S, R>(session_addresses: S, requested: Option<R>) -> Self
    where
        S: IntoIterator<Item = &'a str>,
        S::IntoIter: Clone,
        R: IntoIterator<Item = &'a str>,
    {
        let layout = session_addresses.into_iter();
        let width = layout.clone().count();
        let mut mask = vec![false; width];

        if let Some(requested) = requested {
            for wanted in requested {
                for (slot, address) in mask.iter_mut().zip(layout.clone()) {
                    if address == wanted {
                        *slot = true;
                    }
                }
            }
        }

        if mask.iter().any(|&m| m) {
            Self { mask }
        } else {
            Self::all(width)
        }
    }

    /// Number of columns in the layout.
    pub fn width(&self) -> usize {
        self.mask.len()
    }

    pub fn selected_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn is_selected(&self, position: usize) -> bool {
        self.mask.get(position).copied().unwrap_or(false)
    }

    /// Keep the items of `row` at selected positions.
    ///
    /// Alignment is strictly positional: item `i` of the row belongs to
    /// column `i`.  Items beyond the layout are never selected; a short row
    /// simply yields fewer items.
    pub fn project<'r, T>(&'r self, row: &'r [T]) -> impl Iterator<Item = &'r T> + 'r {
        row.iter()
            .enumerate()
            .filter(|(position, _)| self.is_selected(*position))
            .map(|(_, item)| item)
    }
}
