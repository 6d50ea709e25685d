//! Field-level comparison for sync diagnostics

/// Accumulates the names of fields that differ between two records.
///
/// Fields are compared in the order they are passed, so the result follows
/// declaration order when callers list fields that way.
#[derive(Debug, Default)]
pub(crate) struct FieldDiff {
    changed: Vec<&'static str>,
}

impl FieldDiff {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn field<T: PartialEq + ?Sized>(
        mut self,
        name: &'static str,
        ours: &T,
        theirs: &T,
    ) -> Self {
        if ours != theirs {
            self.changed.push(name);
        }
        self
    }

    pub(crate) fn finish(self) -> Vec<&'static str> {
        self.changed
    }
}
