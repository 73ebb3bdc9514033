/// Switches that influence how classes are mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Structs nested deeper than this are stored out of line.
    pub max_inline_struct_depth: usize,

    /// Create an index on every relationship foreign-key column.
    pub index_foreign_keys: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_inline_struct_depth: 8,
            index_foreign_keys: true,
        }
    }
}
