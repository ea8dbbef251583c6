//! Record traits shared by every configuration object kind.

use crate::error::Result;
use crate::identity::CompositeId;
use crate::line::{path_tokens, PathLine};
use crate::parser::FieldTable;
use crate::serializer::LineWriter;

/// A nested, typed configuration record.
///
/// `Default` is the zero value: every optional field unset, every flag off,
/// every list empty.
pub trait ConfigRecord: Default + Sized + 'static {
    /// Check cross-field constraints. Called before any line is written.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Emit this record's lines, parent lines before child blocks.
    fn write_lines(&self, w: &mut LineWriter) -> Result<()>;

    /// Prefix dispatch table used to read this record back.
    fn field_table() -> &'static FieldTable<Self>;

    /// Relative sub-paths owned by other object kinds nested under this one.
    ///
    /// Lines there never make this record present and are not reported as
    /// unrecognized.
    fn foreign_paths() -> &'static [&'static str] {
        &[]
    }
}

/// A top-level object with its own identity and device path.
pub trait ConfigObject: ConfigRecord + Clone {
    /// Short kind name used in logs and commit comments
    const KIND: &'static str;

    /// Device path of the object, without a trailing space.
    fn path_prefix(&self) -> String;

    /// Identity components, in composite-id order.
    fn id_components(&self) -> Vec<String>;

    /// A zero-value record carrying only the identity in `parts`.
    fn from_id_components(parts: &[String]) -> Result<Self>;

    /// Copy identity fields from `other` onto this record.
    fn adopt_identity(&mut self, other: &Self);

    /// True when the record names an object, i.e. it is not the zero value.
    fn is_present(&self) -> bool {
        self.id_components()
            .first()
            .map_or(false, |name| !name.is_empty())
    }

    /// Lines that wipe this object's own attributes at `prefix` before an
    /// update rewrites them. Defaults to deleting the whole prefix.
    fn clear_lines(&self, prefix: &str) -> Result<Vec<PathLine>> {
        Ok(vec![PathLine::delete(path_tokens(prefix)?)])
    }

    /// Composite identifier joined with `separator`.
    fn composite_id(&self, separator: &str) -> Result<CompositeId> {
        CompositeId::new(self.id_components(), separator)
    }

    /// Rebuild an identity-only record from a composite identifier string.
    fn from_composite_id(id: &str, separator: &str) -> Result<Self> {
        let parsed = CompositeId::parse(id, separator)?;
        Self::from_id_components(parsed.components())
    }
}
