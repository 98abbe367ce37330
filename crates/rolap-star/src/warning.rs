/// Category of a non-fatal catalog load problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A snowflake could not be put in canonical form and is joined as declared.
    CanonicalizationSkipped,
    /// Clipping a snowflake at its join level did not apply.
    SnipSkipped,
    /// A level names a table outside the joined tables.
    LevelTableNotFound,
    /// No hierarchy of a dimension has the configured join level.
    UnknownJoinLevel,
    /// The same hierarchy usage was declared twice in one cube.
    DuplicateUsage,
    /// A hierarchy asks for a member reader nobody registered.
    UnknownMemberReader,
}

/// A non-fatal catalog load problem. Loading continued with a fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub(crate) fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Log `message` and record it.
pub(crate) fn warn(warnings: &mut Vec<Warning>, kind: WarningKind, message: String) {
    log::warn!("{message}");
    warnings.push(Warning::new(kind, message));
}
