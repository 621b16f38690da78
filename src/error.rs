/*!
Error types reported when building a grammar or mutating a match.

Runtime mismatches are *not* errors: they are reported as
[`MatchFailure`](crate::pattern::MatchFailure) values and never
propagate as panics. The types in this module cover the two places
where a bug in the *caller's* code surfaces synchronously: grammar
construction and match mutation.
*/

use std::fmt;

/// An error that occurred while building a matcher or compiling a
/// template string into one.
///
/// Build errors always indicate a defect in the grammar itself (a bad
/// slot name, an unanchored hole, a malformed regex) and are reported
/// eagerly, before any input is matched.
#[derive(Clone, Debug)]
pub struct BuildError(Box<BuildErrorKind>);

/// The underlying kind of a [`BuildError`].
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum BuildErrorKind {
    /// A `${` slot opening in a template was never closed.
    UnterminatedSlot {
        /// The byte offset of the `${` in the template.
        offset: usize,
    },
    /// A slot or step name is not identifier-like, or uses a reserved
    /// `$` prefix.
    InvalidName {
        /// The offending name.
        name: String,
    },
    /// The same slot name was bound twice.
    DuplicateName {
        /// The repeated name.
        name: String,
    },
    /// A veto step was declared with a name that does not begin with
    /// `_`. Veto steps are internal by definition and must use the
    /// internal naming convention.
    VetoName {
        /// The offending name.
        name: String,
    },
    /// Two undefined slots appeared with nothing between them to
    /// anchor where one ends and the next begins.
    AdjacentUndefinedSlots {
        /// The first of the two slot names.
        first: String,
        /// The second of the two slot names.
        second: String,
    },
    /// An undefined slot appeared at the end of a template with no
    /// following anchor and no `terminator` configured.
    UnanchoredSlot {
        /// The slot name.
        name: String,
    },
    /// A definition was supplied for a name that never appears in the
    /// template.
    UnusedDefinition {
        /// The name that was defined but never referenced.
        name: String,
    },
    /// A regular expression failed to compile.
    Regex {
        /// The pattern that failed.
        pattern: String,
        /// The underlying error from the regex engine.
        error: regex::Error,
    },
    /// A concatenation was declared with no matcher steps at all.
    NoSteps {
        /// The identifier of the empty concatenation.
        id: String,
    },
}

impl BuildError {
    /// Create a new error value with the given kind.
    pub fn new(kind: BuildErrorKind) -> BuildError {
        BuildError(Box::new(kind))
    }

    /// Returns a reference to the underlying error kind.
    pub fn kind(&self) -> &BuildErrorKind {
        &self.0
    }

    pub(crate) fn unterminated_slot(offset: usize) -> BuildError {
        BuildError::new(BuildErrorKind::UnterminatedSlot { offset })
    }

    pub(crate) fn invalid_name(name: &str) -> BuildError {
        BuildError::new(BuildErrorKind::InvalidName { name: name.to_string() })
    }

    pub(crate) fn duplicate_name(name: &str) -> BuildError {
        BuildError::new(BuildErrorKind::DuplicateName {
            name: name.to_string(),
        })
    }

    pub(crate) fn veto_name(name: &str) -> BuildError {
        BuildError::new(BuildErrorKind::VetoName { name: name.to_string() })
    }

    pub(crate) fn adjacent_undefined_slots(
        first: &str,
        second: &str,
    ) -> BuildError {
        BuildError::new(BuildErrorKind::AdjacentUndefinedSlots {
            first: first.to_string(),
            second: second.to_string(),
        })
    }

    pub(crate) fn unanchored_slot(name: &str) -> BuildError {
        BuildError::new(BuildErrorKind::UnanchoredSlot {
            name: name.to_string(),
        })
    }

    pub(crate) fn unused_definition(name: &str) -> BuildError {
        BuildError::new(BuildErrorKind::UnusedDefinition {
            name: name.to_string(),
        })
    }

    pub(crate) fn regex(pattern: &str, error: regex::Error) -> BuildError {
        BuildError::new(BuildErrorKind::Regex {
            pattern: pattern.to_string(),
            error,
        })
    }

    pub(crate) fn no_steps(id: &str) -> BuildError {
        BuildError::new(BuildErrorKind::NoSteps { id: id.to_string() })
    }
}

impl std::error::Error for BuildError {}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.kind() {
            BuildErrorKind::UnterminatedSlot { offset } => {
                write!(f, "unterminated ${{ slot opened at offset {}", offset)
            }
            BuildErrorKind::InvalidName { ref name } => {
                write!(f, "'{}' is not a valid slot or step name", name)
            }
            BuildErrorKind::DuplicateName { ref name } => {
                write!(f, "the name '{}' is bound more than once", name)
            }
            BuildErrorKind::VetoName { ref name } => {
                write!(
                    f,
                    "veto step '{}' must use a name beginning with '_'",
                    name,
                )
            }
            BuildErrorKind::AdjacentUndefinedSlots {
                ref first,
                ref second,
            } => {
                write!(
                    f,
                    "undefined slots '{}' and '{}' are adjacent: \
                     separate them with a literal or a defined matcher",
                    first, second,
                )
            }
            BuildErrorKind::UnanchoredSlot { ref name } => {
                write!(
                    f,
                    "undefined slot '{}' has nothing following to anchor \
                     it: supply a matcher or a terminator",
                    name,
                )
            }
            BuildErrorKind::UnusedDefinition { ref name } => {
                write!(
                    f,
                    "a matcher was defined for '{}' but the template \
                     contains no such slot",
                    name,
                )
            }
            BuildErrorKind::Regex { ref pattern, ref error } => {
                write!(f, "failed to compile /{}/: {}", pattern, error)
            }
            BuildErrorKind::NoSteps { ref id } => {
                write!(f, "concatenation '{}' has no matcher steps", id)
            }
        }
    }
}

/// An error raised while mutating a match through an update overlay.
///
/// These are synchronous usage errors: assigning to something that is
/// not assignable, using an overlay after a parent assignment
/// invalidated it, or recording edits whose spans partially overlap.
#[derive(Clone, Debug)]
pub struct UpdateError(Box<UpdateErrorKind>);

/// The underlying kind of an [`UpdateError`].
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum UpdateErrorKind {
    /// The named slot does not exist on the match being updated.
    NoSuchSlot {
        /// The name that was looked up.
        name: String,
    },
    /// The named slot is a computed slot. Computed slots have no span
    /// in the input and cannot be assigned.
    ComputedSlot {
        /// The computed slot's name.
        name: String,
    },
    /// The overlay was invalidated by an assignment to a parent slot.
    Invalidated {
        /// The identifier of the match whose overlay was used.
        matcher_id: String,
    },
    /// The named slot is not a nested tree, so no child overlay can be
    /// derived from it.
    NotATree {
        /// The name that was looked up.
        name: String,
    },
    /// An edit's span partially overlaps an edit already recorded.
    OverlappingEdit {
        /// The start offset of the rejected edit.
        start: usize,
        /// The end offset of the rejected edit.
        end: usize,
    },
}

impl UpdateError {
    /// Create a new error value with the given kind.
    pub fn new(kind: UpdateErrorKind) -> UpdateError {
        UpdateError(Box::new(kind))
    }

    /// Returns a reference to the underlying error kind.
    pub fn kind(&self) -> &UpdateErrorKind {
        &self.0
    }

    pub(crate) fn no_such_slot(name: &str) -> UpdateError {
        UpdateError::new(UpdateErrorKind::NoSuchSlot {
            name: name.to_string(),
        })
    }

    pub(crate) fn computed_slot(name: &str) -> UpdateError {
        UpdateError::new(UpdateErrorKind::ComputedSlot {
            name: name.to_string(),
        })
    }

    pub(crate) fn invalidated(matcher_id: &str) -> UpdateError {
        UpdateError::new(UpdateErrorKind::Invalidated {
            matcher_id: matcher_id.to_string(),
        })
    }

    pub(crate) fn not_a_tree(name: &str) -> UpdateError {
        UpdateError::new(UpdateErrorKind::NotATree {
            name: name.to_string(),
        })
    }

    pub(crate) fn overlapping_edit(start: usize, end: usize) -> UpdateError {
        UpdateError::new(UpdateErrorKind::OverlappingEdit { start, end })
    }
}

impl std::error::Error for UpdateError {}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.kind() {
            UpdateErrorKind::NoSuchSlot { ref name } => {
                write!(f, "no slot named '{}' on this match", name)
            }
            UpdateErrorKind::ComputedSlot { ref name } => {
                write!(
                    f,
                    "slot '{}' is computed and has no span to assign to",
                    name,
                )
            }
            UpdateErrorKind::Invalidated { ref matcher_id } => {
                write!(
                    f,
                    "overlay for '{}' was invalidated by a parent change",
                    matcher_id,
                )
            }
            UpdateErrorKind::NotATree { ref name } => {
                write!(f, "slot '{}' is not a nested match", name)
            }
            UpdateErrorKind::OverlappingEdit { start, end } => {
                write!(
                    f,
                    "edit at [{}, {}) overlaps an edit already recorded",
                    start, end,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Build and update errors ride inside Result payloads all over the
    // public API, so keep them pointer-sized.
    #[test]
    fn error_sizes() {
        assert_eq!(
            core::mem::size_of::<usize>(),
            core::mem::size_of::<BuildError>()
        );
        assert_eq!(
            core::mem::size_of::<usize>(),
            core::mem::size_of::<UpdateError>()
        );
    }
}
