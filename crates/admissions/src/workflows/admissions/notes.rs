use super::domain::AuthoredNote;

/// Validation errors for threaded note input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteValidationError {
    #[error("note body must not be empty")]
    Empty,
}

/// Trimmed, non-empty note text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteBody(String);

impl NoteBody {
    pub fn parse(raw: &str) -> Result<Self, NoteValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NoteValidationError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Display order: newest first. Ties keep their incoming order.
pub fn sort_newest_first(notes: &mut [AuthoredNote]) {
    notes.sort_by(|left, right| right.note.created_at.cmp(&left.note.created_at));
}
