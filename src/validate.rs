//! Pre-search input integrity checks.
//!
//! Detects duplicate ids within each entity table and availability entries
//! naming slots outside the declared grid. Runs before the engine pays any
//! search cost; well-formedness of individual fields is the repository's
//! concern, not the engine's.

use crate::data::SchedulingInput;
use std::collections::HashSet;
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two rows of one table share an id, or the grid repeats a slot.
    DuplicateId,
    /// An availability entry names a slot that is not in the grid.
    UnknownSlot,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            ValidationErrorKind::DuplicateId => "duplicate id",
            ValidationErrorKind::UnknownSlot => "unknown slot",
        };
        write!(f, "[{label}] {}", self.message)
    }
}

/// Validates the entity snapshot for a generation run.
///
/// Checks:
/// 1. No duplicate slot in the declared grid
/// 2. No duplicate id within any entity table
/// 3. Every faculty availability entry names a slot in the grid
///
/// Returns `Ok(())` if all checks pass, `Err(errors)` with all detected
/// issues otherwise.
pub fn validate_input(input: &SchedulingInput) -> ValidationResult {
    let mut errors = Vec::new();

    let mut grid = HashSet::new();
    for slot in &input.slots {
        if !grid.insert(*slot) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("slot {slot} declared twice in the grid"),
            ));
        }
    }

    let mut faculty_ids = HashSet::new();
    for faculty in &input.faculties {
        if !faculty_ids.insert(faculty.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate faculty id: {}", faculty.id),
            ));
        }
    }

    let mut classroom_ids = HashSet::new();
    for classroom in &input.classrooms {
        if !classroom_ids.insert(classroom.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate classroom id: {}", classroom.id),
            ));
        }
    }

    let mut subject_ids = HashSet::new();
    for subject in &input.subjects {
        if !subject_ids.insert(subject.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate subject id: {}", subject.id),
            ));
        }
    }

    let mut batch_ids = HashSet::new();
    for batch in &input.batches {
        if !batch_ids.insert(batch.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate batch id: {}", batch.id),
            ));
        }
    }

    for faculty in &input.faculties {
        for slot in &faculty.availability {
            if !grid.contains(slot) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSlot,
                    format!(
                        "faculty {} availability names {slot}, which is not in the grid",
                        faculty.id
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
