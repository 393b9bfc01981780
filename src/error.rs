use crate::catalog::Section;

/// Why a (segment, category) pair could not be resolved to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("unknown section for route segment '{segment}'")]
    UnknownSection { segment: String },

    #[error("category '{category}' not found in {section}")]
    CategoryNotFound { section: Section, category: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let e = SelectError::UnknownSection { segment: "foo".into() };
        assert_eq!(e.to_string(), "unknown section for route segment 'foo'");

        let e = SelectError::CategoryNotFound { section: Section::Series, category: "Westerns".into() };
        assert_eq!(e.to_string(), "category 'Westerns' not found in series");
    }
}
