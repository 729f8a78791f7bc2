use crate::store::Record;

/// The ways a picked record can be written into the originating buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// `<URL:url>`
    AngleBracketed,
    /// `url`
    Naked,
    /// `name <URL:url>`
    NamedAngleBracketed,
    /// `name`
    NameOnly,
}

impl InsertMode {
    pub const ALL: [InsertMode; 4] = [
        InsertMode::AngleBracketed,
        InsertMode::Naked,
        InsertMode::NamedAngleBracketed,
        InsertMode::NameOnly,
    ];

    /// Literal substitution; nothing in `name` or `url` is escaped.
    pub fn format(self, record: &Record) -> String {
        match self {
            InsertMode::AngleBracketed => format!("<URL:{}>", record.url),
            InsertMode::Naked => record.url.clone(),
            InsertMode::NamedAngleBracketed => format!("{} <URL:{}>", record.name, record.url),
            InsertMode::NameOnly => record.name.clone(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InsertMode::AngleBracketed => "formatted",
            InsertMode::Naked => "naked",
            InsertMode::NamedAngleBracketed => "named",
            InsertMode::NameOnly => "name-only",
        }
    }
}

impl std::str::FromStr for InsertMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InsertMode::ALL
            .into_iter()
            .find(|mode| mode.label() == s)
            .ok_or_else(|| {
                format!("unknown insert mode `{s}` (expected formatted, naked, named or name-only)")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::InsertMode;
    use crate::store::Record;

    #[test]
    fn formats_follow_the_mode_table() {
        let record = Record::new("The FSF", "http://www.fsf.org/");
        assert_eq!(
            InsertMode::AngleBracketed.format(&record),
            "<URL:http://www.fsf.org/>"
        );
        assert_eq!(InsertMode::Naked.format(&record), "http://www.fsf.org/");
        assert_eq!(
            InsertMode::NamedAngleBracketed.format(&record),
            "The FSF <URL:http://www.fsf.org/>"
        );
        assert_eq!(InsertMode::NameOnly.format(&record), "The FSF");
    }

    #[test]
    fn separator_like_content_is_inserted_verbatim() {
        let record = Record::new("a - b <URL:x>", "http://h/ - <URL:y>");
        assert_eq!(
            InsertMode::AngleBracketed.format(&record),
            "<URL:http://h/ - <URL:y>>"
        );
        assert_eq!(
            InsertMode::NamedAngleBracketed.format(&record),
            "a - b <URL:x> <URL:http://h/ - <URL:y>>"
        );
        assert_eq!(InsertMode::NameOnly.format(&record), "a - b <URL:x>");
    }

    #[test]
    fn empty_fields_format_without_padding() {
        let record = Record::new("", "");
        assert_eq!(InsertMode::AngleBracketed.format(&record), "<URL:>");
        assert_eq!(InsertMode::NamedAngleBracketed.format(&record), " <URL:>");
    }

    #[test]
    fn modes_parse_from_their_labels() {
        for mode in InsertMode::ALL {
            assert_eq!(mode.label().parse::<InsertMode>(), Ok(mode));
        }
        assert!("quoted".parse::<InsertMode>().is_err());
    }
}
