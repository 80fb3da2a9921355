use core::{
    error::Error,
    fmt::{self, Display, Formatter},
};
use nom_locate::LocatedSpan;

const SNIPPET_LENGTH: usize = 24;

/// A parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
    offset: usize,
}

impl ParseError {
    pub(super) fn from_nom(
        source: &str,
        error: nom::Err<nom::error::Error<LocatedSpan<&str>>>,
    ) -> Self {
        match error {
            nom::Err::Incomplete(_) => Self {
                message: "incomplete input".into(),
                offset: source.len(),
            },
            nom::Err::Error(error) | nom::Err::Failure(error) => {
                let rest = error.input.fragment().trim_start();

                Self {
                    message: if rest.is_empty() {
                        "unexpected end of input".into()
                    } else {
                        format!(
                            "unexpected input near \"{}\"",
                            rest.chars()
                                .take_while(|character| *character != '\n')
                                .take(SNIPPET_LENGTH)
                                .collect::<String>()
                        )
                    },
                    offset: error.input.location_offset(),
                }
            }
        }
    }

    /// Returns a message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns a byte offset in a source text where parsing failed.
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl Display for ParseError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} at offset {}", self.message, self.offset)
    }
}

impl Error for ParseError {}
