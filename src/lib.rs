//! Translation catalogues are key part of any localization infrastructure. They contain the lists
//! of messages from the application, grouped into contexts and possibly disambiguated with
//! comments, and corresponding translations.
//!
//! This library handles catalogues in the [Qt Linguist `.ts`][TS] format. A `.ts` file is an XML
//! document produced by `lupdate` from the user interface sources and filled in by translators
//! with [Qt Linguist][linguist]. Each file holds the translations for one target language.
//!
//! The library covers the runtime side of such catalogues:
//!
//! - [`ts::TsReader`] reads the units of a document one by one, [`ts::write`] writes them back.
//! - [`catalogue::Catalogue`] loads a whole document into an immutable lookup structure and
//!   answers `(context, source, comment, count)` queries, falling back to the source text
//!   whenever there is no usable translation.
//! - [`plural::PluralRule`] selects the plural form for a count in the target language.
//! - [`translator::Translator`] holds the active catalogue of a process and swaps it on language
//!   change, and finds the catalogue file for a language in a directory.
//! - [`args`] substitutes `%1`-style placeholders after lookup.
//!
//! [TS]: https://doc.qt.io/qt-6/linguist-ts-file-format.html
//! [linguist]: https://doc.qt.io/qt-6/qtlinguist-index.html

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate tracing;

extern crate locale_config;

extern crate quick_xml;

extern crate regex;

#[cfg(test)]
extern crate tempfile;

use std::collections::BTreeMap;
use std::fmt;
use locale_config::LanguageRange;

// Auxiliary macro for match checking without holding on to the value:
macro_rules! is {
    ($x:expr => $p:pat) => {{
        match $x {
            $p => true,
            _ => false,
        }
    }};
    ($x:expr => $p:pat if $c:expr) => {{
        match $x {
            $p if $c => true,
            _ => false,
        }
    }};
}


pub mod args;
pub mod catalogue;
pub mod plural;
pub mod translator;
pub mod ts;

pub use catalogue::{Catalogue, Context, LoadOptions};
pub use plural::PluralRule;
pub use translator::Translator;

/// Plural variants
///
/// Which variants are used depends on the language. In English it is easy: 1 is One and everything
/// else is Other. But other languages may have more cases, with Arabic having all six, and some,
/// like Vietnamese, only have Other.
#[derive(Copy,Clone,Debug,Eq,PartialEq,Ord,PartialOrd,Hash)]
pub enum Count {
    /// Zero has a separate variant in some langauges.
    Zero,
    /// One. In some languages also includes zero.
    One,
    /// Special case for two.
    Two,
    /// Small number. What is small number depends on the language.
    Few,
    /// Large number. What is large number depends on the language.
    Many,
    /// Any other number.
    Other,
}

impl Default for Count {
    fn default() -> Count { Count::One }
}

/// Translation text, possibly with plural variants.
///
/// This is used for the target string in translation Unit. Source strings in `.ts` are always
/// singular; a numerus message uses `%n` in its source instead.
#[derive(Clone,Debug,Eq,PartialEq,Ord,PartialOrd,Hash)]
pub enum Message {
    /// Unset message, used for untranslated entries.
    Empty,
    /// Message independent of any count.
    Singular(String),
    /// Count-dependent message with a variant for each category of the target language.
    Plural(BTreeMap<Count, String>),
}

impl Message {
    /// Whether there is no translation at all. An empty string still counts as a translation here.
    pub fn is_empty(&self) -> bool {
        is!(self => &Message::Empty)
    }

    /// Whether this is a plain, count-independent translation.
    pub fn is_singular(&self) -> bool {
        is!(self => &Message::Singular(_))
    }

    /// Whether this is a translation with plural variants.
    pub fn is_plural(&self) -> bool {
        is!(self => &Message::Plural(_))
    }

    /// Whether there is no usable text, i.e. the message is empty or all its variants are.
    pub fn is_blank(&self) -> bool {
        match self {
            &Message::Empty => true,
            &Message::Singular(ref s) => s == "",
            &Message::Plural(ref m) => m.values().all(|s| s == ""),
        }
    }

    pub fn singular(&self) -> Option<&str> {
        match self {
            &Message::Singular(ref s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Get the variant for given plural category, if there is one.
    pub fn form(&self, count: Count) -> Option<&str> {
        match self {
            &Message::Plural(ref m) => m.get(&count).map(String::as_str),
            _ => None,
        }
    }
}

impl Default for Message {
    fn default() -> Message { Message::Empty }
}

/// Note (comment) origins.
#[derive(Clone,Debug,Eq,PartialEq,Ord,PartialOrd,Hash)]
pub enum Origin {
    /// Comment from developer (`<extracomment>`).
    Developer,
    /// Comment from translator (`<translatorcomment>`).
    Translator,
}

/// Translation state.
///
/// Indicates whether the translation is considered usable.
#[derive(Copy,Clone,PartialEq,Eq,PartialOrd,Ord,Debug,Hash)]
pub enum State {
    /// The unit is not translated.
    Empty,
    /// The unit has a translation, but it is marked `unfinished`. It needs checking by human
    /// translator before it can be used.
    NeedsWork,
    /// The unit is considered usable.
    Final,
}

impl Default for State {
    fn default() -> State { State::Empty }
}

/// Reference to the place in the sources where the message is used.
#[derive(Clone,Debug,Default,Eq,PartialEq,Hash)]
pub struct Location {
    _file: String,
    _line: Option<usize>,
}

impl Location {
    pub fn new<S: Into<String>>(file: S, line: Option<usize>) -> Location {
        Location { _file: file.into(), _line: line }
    }
    /// Get the file name, relative to the catalogue.
    pub fn file(&self) -> &str { &self._file }
    /// Get the line number, if known.
    pub fn line(&self) -> Option<usize> { self._line }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self._line {
            Some(line) => write!(f, "{}:{}", self._file, line),
            None => f.write_str(&self._file),
        }
    }
}

/// Elementary unit of translation.
///
/// A translation unit contains:
///
/// - The name of the *context* it belongs to.
/// - One *source* string, the original message.
/// - Optional *comment* string that disambiguates the source within the context.
/// - The *target* string, the translated message.
/// - A status. This indicates whether the unit is usable in the software.
///
/// Additionally, it can also contain:
///  - Notes, from developer or translator.
///  - References back into the source where the unit is used.
///  - Previous source and comment if the source changed since the translation was made.
///  - Obsolete flag, indicating the unit is not currently in use.
#[derive(Clone,Debug,Default)]
pub struct Unit {
    _context: String,
    _source: String,
    _comment: Option<String>,
    _target: Message,
    _prev_source: Option<String>,
    _prev_comment: Option<String>,
    _notes: Vec<(Origin, String)>,
    _locations: Vec<Location>,
    _id: Option<String>,
    _state: State,
    _numerus: bool,
    _obsolete: bool,
}

impl Unit {
    /// Get the context name.
    pub fn context(&self) -> &str { &self._context }
    /// Get the source string.
    pub fn source(&self) -> &str { &self._source }
    /// Get the disambiguating comment.
    pub fn comment(&self) -> Option<&str> { self._comment.as_ref().map(String::as_str) }
    /// Get the target string.
    pub fn target(&self) -> &Message { &self._target }
    /// Get the previous source (`<oldsource>`).
    pub fn prev_source(&self) -> Option<&str> { self._prev_source.as_ref().map(String::as_str) }
    /// Get the previous comment (`<oldcomment>`).
    pub fn prev_comment(&self) -> Option<&str> { self._prev_comment.as_ref().map(String::as_str) }
    /// Get the notes/comments.
    pub fn notes(&self) -> &Vec<(Origin, String)> { &self._notes }
    /// Get locations.
    pub fn locations(&self) -> &Vec<Location> { &self._locations }
    /// Get the explicit message id, if the catalogue uses them.
    pub fn id(&self) -> Option<&str> { self._id.as_ref().map(String::as_str) }
    /// Get the state.
    pub fn state(&self) -> State { self._state }
    /// Returns whether the unit should be used in application.
    pub fn is_translated(&self) -> bool { self._state == State::Final && !self._obsolete }
    /// Returns whether the unit has plural variants.
    pub fn is_numerus(&self) -> bool { self._numerus }
    /// Returns whether the unit is obsolete.
    pub fn is_obsolete(&self) -> bool { self._obsolete }
}

/// Catalogue reader.
///
/// Defines common interface of catalogue readers. Read the units by simply iterating over the
/// reader. The other methods are for the important metadata.
pub trait CatalogueReader : Iterator<Item = Result<Unit, Error>> {
    fn target_language(&self) -> &LanguageRange<'static>;
    fn source_language(&self) -> &LanguageRange<'static>;
    /// Version of the format, if the document states it.
    fn version(&self) -> Option<&str>;
}

/// Error in reading or writing a catalogue.
#[derive(Debug)]
pub enum Error {
    /// An I/O error from file operation.
    ///
    /// The first parameter is line number if applicable, the second is the system error.
    Io(usize, std::io::Error),
    /// A parse error.
    ///
    /// Parameters are line number, optional unexpected token and an array of expected tokens.
    /// Unset unexpected token means the parser is not smart enough to remember what it stopped on.
    /// Empty array of expected items means the parser is not smart enough to remember what it
    /// could have accepted instead.
    Parse(usize, Option<String>, Vec<&'static str>),
    /// The document is not well-formed XML.
    ///
    /// The first parameter is line number if applicable, the second is the error from the XML
    /// parser.
    Xml(usize, quick_xml::Error),
    /// The same message appears twice in one context.
    ///
    /// Parameters are context, source and comment. Only reported when loading in strict mode;
    /// otherwise the last definition wins.
    Duplicate(String, String, Option<String>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Error::Io(0, ref err) => write!(f, "{}", err),
            &Error::Io(line, ref err) => write!(f, "{} at line {}", err, line),
            &Error::Parse(line, ref got, ref exp) => {
                write!(f, "Parse error at line {}", line)?;
                if !exp.is_empty() {
                    let mut prefix = ", expected";
                    for e in exp {
                        write!(f, "{} ‘{}’", prefix, e)?;
                        prefix = " or";
                    }
                }
                if let Some(ref got) = *got {
                    write!(f, ", got ‘{}’", got)?;
                }
                Ok(())
            }
            &Error::Xml(0, ref err) => write!(f, "Malformed XML: {}", err),
            &Error::Xml(line, ref err) => write!(f, "Malformed XML at line {}: {}", line, err),
            &Error::Duplicate(ref context, ref source, None) =>
                write!(f, "Duplicate message ‘{}’ in context ‘{}’", source, context),
            &Error::Duplicate(ref context, ref source, Some(ref comment)) =>
                write!(f, "Duplicate message ‘{}’ (‘{}’) in context ‘{}’", source, comment, context),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Error::Io(_, ref err) => Some(err),
            &Error::Xml(_, ref err) => Some(err),
            &Error::Parse(..) | &Error::Duplicate(..) => None,
        }
    }
}
