//! Loaded catalogues
//!
//! A [`Catalogue`] is the result of reading a whole document. It is immutable once loaded and
//! answers lookups by context, source and comment. Missing or unfinished translations are never
//! errors: the lookup simply returns the source text.
//!
//! [`Catalogue`]: struct.Catalogue.html

use locale_config::LanguageRange;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use super::{CatalogueReader, Count, Error, Message, State, Unit};
use super::plural::PluralRule;
use super::ts::TsReader;

/// Options for loading a catalogue.
#[derive(Clone,Debug,Default)]
pub struct LoadOptions {
    _include_unfinished: bool,
    _strict: bool,
}

impl LoadOptions {
    pub fn new() -> LoadOptions { LoadOptions::default() }

    /// Use translations marked `unfinished` when they are not blank.
    ///
    /// This is what `lrelease` does unless given `-nounfinished`. Off by default.
    pub fn include_unfinished(mut self, yes: bool) -> LoadOptions {
        self._include_unfinished = yes;
        self
    }

    /// Fail on duplicate messages instead of keeping the last one.
    pub fn strict(mut self, yes: bool) -> LoadOptions {
        self._strict = yes;
        self
    }
}

/// Group of messages of one user interface component.
#[derive(Clone,Debug,Default)]
pub struct Context {
    _name: String,
    _units: Vec<Unit>,
    // source -> units with that source, one per distinct comment
    _index: HashMap<String, Vec<usize>>,
}

impl Context {
    fn new(name: &str) -> Context {
        Context { _name: name.to_owned(), ..Context::default() }
    }

    /// Get the context name.
    pub fn name(&self) -> &str { &self._name }

    /// Get all units in document order, including obsolete ones.
    pub fn units(&self) -> &[Unit] { &self._units }

    pub fn len(&self) -> usize { self._units.len() }

    pub fn is_empty(&self) -> bool { self._units.is_empty() }

    /// Find the current (not obsolete) unit for source and comment.
    pub fn find(&self, source: &str, comment: Option<&str>) -> Option<&Unit> {
        let comment = comment.and_then(|c| if c.is_empty() { None } else { Some(c) });
        self._index.get(source)?
            .iter()
            .map(|&i| &self._units[i])
            .find(|u| u.comment() == comment)
    }

    fn insert(&mut self, unit: Unit, strict: bool) -> Result<(), Error> {
        let n = self._units.len();
        if !unit.is_obsolete() {
            let units = &self._units;
            let slots = self._index.entry(unit.source().to_owned()).or_insert_with(Vec::new);
            match slots.iter().position(|&i| units[i].comment() == unit.comment()) {
                Some(_) if strict => {
                    return Err(Error::Duplicate(self._name.clone(), unit.source().to_owned(),
                                                unit.comment().map(From::from)));
                }
                Some(pos) => {
                    warn!(context = %self._name, source = %unit.source(), comment = ?unit.comment(),
                          "duplicate message, keeping the last one");
                    slots[pos] = n;
                }
                None => slots.push(n),
            }
        }
        self._units.push(unit);
        Ok(())
    }
}

/// Translation catalogue for one language.
///
/// # Example
///
/// ```
/// use ts_catalogue::Catalogue;
///
/// let catalogue: Catalogue = r#"<TS version="2.1" language="vi_VN" sourcelanguage="en_US">
///     <context>
///         <name>CompatDB</name>
///         <message>
///             <source>Submitting</source>
///             <translation>Đang gửi</translation>
///         </message>
///         <message>
///             <source>Communication error</source>
///             <translation type="unfinished"></translation>
///         </message>
///     </context>
/// </TS>"#.parse().unwrap();
///
/// assert_eq!(catalogue.translate("CompatDB", "Submitting"), "Đang gửi");
/// assert_eq!(catalogue.translate("CompatDB", "Communication error"), "Communication error");
/// assert_eq!(catalogue.translate("GMainWindow", "Submitting"), "Submitting");
/// ```
#[derive(Clone,Debug)]
pub struct Catalogue {
    _target_language: LanguageRange<'static>,
    _source_language: LanguageRange<'static>,
    _version: Option<String>,
    _rule: PluralRule,
    _include_unfinished: bool,
    _contexts: Vec<Context>,
    _by_name: HashMap<String, usize>,
}

impl Default for Catalogue {
    fn default() -> Catalogue { Catalogue::new(LanguageRange::invariant()) }
}

impl Catalogue {
    /// Create empty catalogue for given language. All lookups in it return the source.
    pub fn new(language: LanguageRange<'static>) -> Catalogue {
        Catalogue {
            _rule: PluralRule::for_language(&language),
            _target_language: language,
            _source_language: LanguageRange::invariant(),
            _version: None,
            _include_unfinished: false,
            _contexts: Vec::new(),
            _by_name: HashMap::new(),
        }
    }

    /// Build catalogue from all units of a reader.
    ///
    /// Fails with the first error from the reader; no partial catalogue is ever returned.
    pub fn from_reader<C: CatalogueReader>(reader: C, options: &LoadOptions)
        -> Result<Catalogue, Error>
    {
        let mut res = Catalogue::new(reader.target_language().clone());
        res._source_language = reader.source_language().clone();
        res._version = reader.version().map(From::from);
        res._include_unfinished = options._include_unfinished;
        for unit in reader {
            res.insert(unit?, options._strict)?;
        }
        let language: &str = res._target_language.as_ref();
        debug!(language = %language,
               contexts = res._contexts.len(),
               messages = res.len(),
               translated = res.translated_len(),
               "catalogue loaded");
        Ok(res)
    }

    /// Load catalogue in `.ts` format with default options.
    pub fn load<R: BufRead>(reader: R) -> Result<Catalogue, Error> {
        Self::load_with(reader, &LoadOptions::default())
    }

    /// Load catalogue in `.ts` format.
    pub fn load_with<R: BufRead>(reader: R, options: &LoadOptions) -> Result<Catalogue, Error> {
        Self::from_reader(TsReader::new(reader)?, options)
    }

    /// Load catalogue from a `.ts` file with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Catalogue, Error> {
        Self::open_with(path, &LoadOptions::default())
    }

    /// Load catalogue from a `.ts` file.
    pub fn open_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Catalogue, Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening catalogue");
        let file = File::open(path).map_err(|e| Error::Io(0, e))?;
        Self::load_with(BufReader::new(file), options)
    }

    fn insert(&mut self, unit: Unit, strict: bool) -> Result<(), Error> {
        let i = match self._by_name.get(unit.context()) {
            Some(&i) => i,
            None => {
                let i = self._contexts.len();
                self._contexts.push(Context::new(unit.context()));
                self._by_name.insert(unit.context().to_owned(), i);
                i
            }
        };
        self._contexts[i].insert(unit, strict)
    }

    /// Get the language the catalogue translates to.
    pub fn target_language(&self) -> &LanguageRange<'static> { &self._target_language }
    /// Get the language of the source strings.
    pub fn source_language(&self) -> &LanguageRange<'static> { &self._source_language }
    /// Get the format version, if the document states it.
    pub fn version(&self) -> Option<&str> { self._version.as_ref().map(String::as_str) }
    /// Get the plural rule of the target language.
    pub fn plural_rule(&self) -> PluralRule { self._rule }

    /// Get the contexts in document order.
    pub fn contexts(&self) -> &[Context] { &self._contexts }

    /// Get context by name.
    pub fn context(&self, name: &str) -> Option<&Context> {
        self._by_name.get(name).map(|&i| &self._contexts[i])
    }

    /// Number of units, including obsolete and untranslated ones.
    pub fn len(&self) -> usize {
        self._contexts.iter().map(Context::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self._contexts.iter().all(Context::is_empty)
    }

    /// Number of units lookup would return a translation for.
    pub fn translated_len(&self) -> usize {
        self._contexts.iter()
            .flat_map(|c| c.units().iter())
            .filter(|u| self.is_usable(u))
            .count()
    }

    /// Find the current unit for context, source and comment.
    pub fn find(&self, context: &str, source: &str, comment: Option<&str>) -> Option<&Unit> {
        self.context(context)?.find(source, comment)
    }

    fn is_usable(&self, unit: &Unit) -> bool {
        if unit.is_obsolete() || unit.target().is_blank() {
            return false;
        }
        match unit.state() {
            State::Final => true,
            State::NeedsWork => self._include_unfinished,
            State::Empty => false,
        }
    }

    fn resolve<'a>(&'a self, unit: &'a Unit, count: Option<u64>) -> Option<&'a str> {
        if !self.is_usable(unit) {
            return None;
        }
        let text = match unit.target() {
            &Message::Empty => None,
            &Message::Singular(ref s) => Some(s.as_str()),
            &Message::Plural(ref forms) => {
                let category = match count {
                    Some(n) => self._rule.select(n),
                    None => self._rule.forms().first().cloned().unwrap_or(Count::Other),
                };
                forms.get(&category)
                    .filter(|s| !s.is_empty())
                    .or_else(|| forms.get(&Count::Other))
                    .map(String::as_str)
            }
        };
        text.filter(|s| !s.is_empty())
    }

    /// Translate a message.
    ///
    /// Returns the translation of the message with given context, source and comment. For numerus
    /// messages, `count` selects the plural form; without it the first form is used. Placeholders
    /// are returned as they are, see [`args`](../args/index.html) for substituting them.
    ///
    /// If the message is not in the catalogue, or is not translated, returns `source`.
    pub fn lookup<'a>(&'a self, context: &str, source: &'a str, comment: Option<&str>,
                      count: Option<u64>) -> &'a str
    {
        self.find(context, source, comment)
            .and_then(|u| self.resolve(u, count))
            .unwrap_or(source)
    }

    /// Translate a message without comment or count.
    pub fn translate<'a>(&'a self, context: &str, source: &'a str) -> &'a str {
        self.lookup(context, source, None, None)
    }
}

impl FromStr for Catalogue {
    type Err = Error;
    fn from_str(s: &str) -> Result<Catalogue, Error> {
        Catalogue::load(s.as_bytes())
    }
}
