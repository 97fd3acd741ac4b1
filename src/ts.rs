//! Handling of [Qt Linguist translation sources][TS]
//!
//! This format is produced by `lupdate` and edited with Qt Linguist. It is an XML document with
//! the translation units grouped into contexts, usually one context per user interface class:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <!DOCTYPE TS>
//! <TS version="2.1" language="vi_VN" sourcelanguage="en_US">
//! <context>
//!     <name>CompatDB</name>
//!     <message>
//!         <location filename="../../src/yuzu/compatdb.cpp" line="161"/>
//!         <source>Submitting</source>
//!         <translation>Đang gửi</translation>
//!     </message>
//! </context>
//! </TS>
//! ```
//!
//! Numerus messages (`numerus="yes"`) have one `<numerusform>` per plural category of the target
//! language instead of plain translation text.
//!
//! [TS]: https://doc.qt.io/qt-6/linguist-ts-file-format.html

use locale_config::LanguageRange;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::{BTreeMap, HashMap};
use std::convert::TryFrom;
use std::fmt::Write as FmtWrite;
use std::io::{self, BufRead, Read, Write};
use super::{CatalogueReader, Error, Location, Message, Origin, State, Unit};
use super::catalogue::Catalogue;
use super::plural::PluralRule;

// Keeps track of line number of the input consumed by the XML parser.
struct LineCounter<R: BufRead> {
    _n: usize,
    _inner: R,
}

fn count_lines(buf: &[u8]) -> usize {
    buf.iter().filter(|&&b| b == b'\n').count()
}

impl<R: BufRead> Read for LineCounter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self._inner.read(buf)?;
        self._n += count_lines(&buf[..n]);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for LineCounter<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self._inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        // fill_buf after fill_buf returns the same buffer without reading
        if let Ok(buf) = self._inner.fill_buf() {
            self._n += count_lines(&buf[..amt.min(buf.len())]);
        }
        self._inner.consume(amt);
    }
}

type Attrs = Vec<(String, String)>;

#[derive(Clone,Debug,PartialEq)]
enum Token {
    Open(String, Attrs),
    Empty(String, Attrs),
    Close(String),
    Text(String),
    End,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            &Token::Open(ref n, _) => format!("<{}>", n),
            &Token::Empty(ref n, _) => format!("<{}/>", n),
            &Token::Close(ref n) => format!("</{}>", n),
            &Token::Text(ref s) => s.trim().chars().take(40).collect(),
            &Token::End => "end of file".to_owned(),
        }
    }
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs.iter().find(|a| a.0 == key).map(|a| a.1.as_str())
}

fn closing(tag: &str) -> &'static str {
    match tag {
        "TS" => "</TS>",
        "context" => "</context>",
        "name" => "</name>",
        "message" => "</message>",
        "translation" => "</translation>",
        "numerusform" => "</numerusform>",
        "lengthvariant" => "</lengthvariant>",
        _ => "end tag",
    }
}

fn start_token(e: &BytesStart) -> Result<(String, Attrs), quick_xml::Error> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for a in e.attributes() {
        let a = a?;
        attrs.push((String::from_utf8_lossy(a.key.as_ref()).into_owned(),
                    a.unescape_value()?.into_owned()));
    }
    Ok((name, attrs))
}

fn language_range(tag: &str) -> LanguageRange<'static> {
    LanguageRange::new(tag)
        .map(LanguageRange::into_static)
        .or_else(|_| LanguageRange::from_unix(tag))
        .unwrap_or_else(|_| LanguageRange::invariant())
}

// `.ts` files use the Unix form of language tags.
fn language_tag(lang: &LanguageRange) -> String {
    let tag: &str = lang.as_ref();
    tag.replace('-', "_")
}

pub struct TsReader<R: BufRead> {
    _xml: Reader<LineCounter<R>>,
    _buf: Vec<u8>,
    _context: Option<String>,
    _done: bool,
    _version: Option<String>,
    _target_language: LanguageRange<'static>,
    _source_language: LanguageRange<'static>,
    _rule: PluralRule,
    _current_file: String,
    _current_lines: HashMap<String, i64>,
}

impl<R: BufRead> TsReader<R> {
    /// Start reading a document.
    ///
    /// Reads up to the `<TS>` root element and takes the catalogue metadata from it. Fails if the
    /// document does not start with a `<TS>` element.
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut res = TsReader {
            _xml: Reader::from_reader(LineCounter { _n: 0, _inner: reader }),
            _buf: Vec::new(),
            _context: None,
            _done: false,
            _version: None,
            _target_language: LanguageRange::invariant(),
            _source_language: LanguageRange::invariant(),
            _rule: PluralRule::english(),
            _current_file: String::new(),
            _current_lines: HashMap::new(),
        };
        match res.structural(&["<TS>"])? {
            Token::Open(ref name, ref attrs) if name == "TS" => res.parse_ts_header(attrs),
            Token::Empty(ref name, ref attrs) if name == "TS" => {
                res.parse_ts_header(attrs);
                res._done = true;
            }
            t => return Err(Error::Parse(res.line(), Some(t.describe()), vec!["<TS>"])),
        }
        Ok(res)
    }

    /// Plural rule used to assign `numerusform`s to categories.
    pub fn plural_rule(&self) -> PluralRule { self._rule }

    fn line(&self) -> usize {
        self._xml.get_ref()._n + 1
    }

    fn parse_ts_header(&mut self, attrs: &[(String, String)]) {
        self._version = attr(attrs, "version").map(From::from);
        if let Some(lang) = attr(attrs, "language") {
            self._target_language = language_range(lang);
        }
        if let Some(lang) = attr(attrs, "sourcelanguage") {
            self._source_language = language_range(lang);
        }
        self._rule = PluralRule::for_language(&self._target_language);
        debug!(version = ?self._version,
               language = %language_tag(&self._target_language),
               forms = self._rule.len(),
               "reading TS catalogue");
    }

    fn next_token(&mut self) -> Result<Token, Error> {
        loop {
            self._buf.clear();
            let token = match self._xml.read_event_into(&mut self._buf) {
                Ok(Event::Start(ref e)) => start_token(e).map(|(n, a)| Token::Open(n, a)),
                Ok(Event::Empty(ref e)) => start_token(e).map(|(n, a)| Token::Empty(n, a)),
                Ok(Event::End(ref e)) =>
                    Ok(Token::Close(String::from_utf8_lossy(e.name().as_ref()).into_owned())),
                Ok(Event::Text(ref e)) => e.unescape().map(|s| Token::Text(s.into_owned())),
                Ok(Event::CData(e)) =>
                    Ok(Token::Text(String::from_utf8_lossy(&e.into_inner()).into_owned())),
                Ok(Event::Eof) => Ok(Token::End),
                Ok(_) => continue, // declaration, doctype, comments
                Err(e) => Err(e),
            };
            return token.map_err(|e| Error::Xml(self.line(), e));
        }
    }

    // Next token where only elements may appear; whitespace is skipped.
    fn structural(&mut self, exp: &[&'static str]) -> Result<Token, Error> {
        loop {
            match self.next_token()? {
                Token::Text(ref s) if s.trim().is_empty() => continue,
                Token::Text(s) =>
                    return Err(Error::Parse(self.line(), Some(s.trim().to_owned()), exp.to_vec())),
                t => return Ok(t),
            }
        }
    }

    fn repeated(&self, tag: &str) -> Error {
        Error::Parse(self.line(), Some(format!("<{}>", tag)), vec![closing("message")])
    }

    fn unterminated(&self, tag: &str) -> Error {
        Error::Parse(self.line(), Some(Token::End.describe()), vec![closing(tag)])
    }

    fn skip_element(&mut self, tag: &str) -> Result<(), Error> {
        let mut depth = 0usize;
        loop {
            match self.next_token()? {
                Token::Open(..) => depth += 1,
                Token::Close(_) if depth == 0 => return Ok(()),
                Token::Close(_) => depth -= 1,
                Token::End => return Err(self.unterminated(tag)),
                Token::Empty(..) | Token::Text(_) => (),
            }
        }
    }

    fn byte(&self, attrs: &[(String, String)]) -> Result<char, Error> {
        let value = attr(attrs, "value").unwrap_or("");
        let code = if value.starts_with("0x") {
            u32::from_str_radix(&value[2..], 16).ok()
        } else if value.starts_with('x') {
            u32::from_str_radix(&value[1..], 16).ok()
        } else {
            value.parse().ok()
        };
        match code.and_then(::std::char::from_u32) {
            Some(c) => Ok(c),
            None => Err(Error::Parse(self.line(), Some(format!("<byte value=\"{}\"/>", value)),
                                     vec!["character code"])),
        }
    }

    // Text content of a simple element, after its start tag.
    fn read_text(&mut self, tag: &str) -> Result<String, Error> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(s) => text.push_str(&s),
                Token::Empty(ref name, ref attrs) if name == "byte" => text.push(self.byte(attrs)?),
                Token::Close(_) => return Ok(text),
                Token::End => return Err(self.unterminated(tag)),
                t => return Err(Error::Parse(self.line(), Some(t.describe()), vec![closing(tag)])),
            }
        }
    }

    fn element_text(&mut self, tag: &str, empty: bool) -> Result<String, Error> {
        if empty { Ok(String::new()) } else { self.read_text(tag) }
    }

    // Content of `<translation>` or `<numerusform>`. Returns the text, which is the first length
    // variant if there are any, and the numerus forms.
    fn read_translation(&mut self, tag: &str) -> Result<(String, Vec<String>), Error> {
        let mut text = String::new();
        let mut variant = None;
        let mut forms = Vec::new();
        loop {
            match self.next_token()? {
                Token::Text(s) => text.push_str(&s),
                Token::Empty(ref name, ref attrs) if name == "byte" => text.push(self.byte(attrs)?),
                Token::Open(ref name, _) if name == "lengthvariant" => {
                    let v = self.read_text(name)?;
                    variant = variant.or(Some(v));
                }
                Token::Empty(ref name, _) if name == "lengthvariant" => {
                    variant = variant.or(Some(String::new()));
                }
                Token::Open(ref name, _) if name == "numerusform" && tag == "translation" => {
                    let (form, _) = self.read_translation(name)?;
                    forms.push(form);
                }
                Token::Empty(ref name, _) if name == "numerusform" && tag == "translation" => {
                    forms.push(String::new());
                }
                Token::Close(_) => return Ok((variant.unwrap_or(text), forms)),
                Token::End => return Err(self.unterminated(tag)),
                t => return Err(Error::Parse(self.line(), Some(t.describe()), vec![closing(tag)])),
            }
        }
    }

    fn location(&mut self, attrs: &[(String, String)]) -> Location {
        if let Some(file) = attr(attrs, "filename") {
            self._current_file = file.to_owned();
        }
        let file = self._current_file.clone();
        let line = match attr(attrs, "line") {
            // relative to the previous location in the same file
            Some(l) if l.starts_with('+') || l.starts_with('-') => match l.parse::<i64>() {
                Ok(delta) => {
                    let current = self._current_lines.entry(file.clone()).or_insert(0);
                    match current.checked_add(delta) {
                        Some(n) => {
                            *current = n;
                            Some(n)
                        }
                        None => None,
                    }
                }
                Err(_) => None,
            },
            Some(l) => match l.parse::<i64>() {
                Ok(n) => {
                    self._current_lines.insert(file.clone(), n);
                    Some(n)
                }
                Err(_) => None,
            },
            None => None,
        };
        Location::new(file, line.and_then(|l| usize::try_from(l).ok()).filter(|&l| l > 0))
    }

    fn parse_context(&mut self) -> Result<(), Error> {
        let name = match self.structural(&["<name>"])? {
            Token::Open(ref n, _) if n == "name" => self.read_text(n)?,
            Token::Empty(ref n, _) if n == "name" => String::new(),
            Token::End => return Err(self.unterminated("context")),
            t => return Err(Error::Parse(self.line(), Some(t.describe()), vec!["<name>"])),
        };
        self._context = Some(name);
        Ok(())
    }

    fn parse_message(&mut self, msg_attrs: &[(String, String)]) -> Result<Unit, Error> {
        let mut unit = Unit::default();
        unit._context = self._context.clone().unwrap_or_default();
        unit._numerus = attr(msg_attrs, "numerus") == Some("yes");
        unit._id = attr(msg_attrs, "id").map(From::from);

        let mut source = None;
        let mut translation = None;
        loop {
            let (name, attrs, empty) = match self.structural(&["<source>", "</message>"])? {
                Token::Open(n, a) => (n, a, false),
                Token::Empty(n, a) => (n, a, true),
                Token::Close(_) => break,
                _ => return Err(self.unterminated("message")),
            };
            match name.as_str() {
                "location" => {
                    if !empty { self.skip_element(&name)?; }
                    let loc = self.location(&attrs);
                    unit._locations.push(loc);
                }
                // exactly one of each
                "source" if source.is_some() => return Err(self.repeated(&name)),
                "translation" if translation.is_some() => return Err(self.repeated(&name)),
                "source" => source = Some(self.element_text(&name, empty)?),
                "oldsource" => unit._prev_source = Some(self.element_text(&name, empty)?),
                "comment" => {
                    let c = self.element_text(&name, empty)?;
                    unit._comment = if c.is_empty() { None } else { Some(c) };
                }
                "oldcomment" => {
                    let c = self.element_text(&name, empty)?;
                    unit._prev_comment = if c.is_empty() { None } else { Some(c) };
                }
                "extracomment" => {
                    let c = self.element_text(&name, empty)?;
                    unit._notes.push((Origin::Developer, c));
                }
                "translatorcomment" => {
                    let c = self.element_text(&name, empty)?;
                    unit._notes.push((Origin::Translator, c));
                }
                "translation" => {
                    let content = if empty {
                        (String::new(), Vec::new())
                    } else {
                        self.read_translation(&name)?
                    };
                    translation = Some((attr(&attrs, "type").map(String::from), content));
                }
                // userdata, extra-* and anything newer
                _ => if !empty { self.skip_element(&name)?; },
            }
        }

        unit._source = match source {
            Some(s) => s,
            None => return Err(Error::Parse(self.line(), Some("</message>".to_owned()),
                                            vec!["<source>"])),
        };

        let (kind, (text, forms)) = translation.unwrap_or((None, (String::new(), Vec::new())));
        unit._target = if unit._numerus {
            self.make_plural(&unit, text, forms)
        } else if text.is_empty() {
            Message::Empty
        } else {
            Message::Singular(text)
        };

        let blank = unit._target.is_blank();
        match kind.as_ref().map(String::as_str) {
            None | Some("") | Some("finished") =>
                unit._state = if blank { State::Empty } else { State::Final },
            Some("unfinished") =>
                unit._state = if blank { State::Empty } else { State::NeedsWork },
            Some("vanished") | Some("obsolete") => {
                unit._obsolete = true;
                unit._state = if blank { State::Empty } else { State::Final };
            }
            Some(other) => {
                warn!(context = %unit._context, source = %unit._source, kind = other,
                      "unknown translation type, treating as unfinished");
                unit._state = if blank { State::Empty } else { State::NeedsWork };
            }
        }
        Ok(unit)
    }

    fn make_plural(&self, unit: &Unit, text: String, mut forms: Vec<String>) -> Message {
        if forms.is_empty() && !text.trim().is_empty() {
            forms.push(text);
        }
        if forms.iter().all(String::is_empty) {
            return Message::Empty;
        }
        if forms.len() > self._rule.len() {
            warn!(context = %unit._context, source = %unit._source,
                  expected = self._rule.len(), found = forms.len(),
                  "surplus numerus forms dropped");
        }
        let map: BTreeMap<_, _> = self._rule.forms().iter().cloned().zip(forms).collect();
        Message::Plural(map)
    }

    fn parse_unit(&mut self) -> Result<Option<Unit>, Error> {
        loop {
            let in_context = self._context.is_some();
            let exp: &[&'static str] = if in_context {
                &["<message>", "</context>"]
            } else {
                &["<context>", "</TS>"]
            };
            match self.structural(exp)? {
                Token::Open(ref name, ref attrs) if name == "message" => {
                    if !in_context {
                        return Err(Error::Parse(self.line(), Some("<message>".to_owned()),
                                                vec!["<context>"]));
                    }
                    return self.parse_message(attrs).map(Some);
                }
                Token::Empty(ref name, _) if name == "message" => {
                    return Err(Error::Parse(self.line(), Some("<message/>".to_owned()),
                                            vec!["<source>"]));
                }
                Token::Open(ref name, _) if name == "context" => {
                    if in_context {
                        return Err(Error::Parse(self.line(), Some("<context>".to_owned()),
                                                vec!["</context>"]));
                    }
                    self.parse_context()?;
                }
                Token::Empty(ref name, _) if name == "context" => {
                    return Err(Error::Parse(self.line(), Some("<context/>".to_owned()),
                                            vec!["<name>"]));
                }
                // context comments, dependencies, extra-*
                Token::Open(ref name, _) => self.skip_element(name)?,
                Token::Empty(..) => (),
                Token::Close(ref name) if name == "context" => self._context = None,
                Token::Close(_) => {
                    // </TS>, the document must end here
                    return match self.structural(&[])? {
                        Token::End => Ok(None),
                        t => Err(Error::Parse(self.line(), Some(t.describe()),
                                              vec!["end of file"])),
                    };
                }
                Token::End => {
                    let tag = if in_context { "context" } else { "TS" };
                    return Err(self.unterminated(tag));
                }
                Token::Text(_) => unreachable!(), // structural never returns text
            }
        }
    }
}

impl<R: BufRead> Iterator for TsReader<R> {
    type Item = Result<Unit, Error>;
    fn next(&mut self) -> Option<Result<Unit, Error>> {
        if self._done {
            return None;
        }
        match self.parse_unit() {
            Ok(Some(u)) => Some(Ok(u)),
            Ok(None) => {
                self._done = true;
                None
            }
            Err(e) => {
                self._done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> CatalogueReader for TsReader<R> {
    fn target_language(&self) -> &LanguageRange<'static> {
        &self._target_language
    }

    fn source_language(&self) -> &LanguageRange<'static> {
        &self._source_language
    }

    fn version(&self) -> Option<&str> {
        self._version.as_ref().map(String::as_str)
    }
}

fn is_restricted(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => true,
        _ => false,
    }
}

struct TsWriter<W: Write> {
    _xml: Writer<W>,
}

impl<W: Write> TsWriter<W> {
    fn event(&mut self, event: Event) -> Result<(), Error> {
        self._xml.write_event(event).map_err(|e| Error::Xml(0, e))
    }

    fn text_element(&mut self, start: BytesStart, text: &str) -> Result<(), Error> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        self.event(Event::Start(start))?;
        self.text(text)?;
        self.event(Event::End(BytesEnd::new(name)))
    }

    // Characters XML 1.0 does not allow go out as `<byte>` elements, as lupdate writes them.
    fn text(&mut self, text: &str) -> Result<(), Error> {
        if !text.chars().any(is_restricted) {
            return self.event(Event::Text(BytesText::new(text)));
        }
        let mut escaped = String::with_capacity(text.len() + 16);
        let mut last = 0;
        for (i, c) in text.char_indices().filter(|&(_, c)| is_restricted(c)) {
            escaped.push_str(&escape(&text[last..i]));
            let _ = write!(escaped, "<byte value=\"x{:x}\"/>", c as u32);
            last = i + c.len_utf8();
        }
        escaped.push_str(&escape(&text[last..]));
        self.event(Event::Text(BytesText::from_escaped(escaped)))
    }

    fn unit(&mut self, unit: &Unit, rule: PluralRule) -> Result<(), Error> {
        let mut start = BytesStart::new("message");
        if let Some(id) = unit.id() {
            start.push_attribute(("id", id));
        }
        if unit.is_numerus() {
            start.push_attribute(("numerus", "yes"));
        }
        self.event(Event::Start(start))?;

        for loc in unit.locations() {
            let mut start = BytesStart::new("location");
            start.push_attribute(("filename", loc.file()));
            if let Some(line) = loc.line() {
                start.push_attribute(("line", line.to_string().as_str()));
            }
            self.event(Event::Empty(start))?;
        }
        self.text_element(BytesStart::new("source"), unit.source())?;
        if let Some(s) = unit.prev_source() {
            self.text_element(BytesStart::new("oldsource"), s)?;
        }
        if let Some(c) = unit.comment() {
            self.text_element(BytesStart::new("comment"), c)?;
        }
        if let Some(c) = unit.prev_comment() {
            self.text_element(BytesStart::new("oldcomment"), c)?;
        }
        for &(ref origin, ref note) in unit.notes() {
            if *origin == Origin::Developer {
                self.text_element(BytesStart::new("extracomment"), note)?;
            }
        }
        for &(ref origin, ref note) in unit.notes() {
            if *origin == Origin::Translator {
                self.text_element(BytesStart::new("translatorcomment"), note)?;
            }
        }

        let mut start = BytesStart::new("translation");
        if unit.is_obsolete() {
            start.push_attribute(("type", "vanished"));
        } else if unit.state() != State::Final {
            start.push_attribute(("type", "unfinished"));
        }
        if unit.is_numerus() {
            self.event(Event::Start(start))?;
            for count in rule.forms() {
                let form = unit.target().form(*count).unwrap_or("");
                self.text_element(BytesStart::new("numerusform"), form)?;
            }
            self.event(Event::End(BytesEnd::new("translation")))?;
        } else {
            self.text_element(start, unit.target().singular().unwrap_or(""))?;
        }

        self.event(Event::End(BytesEnd::new("message")))
    }
}

/// Write catalogue in the `.ts` format.
///
/// The output follows the layout `lupdate` produces, with absolute locations.
pub fn write<W: Write>(catalogue: &Catalogue, out: W) -> Result<(), Error> {
    let mut w = TsWriter { _xml: Writer::new_with_indent(out, b' ', 4) };
    w.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    w.event(Event::DocType(BytesText::from_escaped("TS")))?;

    let mut start = BytesStart::new("TS");
    start.push_attribute(("version", catalogue.version().unwrap_or("2.1")));
    let language = language_tag(catalogue.target_language());
    if !language.is_empty() {
        start.push_attribute(("language", language.as_str()));
    }
    let source_language = language_tag(catalogue.source_language());
    if !source_language.is_empty() {
        start.push_attribute(("sourcelanguage", source_language.as_str()));
    }
    w.event(Event::Start(start))?;

    let rule = catalogue.plural_rule();
    for context in catalogue.contexts() {
        w.event(Event::Start(BytesStart::new("context")))?;
        w.text_element(BytesStart::new("name"), context.name())?;
        for unit in context.units() {
            w.unit(unit, rule)?;
        }
        w.event(Event::End(BytesEnd::new("context")))?;
    }
    w.event(Event::End(BytesEnd::new("TS")))?;

    let mut out = w._xml.into_inner();
    out.write_all(b"\n").and_then(|_| out.flush()).map_err(|e| Error::Io(0, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use Count;

    fn read(doc: &str) -> Vec<Unit> {
        TsReader::new(doc.as_bytes()).unwrap().collect::<Result<Vec<_>, _>>().unwrap()
    }

    fn read_err(doc: &str) -> Error {
        match TsReader::new(doc.as_bytes()) {
            Err(e) => e,
            Ok(r) => r.collect::<Result<Vec<_>, _>>().unwrap_err(),
        }
    }

    const HEADER: &'static str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n";

    #[test]
    fn header() {
        let doc = format!("{}<TS version=\"2.1\" language=\"vi_VN\" sourcelanguage=\"en_US\">\n</TS>\n",
                          HEADER);
        let mut reader = TsReader::new(doc.as_bytes()).unwrap();
        assert_eq!(reader.version(), Some("2.1"));
        assert_eq!(reader.target_language(), &LanguageRange::from_unix("vi_VN").unwrap());
        assert_eq!(reader.source_language(), &LanguageRange::from_unix("en_US").unwrap());
        assert_eq!(reader.plural_rule().forms(), &[Count::Other]);
        assert!(reader.next().is_none());
    }

    #[test]
    fn messages() {
        let units = read(r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="vi_VN" sourcelanguage="en_US">
<context>
    <name>CompatDB</name>
    <message>
        <location filename="../../src/yuzu/compatdb.ui" line="22"/>
        <location filename="../../src/yuzu/compatdb.cpp" line="161"/>
        <source>Submitting</source>
        <translation>Đang gửi</translation>
    </message>
    <message>
        <source>Communication error</source>
        <extracomment>Shown when the report can not be sent</extracomment>
        <translatorcomment>lỗi kết nối</translatorcomment>
        <translation type="unfinished"></translation>
    </message>
</context>
<context>
    <name>QObject</name>
    <message>
        <source>X</source>
        <comment>X axis</comment>
        <translation>Trục X</translation>
    </message>
</context>
</TS>
"#);
        assert_eq!(units.len(), 3);

        assert_eq!(units[0].context(), "CompatDB");
        assert_eq!(units[0].source(), "Submitting");
        assert_eq!(units[0].target(), &Message::Singular("Đang gửi".to_owned()));
        assert_eq!(units[0].state(), State::Final);
        assert!(units[0].is_translated());
        assert_eq!(units[0].locations(), &vec![
            Location::new("../../src/yuzu/compatdb.ui", Some(22)),
            Location::new("../../src/yuzu/compatdb.cpp", Some(161)),
        ]);

        assert_eq!(units[1].target(), &Message::Empty);
        assert_eq!(units[1].state(), State::Empty);
        assert_eq!(units[1].notes(), &vec![
            (Origin::Developer, "Shown when the report can not be sent".to_owned()),
            (Origin::Translator, "lỗi kết nối".to_owned()),
        ]);

        assert_eq!(units[2].context(), "QObject");
        assert_eq!(units[2].comment(), Some("X axis"));
    }

    #[test]
    fn relative_locations() {
        let units = read(r#"<TS version="2.1" language="de">
<context><name>A</name>
<message>
    <location filename="main.cpp" line="+10"/>
    <location line="+5"/>
    <location filename="other.cpp" line="+3"/>
    <source>a</source>
</message>
<message>
    <location filename="main.cpp" line="-2"/>
    <location filename="plain.cpp"/>
    <source>b</source>
</message>
</context>
</TS>"#);
        assert_eq!(units[0].locations(), &vec![
            Location::new("main.cpp", Some(10)),
            Location::new("main.cpp", Some(15)),
            Location::new("other.cpp", Some(3)),
        ]);
        assert_eq!(units[1].locations(), &vec![
            Location::new("main.cpp", Some(13)),
            Location::new("plain.cpp", None),
        ]);
    }

    #[test]
    fn text_is_kept_verbatim() {
        let units = read(r#"<TS language="vi_VN">
<context><name>GMainWindow</name>
<message>
    <source>  &lt;b&gt;%1&lt;/b&gt; &amp; more
next line</source>
    <translation><![CDATA[<b>%1</b>]]> &amp; nữa<byte value="x9"/>tab</translation>
</message>
</context>
</TS>"#);
        assert_eq!(units[0].source(), "  <b>%1</b> & more\nnext line");
        assert_eq!(units[0].target().singular(), Some("<b>%1</b> & nữa\ttab"));
    }

    #[test]
    fn numerus_forms_follow_language_rule() {
        let units = read(r#"<TS version="2.1" language="ru_RU">
<context><name>GameList</name>
<message numerus="yes">
    <source>%n file(s)</source>
    <translation>
        <numerusform>%n файл</numerusform>
        <numerusform>%n файла</numerusform>
        <numerusform>%n файлов</numerusform>
        <numerusform>surplus</numerusform>
    </translation>
</message>
</context>
</TS>"#);
        assert!(units[0].is_numerus());
        let target = units[0].target();
        assert_eq!(target.form(Count::One), Some("%n файл"));
        assert_eq!(target.form(Count::Few), Some("%n файла"));
        assert_eq!(target.form(Count::Many), Some("%n файлов"));
        assert_eq!(target.form(Count::Other), None);
        assert_eq!(units[0].state(), State::Final);
    }

    #[test]
    fn first_length_variant_wins() {
        let units = read(r#"<TS language="en">
<context><name>A</name>
<message>
    <source>Open</source>
    <translation variants="yes">
        <lengthvariant>Open the file</lengthvariant>
        <lengthvariant>Open</lengthvariant>
    </translation>
</message>
</context>
</TS>"#);
        assert_eq!(units[0].target().singular(), Some("Open the file"));
    }

    #[test]
    fn translation_states() {
        let units = read(r#"<TS language="vi_VN">
<context><name>A</name>
<message><source>a</source><translation type="unfinished">bản nháp</translation></message>
<message><source>b</source><translation type="vanished">cũ</translation></message>
<message><source>c</source><translation type="obsolete"/></message>
<message><source>d</source></message>
<message id="msg.e"><source>e</source><oldsource>E</oldsource><translation>ê</translation></message>
</context>
</TS>"#);
        assert_eq!(units[0].state(), State::NeedsWork);
        assert!(!units[0].is_translated());
        assert_eq!(units[1].state(), State::Final);
        assert!(units[1].is_obsolete());
        assert!(!units[1].is_translated());
        assert!(units[2].is_obsolete());
        assert_eq!(units[2].state(), State::Empty);
        assert_eq!(units[3].state(), State::Empty);
        assert_eq!(units[3].target(), &Message::Empty);
        assert_eq!(units[4].id(), Some("msg.e"));
        assert_eq!(units[4].prev_source(), Some("E"));
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let units = read(r#"<TS language="vi_VN">
<dependencies><dependency catalog="qtbase_vi"/></dependencies>
<context><name>A</name><comment>old style context comment</comment>
<message>
    <source>a</source>
    <userdata>opaque</userdata>
    <extra-po-flags>c-format</extra-po-flags>
    <translation>á</translation>
</message>
</context>
</TS>"#);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].target().singular(), Some("á"));
    }

    #[test]
    fn missing_source() {
        let err = read_err("<TS>\n<context><name>A</name>\n<message>\n<translation>x</translation>\n</message>\n</context></TS>");
        match err {
            Error::Parse(line, Some(ref got), ref exp) => {
                assert_eq!(line, 5);
                assert_eq!(got, "</message>");
                assert_eq!(exp, &vec!["<source>"]);
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn unterminated_document() {
        // the XML layer may notice the open elements first
        match read_err("<TS><context><name>A</name><message><source>a</source>") {
            Error::Parse(_, _, ref exp) => assert_eq!(exp, &vec!["</message>"]),
            Error::Xml(..) => (),
            e => panic!("unexpected error {:?}", e),
        }
        match read_err("<TS><context><name>A</name>") {
            Error::Parse(_, _, ref exp) => assert_eq!(exp, &vec!["</context>"]),
            Error::Xml(..) => (),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn mismatched_tags() {
        match read_err("<TS><context><name>A</name><message><source>a</comment></message></context></TS>") {
            Error::Xml(..) => (),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn structure_errors() {
        match read_err("<html></html>") {
            Error::Parse(_, Some(ref got), _) => assert_eq!(got, "<html>"),
            e => panic!("unexpected error {:?}", e),
        }
        match read_err("<TS><message><source>a</source></message></TS>") {
            Error::Parse(_, _, ref exp) => assert_eq!(exp, &vec!["<context>"]),
            e => panic!("unexpected error {:?}", e),
        }
        match read_err("<TS><context><name>A</name><context><name>B</name></context></context></TS>") {
            Error::Parse(_, Some(ref got), _) => assert_eq!(got, "<context>"),
            e => panic!("unexpected error {:?}", e),
        }
        match read_err("<TS><context>stray<name>A</name></context></TS>") {
            Error::Parse(_, Some(ref got), _) => assert_eq!(got, "stray"),
            e => panic!("unexpected error {:?}", e),
        }
        match read_err("<TS><context><name>A</name><message><source>a</source></message></context></TS><TS/>") {
            Error::Parse(_, _, ref exp) => assert_eq!(exp, &vec!["end of file"]),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn repeated_source_or_translation() {
        for &(doc, got) in &[
            ("<TS><context><name>A</name>\n<message><source>a</source>\n<source>b</source>\n</message></context></TS>",
             "<source>"),
            ("<TS><context><name>A</name>\n<message><source>a</source><translation>x</translation>\n<translation>y</translation></message></context></TS>",
             "<translation>"),
        ] {
            match read_err(doc) {
                Error::Parse(line, Some(ref g), ref exp) => {
                    assert_eq!(line, 3);
                    assert_eq!(g, got);
                    assert_eq!(exp, &vec!["</message>"]);
                }
                e => panic!("unexpected error {:?}", e),
            }
        }
    }

    #[test]
    fn overflowing_locations() {
        let units = read(r#"<TS language="de">
<context><name>A</name>
<message>
    <location filename="main.cpp" line="+9223372036854775807"/>
    <location line="+1"/>
    <location line="-9223372036854775807"/>
    <location filename="other.cpp" line="-4"/>
    <source>a</source>
</message>
</context>
</TS>"#);
        assert_eq!(units[0].locations(), &vec![
            Location::new("main.cpp", Some(9223372036854775807)),
            Location::new("main.cpp", None),
            Location::new("main.cpp", None),
            Location::new("other.cpp", None),
        ]);
    }

    #[test]
    fn write_round_trip() {
        let doc = r#"<TS version="2.1" language="ru_RU" sourcelanguage="en_US">
<context><name>GameList</name>
<message numerus="yes">
    <location filename="game_list.cpp" line="+7"/>
    <source>%n file(s)</source>
    <comment>remaining</comment>
    <extracomment>count of files</extracomment>
    <translation type="unfinished">
        <numerusform>%n файл</numerusform>
        <numerusform></numerusform>
        <numerusform>%n файлов</numerusform>
    </translation>
</message>
<message>
    <source>Start &lt;b&gt;now&lt;/b&gt; "quoted"</source>
    <translation>Начать &lt;b&gt;сейчас&lt;/b&gt;</translation>
</message>
<message>
    <source>Bell<byte value="x7"/></source>
    <translation><byte value="x1b"/>Звонок &amp; <byte value="0x1"/></translation>
</message>
<message>
    <source>Gone</source>
    <translation type="vanished">Нет</translation>
</message>
<message>
    <source>Pending</source>
    <translation type="unfinished"/>
</message>
</context>
</TS>"#;
        let catalogue = Catalogue::load(doc.as_bytes()).unwrap();
        let mut out = Vec::new();
        write(&catalogue, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n"));
        assert!(text.contains("<TS version=\"2.1\" language=\"ru_RU\" sourcelanguage=\"en_US\">"));
        assert!(text.contains("<location filename=\"game_list.cpp\" line=\"7\"/>"));
        assert!(text.contains("<translation type=\"vanished\">"));
        assert!(text.contains("<source>Bell<byte value=\"x7\"/></source>"));
        assert!(text.contains("<translation><byte value=\"x1b\"/>Звонок &amp; <byte value=\"x1\"/></translation>"));
        assert!(!text.contains('\u{7}') && !text.contains('\u{1b}'));

        let before = read(doc);
        let after = read(&text);
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.context(), a.context());
            assert_eq!(b.source(), a.source());
            assert_eq!(b.comment(), a.comment());
            assert_eq!(b.target(), a.target());
            assert_eq!(b.state(), a.state());
            assert_eq!(b.is_obsolete(), a.is_obsolete());
            assert_eq!(b.notes(), a.notes());
            assert_eq!(b.locations(), a.locations());
        }
    }
}
